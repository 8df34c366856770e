//! Wiring from configuration to a ready `SyncPolicy`

use std::path::Path;
use std::sync::Arc;

use pbx_core::{
    ConfigFileProbe, PjsipRenderer, SyncConfig, SyncPolicy, TomlDeclaredStore,
};
use pbx_sections::ConfigSectionStore;

use crate::error::Result;

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pbx-sync.toml";

pub struct Context {
    pub config: SyncConfig,
    pub policy: SyncPolicy,
}

impl Context {
    /// Load `path`, or `./pbx-sync.toml` if present, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => SyncConfig::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                SyncConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                tracing::debug!("No configuration file, using defaults");
                SyncConfig::default()
            }
        };
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: SyncConfig) -> Self {
        let label_prefix = config.sections.label_prefix.clone();
        let sections = Arc::new(ConfigSectionStore::with_options(
            &config.files.config,
            config.store_options(),
        ));
        let declared = Arc::new(TomlDeclaredStore::new(&config.files.declared));
        let probe =
            Arc::new(ConfigFileProbe::new(sections.clone()).with_label_prefix(&label_prefix));
        let policy = SyncPolicy::new(sections, declared, probe)
            .with_renderer(Arc::new(PjsipRenderer::new(label_prefix)));

        Self { config, policy }
    }
}
