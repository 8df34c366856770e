//! Runtime configuration for pbx-sync
//!
//! Parsed from a TOML file; every field has a default, so an empty file is
//! a valid configuration.

use std::path::{Path, PathBuf};

use pbx_sections::{SectionSyntax, StoreOptions};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traits::DEFAULT_LABEL_PREFIX;

fn default_config_path() -> PathBuf {
    PathBuf::from("/etc/asterisk/pjsip.conf")
}

fn default_declared_path() -> PathBuf {
    PathBuf::from("/var/lib/pbx-sync/extensions.toml")
}

fn default_comment_prefix() -> String {
    pbx_sections::DEFAULT_COMMENT_PREFIX.to_string()
}

fn default_label_prefix() -> String {
    DEFAULT_LABEL_PREFIX.to_string()
}

fn default_max_backups() -> Option<usize> {
    Some(20)
}

fn default_true() -> bool {
    true
}

/// Locations of the managed files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesSection {
    /// Generated configuration file the server reads
    #[serde(default = "default_config_path")]
    pub config: PathBuf,
    /// Declared extension records
    #[serde(default = "default_declared_path")]
    pub declared: PathBuf,
}

impl Default for FilesSection {
    fn default() -> Self {
        Self {
            config: default_config_path(),
            declared: default_declared_path(),
        }
    }
}

/// Section marker settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionsSection {
    #[serde(default = "default_comment_prefix")]
    pub comment_prefix: String,
    /// Extension sections are labelled `<label_prefix> <number>`.
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
    /// Backups kept per file; `None` keeps all of them.
    #[serde(default = "default_max_backups")]
    pub max_backups: Option<usize>,
}

impl Default for SectionsSection {
    fn default() -> Self {
        Self {
            comment_prefix: default_comment_prefix(),
            label_prefix: default_label_prefix(),
            max_backups: default_max_backups(),
        }
    }
}

/// Startup behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default = "default_true")]
    pub auto_sync_on_start: bool,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            auto_sync_on_start: true,
        }
    }
}

/// An infrastructure section written once and never regenerated, such as a
/// transport definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticBlock {
    pub label: String,
    pub body: String,
}

impl StaticBlock {
    pub fn new(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            body: body.into(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub files: FilesSection,
    #[serde(default)]
    pub sections: SectionsSection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub static_blocks: Vec<StaticBlock>,
}

impl SyncConfig {
    /// Parse a configuration from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use pbx_core::SyncConfig;
    ///
    /// let config = SyncConfig::parse(r#"
    /// [files]
    /// config = "/tmp/pjsip.conf"
    ///
    /// [sync]
    /// auto_sync_on_start = false
    /// "#).unwrap();
    ///
    /// assert!(!config.sync.auto_sync_on_start);
    /// assert_eq!(config.sections.comment_prefix, ";");
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// `ConfigNotFound` if the file does not exist, or a TOML error if it
    /// cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match pbx_fs::read_text(path) {
            Ok(content) => content,
            Err(pbx_fs::Error::NotFound { .. }) => {
                return Err(Error::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let config = Self::parse(&content)?;
        tracing::debug!(file = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Options for the section store of the generated file.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            syntax: SectionSyntax::new(self.sections.comment_prefix.clone()),
            max_backups: self.sections.max_backups,
        }
    }
}
