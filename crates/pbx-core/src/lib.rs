//! Reconciliation and synchronization of telephony extensions
//!
//! Extensions live in two places that drift apart: the administrator's
//! declared records and the configuration the telephony server actually
//! runs. This crate compares the two and moves state in either direction.
//!
//! # Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                         SyncPolicy                          |
//! |   push / pull / bulk / auto_sync / lifecycle                |
//! +------------------------------+------------------------------+
//! |     ReconciliationEngine     |      ConfigSectionStore      |
//! |  compare -> SyncInfo/status  |  marker-delimited sections   |
//! +------------------------------+------------------------------+
//! |  DeclaredStore | RuntimeProbe | ConfigRenderer | ReloadTrigger |
//! +-------------------------------------------------------------+
//! ```
//!
//! The traits at the bottom are the seams: [`TomlDeclaredStore`],
//! [`ConfigFileProbe`], [`PjsipRenderer`] and [`NoopReload`] are the
//! default implementations.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pbx_core::{ConfigFileProbe, SyncPolicy, TomlDeclaredStore};
//! use pbx_sections::ConfigSectionStore;
//!
//! let sections = Arc::new(ConfigSectionStore::new("/etc/asterisk/pjsip.conf"));
//! let declared = Arc::new(TomlDeclaredStore::new("/var/lib/pbx-sync/extensions.toml"));
//! let probe = Arc::new(ConfigFileProbe::new(sections.clone()));
//!
//! let policy = SyncPolicy::new(sections, declared, probe);
//! let result = policy.auto_sync()?;
//! println!("{} pushed, {} conflicts", result.pushed, result.conflicts.len());
//! # Ok::<(), pbx_core::Error>(())
//! ```

pub mod config;
pub mod declared;
pub mod error;
pub mod logging;
pub mod model;
pub mod probe;
pub mod reconcile;
pub mod reload;
pub mod render;
pub mod sync;
pub mod traits;

pub use config::{StaticBlock, SyncConfig};
pub use declared::{MemoryDeclaredStore, TomlDeclaredStore};
pub use error::{Error, ErrorKind, ReloadError, Result};
pub use model::{DriftField, ExtensionRecord, NumberKey, RuntimeSnapshot, Secret};
pub use probe::ConfigFileProbe;
pub use reconcile::{ReconciliationEngine, SyncInfo, SyncStatus, SyncSummary, compare, summarize};
pub use reload::{FnReload, NoopReload};
pub use render::PjsipRenderer;
pub use sync::{BulkReport, Conflict, ItemFailure, SyncAction, SyncOutcome, SyncPolicy, SyncResult};
pub use traits::{ConfigRenderer, DeclaredStore, ReloadTrigger, RuntimeProbe};
