//! Filesystem primitives for pbx-sync
//!
//! Atomic replace-by-rename writes, advisory locking, and timestamped backups
//! for the generated telephony configuration file.

pub mod backup;
pub mod error;
pub mod io;

pub use backup::{create_backup, list_backups, prune_backups};
pub use error::{Error, Result};
pub use io::{FileLock, read_text, write_atomic, write_text};
