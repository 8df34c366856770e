//! Error types for pbx-core

use std::path::PathBuf;

/// Result type for pbx-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`crate::ReloadTrigger`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Reload failed: {message}")]
pub struct ReloadError {
    pub message: String,
}

impl ReloadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Broad category of an [`Error`], used to decide how a caller reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A record, runtime entry, section or file is absent. Not retried.
    NotFound,
    /// Reading, writing, backing up or renaming a file failed. Safe to retry.
    IoFailure,
    /// A write succeeded but the server could not be told to reload.
    ReloadFailure,
    /// The input itself is unusable (malformed record, bad label, bad config).
    Invalid,
    /// The declared store or runtime probe failed.
    Collaborator,
}

/// Errors that can occur in pbx-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Single-item push for a number the declared store does not know
    #[error("Extension {number} not found in declared store")]
    NotInDeclaredStore { number: String },

    /// Single-item pull for a number the runtime does not report
    #[error("Extension {number} not found in runtime")]
    NotInRuntime { number: String },

    /// Record failed validation
    #[error("Invalid extension {number}: {reason}")]
    InvalidRecord { number: String, reason: String },

    /// Declared store could not be read or written
    #[error("Declared store error: {message}")]
    DeclaredStore { message: String },

    /// Runtime probe could not produce a snapshot
    #[error("Runtime probe error: {message}")]
    Probe { message: String },

    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error(transparent)]
    Reload(#[from] ReloadError),

    // Transparent wrappers for underlying crate errors
    /// Section store error from pbx-sections
    #[error(transparent)]
    Sections(#[from] pbx_sections::Error),

    /// Filesystem error from pbx-fs
    #[error(transparent)]
    Fs(#[from] pbx_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn invalid_record(number: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            number: number.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotInDeclaredStore { .. }
            | Error::NotInRuntime { .. }
            | Error::ConfigNotFound { .. } => ErrorKind::NotFound,
            Error::Sections(pbx_sections::Error::SectionNotFound { .. }) => ErrorKind::NotFound,
            Error::Sections(pbx_sections::Error::Fs(_)) | Error::Fs(_) | Error::Io(_) => {
                ErrorKind::IoFailure
            }
            Error::Sections(_) | Error::InvalidRecord { .. } => ErrorKind::Invalid,
            Error::TomlDe(_) | Error::TomlSer(_) => ErrorKind::Invalid,
            Error::Reload(_) => ErrorKind::ReloadFailure,
            Error::DeclaredStore { .. } | Error::Probe { .. } => ErrorKind::Collaborator,
        }
    }

    /// Whether repeating the same call may succeed without any other change.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::IoFailure | ErrorKind::ReloadFailure | ErrorKind::Collaborator
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_kinds() {
        let err = Error::NotInDeclaredStore {
            number: "101".into(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("101"));
    }

    #[test]
    fn test_io_failure_is_retryable() {
        let err: Error = pbx_fs::Error::LockFailed {
            path: PathBuf::from("/etc/asterisk/pjsip.conf"),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_missing_section_is_not_found() {
        let err: Error = pbx_sections::Error::SectionNotFound {
            label: "Extension 101".into(),
            path: PathBuf::from("pjsip.conf"),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_reload_kind() {
        let err: Error = ReloadError::new("asterisk not running").into();
        assert_eq!(err.kind(), ErrorKind::ReloadFailure);
        assert_eq!(err.to_string(), "Reload failed: asterisk not running");
    }
}
