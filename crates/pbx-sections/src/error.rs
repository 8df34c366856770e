//! Error types for pbx-sections

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] pbx_fs::Error),

    #[error("Section not found: {label} in {path}")]
    SectionNotFound { label: String, path: PathBuf },

    #[error("Invalid section label {label:?}")]
    InvalidLabel { label: String },

    #[error("Invalid body for section {label}: {reason}")]
    InvalidBody { label: String, reason: String },
}

impl Error {
    pub(crate) fn not_found_in_content(label: &str) -> Self {
        Self::SectionNotFound {
            label: label.to_string(),
            path: PathBuf::from("<content>"),
        }
    }

    /// Re-point a `SectionNotFound` raised on in-memory content at a file.
    pub(crate) fn at_path(self, path: &std::path::Path) -> Self {
        match self {
            Self::SectionNotFound { label, .. } => Self::SectionNotFound {
                label,
                path: path.to_path_buf(),
            },
            other => other,
        }
    }
}
