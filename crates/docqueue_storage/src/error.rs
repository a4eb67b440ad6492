//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document does not exist yet.
    #[error("document not found: {}", path.display())]
    NotFound {
        /// Location of the missing document.
        path: PathBuf,
    },

    /// The parent directory of the document is missing.
    #[error("parent directory missing for {}", path.display())]
    MissingParent {
        /// Location of the document.
        path: PathBuf,
    },
}

impl StorageError {
    /// Creates a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Maps an I/O error for `path`, turning `NotFound` into the typed variant.
    pub(crate) fn from_io(err: io::Error, path: &std::path::Path) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::not_found(path)
        } else {
            Self::Io(err)
        }
    }
}
