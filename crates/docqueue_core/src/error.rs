//! Error types for docqueue core.

use crate::id::OperationId;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Why a request was refused before being queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A read-for-update was issued without an id (the nil id).
    MissingId,
    /// An operation with the same id is already queued.
    AlreadyQueued,
    /// The id belongs to a transaction that is still open.
    AlreadyReserved,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => f.write_str("read-for-update requires an id"),
            Self::AlreadyQueued => f.write_str("id already queued"),
            Self::AlreadyReserved => f.write_str("id already reserved by an open transaction"),
        }
    }
}

/// Errors that can occur in docqueue core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] docqueue_storage::StorageError),

    /// Document codec error.
    #[error("codec error: {0}")]
    Codec(#[from] docqueue_codec::CodecError),

    /// I/O error outside the storage backend (e.g. spawning the worker).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The request was refused; nothing was queued or reserved.
    #[error("operation {id} rejected: {reason}")]
    Rejected {
        /// The offending id.
        id: OperationId,
        /// Why it was refused.
        reason: RejectReason,
    },

    /// The operation was discarded because the worker stopped first.
    #[error("operation {id} abandoned: worker stopped before it ran")]
    Abandoned {
        /// The discarded operation.
        id: OperationId,
    },

    /// No result arrived within the configured read timeout.
    #[error("operation {id} timed out waiting for its result")]
    Timeout {
        /// The operation that did not complete in time.
        id: OperationId,
    },
}

impl CoreError {
    /// Creates a rejection error.
    pub fn rejected(id: OperationId, reason: RejectReason) -> Self {
        Self::Rejected { id, reason }
    }

    /// Returns true for misuse rejections, which are always safe to retry.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
