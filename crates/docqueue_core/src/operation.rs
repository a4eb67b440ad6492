//! Queued operations.

use crate::id::OperationId;

/// A pending request on the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation<D> {
    /// Load the document and deliver it to the caller waiting on `id`.
    Read {
        /// Result key and, when transactional, the transaction id.
        id: OperationId,
        /// Hold the document exclusively until the write with `id` runs.
        wait_for_write: bool,
    },
    /// Replace the document with `payload`.
    Write {
        /// Transaction id, if this write closes one.
        id: Option<OperationId>,
        /// New document content.
        payload: D,
    },
}

impl<D> Operation<D> {
    /// The operation's id, if any.
    pub fn id(&self) -> Option<OperationId> {
        match self {
            Self::Read { id, .. } => Some(*id),
            Self::Write { id, .. } => *id,
        }
    }

    /// Short kind label for logs and events.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Read { wait_for_write, .. } => OperationKind::Read {
                transactional: *wait_for_write,
            },
            Self::Write { .. } => OperationKind::Write { promoted: false },
        }
    }
}

/// Kind of an executed operation, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// A read; `transactional` for read-for-update.
    Read {
        /// Whether the read opened a transaction.
        transactional: bool,
    },
    /// A write; `promoted` when it closed a transaction ahead of FIFO order.
    Write {
        /// Whether the write was taken out of FIFO order.
        promoted: bool,
    },
}
