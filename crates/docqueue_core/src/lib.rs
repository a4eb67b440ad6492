//! # docqueue Core
//!
//! Serialized, queued access to a single on-disk document shared by many
//! concurrent callers.
//!
//! This crate provides:
//! - [`IoManager`], the public handle: `read`, `read_for_update`, `write`,
//!   `get_id`, `start`, `stop`, `is_stopped`
//! - A single worker thread per manager that owns all document access
//! - Read-modify-write transactions without holding a lock across the
//!   caller's modification: a read-for-update and the write with the same
//!   [`OperationId`] run back to back, with nothing in between
//! - An [`EventFeed`] reporting every executed, failed or discarded operation
//!
//! ## Error policy
//!
//! Misuse (missing or duplicate transaction id) is rejected synchronously
//! with [`CoreError::Rejected`] and changes nothing. Storage and codec
//! failures inside the worker never stop it: a failed read returns the error
//! to its caller, a failed write is logged and published on the event feed.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod events;
mod id;
mod manager;
mod operation;
mod queue;
mod results;
mod worker;

pub use config::Config;
pub use error::{CoreError, CoreResult, RejectReason};
pub use events::{EventFeed, EventStatus, IoEvent};
pub use id::OperationId;
pub use manager::IoManager;
pub use operation::{Operation, OperationKind};

pub use docqueue_codec::{BinaryCodec, DocumentCodec, JsonCodec, TextCodec};
pub use docqueue_storage::{DocumentStore, FileStore, InMemoryStore};

/// Crate version, for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
