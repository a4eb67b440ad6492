//! # docqueue Storage
//!
//! Storage backends that hold a single document as an opaque byte string.
//!
//! This crate is the lowest layer of docqueue. Backends never interpret the
//! bytes they hold: parsing and serialization belong to `docqueue_codec`,
//! ordering and transactions belong to `docqueue_core`.
//!
//! ## Design Principles
//!
//! - A backend stores exactly one document and replaces it whole
//! - Every call is self-contained: nothing is held open between calls
//! - Must be `Send + Sync` so the manager's worker thread can own a handle
//!
//! ## Available Backends
//!
//! - [`FileStore`] - A file on disk, locked for the duration of each call
//! - [`InMemoryStore`] - For testing and ephemeral documents
//!
//! ## Example
//!
//! ```rust
//! use docqueue_storage::{DocumentStore, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! assert!(store.initialize(b"{}").unwrap());
//! store.store(b"{\"a\":1}").unwrap();
//! assert_eq!(store.load().unwrap(), b"{\"a\":1}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::DocumentStore;
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
