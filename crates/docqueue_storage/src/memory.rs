//! In-memory document store for testing.

use crate::backend::DocumentStore;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// An in-memory document store.
///
/// Suitable for:
/// - Unit tests
/// - Integration tests
/// - Documents that don't need persistence
///
/// A fresh store holds no document; `load` fails with
/// [`StorageError::NotFound`] until `initialize` or `store` is called.
///
/// # Example
///
/// ```rust
/// use docqueue_storage::{DocumentStore, InMemoryStore};
///
/// let store = InMemoryStore::with_data(b"hello".to_vec());
/// assert_eq!(store.load().unwrap(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<Option<Vec<u8>>>,
}

impl InMemoryStore {
    /// Creates a new store without a document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `data`.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(Some(data)),
        }
    }

    /// Returns a copy of the current document, if any.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }

    /// Replaces the document directly, bypassing any manager.
    ///
    /// Useful for simulating external modification in tests.
    pub fn set_data(&self, data: Vec<u8>) {
        *self.data.write() = Some(data);
    }

    /// Removes the document.
    pub fn clear(&self) {
        *self.data.write() = None;
    }
}

impl DocumentStore for InMemoryStore {
    fn load(&self) -> StorageResult<Vec<u8>> {
        self.data
            .read()
            .clone()
            .ok_or_else(|| StorageError::not_found("<memory>"))
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        *self.data.write() = Some(data.to_vec());
        Ok(())
    }

    fn exists(&self) -> StorageResult<bool> {
        Ok(self.data.read().is_some())
    }

    fn initialize(&self, default: &[u8]) -> StorageResult<bool> {
        let mut data = self.data.write();
        if data.is_some() {
            return Ok(false);
        }
        *data = Some(default.to_vec());
        Ok(true)
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
