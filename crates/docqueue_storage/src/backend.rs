//! Document store trait definition.

use crate::error::StorageResult;

/// A whole-document byte store.
///
/// A store holds **one** document. It can be loaded in full or replaced in
/// full; there are no partial reads or appends. The store does not know
/// what the bytes mean.
///
/// # Invariants
///
/// - `load` returns exactly the bytes passed to the last successful `store`
///   (or to `initialize`, if nothing was stored since)
/// - `store` replaces the previous content completely
/// - No handle or lock is retained between calls
///
/// # Implementors
///
/// - [`super::FileStore`] - For persistent storage
/// - [`super::InMemoryStore`] - For testing
pub trait DocumentStore: Send + Sync {
    /// Reads the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if the document was never
    /// created, or an I/O error.
    fn load(&self) -> StorageResult<Vec<u8>>;

    /// Replaces the whole document with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn store(&self, data: &[u8]) -> StorageResult<()>;

    /// Returns whether the document exists.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    fn exists(&self) -> StorageResult<bool>;

    /// Creates the document with `default` content if it does not exist.
    ///
    /// Returns `true` if the document was created, `false` if it was
    /// already present (its content is left untouched).
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be created.
    fn initialize(&self, default: &[u8]) -> StorageResult<bool>;

    /// Human-readable location of the document, for logs.
    fn describe(&self) -> String;
}

impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    fn load(&self) -> StorageResult<Vec<u8>> {
        (**self).load()
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        (**self).store(data)
    }

    fn exists(&self) -> StorageResult<bool> {
        (**self).exists()
    }

    fn initialize(&self, default: &[u8]) -> StorageResult<bool> {
        (**self).initialize(default)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
