//! File-based document store.

use crate::backend::DocumentStore;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A document stored in a single file.
///
/// Each call opens the file, takes an exclusive advisory lock, performs the
/// operation and closes the file again. Dropping the handle releases the
/// lock, so the lock is released on every exit path, including errors.
///
/// # Durability
///
/// With `sync_on_store` enabled (the default), `store()` calls
/// `File::sync_all()` before returning.
///
/// # Example
///
/// ```no_run
/// use docqueue_storage::{DocumentStore, FileStore};
///
/// let store = FileStore::new("configs.json");
/// store.initialize(b"{}").unwrap();
/// let bytes = store.load().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    sync_on_store: bool,
    create_dirs: bool,
}

impl FileStore {
    /// Creates a store for the file at `path`.
    ///
    /// Nothing is touched on disk until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_on_store: true,
            create_dirs: true,
        }
    }

    /// Sets whether `store()` syncs the file to disk.
    #[must_use]
    pub const fn sync_on_store(mut self, value: bool) -> Self {
        self.sync_on_store = value;
        self
    }

    /// Sets whether `initialize()` creates missing parent directories.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_locked(&self, options: &OpenOptions) -> StorageResult<File> {
        let file = options
            .open(&self.path)
            .map_err(|e| StorageError::from_io(e, &self.path))?;
        FileExt::lock_exclusive(&file)?;
        Ok(file)
    }
}

impl DocumentStore for FileStore {
    fn load(&self) -> StorageResult<Vec<u8>> {
        let mut file = self.open_locked(OpenOptions::new().read(true))?;

        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        debug!(path = %self.path.display(), bytes = buffer.len(), "loaded document");
        Ok(buffer)
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        // Truncate only after the lock is held.
        let mut file = self.open_locked(
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false),
        )?;

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(data)?;
        file.flush()?;
        if self.sync_on_store {
            file.sync_all()?;
        }

        debug!(path = %self.path.display(), bytes = data.len(), "stored document");
        Ok(())
    }

    fn exists(&self) -> StorageResult<bool> {
        Ok(self.path.is_file())
    }

    fn initialize(&self, default: &[u8]) -> StorageResult<bool> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if !self.create_dirs {
                    return Err(StorageError::MissingParent {
                        path: self.path.clone(),
                    });
                }
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        FileExt::lock_exclusive(&file)?;
        file.write_all(default)?;
        file.sync_all()?;

        debug!(path = %self.path.display(), "created document");
        Ok(true)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
