//! A document store that records every access.
//!
//! Used to check what the worker actually did to the document: the order of
//! loads and stores, and that no two accesses ever overlapped.

use docqueue_storage::{DocumentStore, InMemoryStore, StorageError, StorageResult};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// One call made on a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// A load that returned these bytes.
    Load(Vec<u8>),
    /// A store of these bytes.
    Store(Vec<u8>),
}

/// In-memory store that logs accesses, detects overlap and can inject
/// failures.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: InMemoryStore,
    log: Mutex<Vec<Access>>,
    in_use: AtomicBool,
    overlaps: AtomicUsize,
    fail_stores: AtomicBool,
    fail_loads: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingStore {
    /// Creates an empty recording store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds every access for `delay`, widening any race window.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    /// Makes subsequent stores fail (or succeed again).
    pub fn fail_stores(&self, fail: bool) {
        self.fail_stores.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent loads fail (or succeed again).
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of the access log.
    #[must_use]
    pub fn log(&self) -> Vec<Access> {
        self.log.lock().clone()
    }

    /// Payloads of all successful stores, in order.
    #[must_use]
    pub fn stores(&self) -> Vec<Vec<u8>> {
        self.log
            .lock()
            .iter()
            .filter_map(|access| match access {
                Access::Store(bytes) => Some(bytes.clone()),
                Access::Load(_) => None,
            })
            .collect()
    }

    /// Number of times two accesses were in progress at once.
    #[must_use]
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    /// Current document bytes.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.inner.data()
    }

    fn enter(&self) -> AccessGuard<'_> {
        if self.in_use.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(delay) = *self.delay.lock() {
            thread::sleep(delay);
        }
        AccessGuard(&self.in_use)
    }
}

struct AccessGuard<'a>(&'a AtomicBool);

impl Drop for AccessGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn injected() -> StorageError {
    StorageError::Io(io::Error::new(io::ErrorKind::Other, "injected failure"))
}

impl DocumentStore for RecordingStore {
    fn load(&self) -> StorageResult<Vec<u8>> {
        let _guard = self.enter();
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let bytes = self.inner.load()?;
        self.log.lock().push(Access::Load(bytes.clone()));
        Ok(bytes)
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        let _guard = self.enter();
        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.store(data)?;
        self.log.lock().push(Access::Store(data.to_vec()));
        Ok(())
    }

    fn exists(&self) -> StorageResult<bool> {
        self.inner.exists()
    }

    fn initialize(&self, default: &[u8]) -> StorageResult<bool> {
        self.inner.initialize(default)
    }

    fn describe(&self) -> String {
        "<recording>".to_string()
    }
}
