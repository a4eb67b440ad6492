//! Public handle for queued document access.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::events::{EventFeed, IoEvent};
use crate::id::OperationId;
use crate::queue::OperationQueue;
use crate::results::ResultStore;
use crate::worker::{self, Shared};
use docqueue_codec::{DocumentCodec, JsonCodec};
use docqueue_storage::{DocumentStore, FileStore};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Serialized, queued access to one document shared by many callers.
///
/// All reads and writes go through a FIFO queue drained by a single worker
/// thread, so the document is only ever touched by one operation at a time.
/// [`read_for_update`](Self::read_for_update) followed by a
/// [`write`](Self::write) with the same id forms a read-modify-write
/// transaction: the worker runs nothing else between the two.
///
/// The handle is `Sync`; share it between threads with an `Arc`.
///
/// # Example
///
/// ```rust,no_run
/// use docqueue_core::IoManager;
/// use serde_json::json;
///
/// let io = IoManager::open("configs.json")?;
///
/// let id = io.get_id();
/// let mut doc = io.read_for_update(id)?;
/// doc["LoginDetails"] = json!({ "Token": null, "BotUser": false });
/// io.write(doc, Some(id));
///
/// assert_eq!(io.read(None)?["LoginDetails"]["BotUser"], json!(false));
/// # Ok::<(), docqueue_core::CoreError>(())
/// ```
pub struct IoManager<C: DocumentCodec = JsonCodec, S = FileStore> {
    shared: Arc<Shared<S, C>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl IoManager {
    /// Opens a JSON document at `path` with the default configuration.
    ///
    /// The file is created as `{}` if it does not exist, and the worker is
    /// started.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the worker thread
    /// cannot be spawned.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a JSON document at `path` with a custom configuration.
    ///
    /// # Errors
    ///
    /// See [`IoManager::open`].
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        Self::open_with_codec(path, JsonCodec::new(), config)
    }
}

impl<C: DocumentCodec> IoManager<C, FileStore> {
    /// Opens a document at `path` interpreted by `codec`.
    ///
    /// # Errors
    ///
    /// See [`IoManager::open`].
    pub fn open_with_codec(path: impl AsRef<Path>, codec: C, config: Config) -> CoreResult<Self> {
        let store = FileStore::new(path.as_ref())
            .sync_on_store(config.sync_on_write)
            .create_dirs(config.create_dirs);
        Self::with_store(store, codec, config)
    }
}

impl<C, S> IoManager<C, S>
where
    C: DocumentCodec,
    S: DocumentStore + 'static,
{
    /// Creates a manager over any document store.
    ///
    /// The store is initialized with the codec's empty document if it holds
    /// none yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be initialized or the worker
    /// thread cannot be spawned.
    pub fn with_store(store: S, codec: C, config: Config) -> CoreResult<Self> {
        if store.initialize(&codec.empty())? {
            info!(store = %store.describe(), codec = codec.name(), "created empty document");
        }

        let events = EventFeed::with_max_history(config.event_history);
        let manager = Self {
            shared: Arc::new(Shared {
                store,
                codec,
                config,
                queue: OperationQueue::new(),
                results: ResultStore::new(),
                events,
                running: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
        };

        if manager.shared.config.start_on_open {
            manager.start()?;
        }
        Ok(manager)
    }

    /// Returns a fresh id for a transaction. Has no side effects.
    #[must_use]
    pub fn get_id(&self) -> OperationId {
        OperationId::new()
    }

    /// Reads the whole document.
    ///
    /// Blocks until the worker reaches this read. `id` is optional; one is
    /// generated when omitted (or nil).
    ///
    /// # Errors
    ///
    /// - [`CoreError::Rejected`] if `id` is already queued or reserved
    /// - [`CoreError::Storage`] / [`CoreError::Codec`] if the document could
    ///   not be loaded or parsed
    /// - [`CoreError::Abandoned`] if the worker stopped before this read ran
    /// - [`CoreError::Timeout`] if `read_timeout` is configured and expired
    pub fn read(&self, id: Option<OperationId>) -> CoreResult<C::Document> {
        let id = id
            .filter(|id| !id.is_nil())
            .unwrap_or_else(OperationId::new);
        self.enqueue_read(id, false)?;
        self.shared.results.claim(id, self.shared.config.read_timeout)
    }

    /// Reads the document and opens a transaction on `id`.
    ///
    /// The returned document is the state *before* the transaction's write.
    /// Once this read has run, the worker executes nothing else until
    /// [`write`](Self::write) is called with the same `id` (or the
    /// transaction is [`cancel`](Self::cancel)led, or the manager stops).
    ///
    /// # Errors
    ///
    /// - [`CoreError::Rejected`] if `id` is nil, already queued, or already
    ///   reserved; nothing is changed in that case
    /// - [`CoreError::Abandoned`] also if the transaction was
    ///   [`cancel`](Self::cancel)led before the read ran
    /// - otherwise as for [`read`](Self::read). A failed or timed-out read
    ///   closes the transaction.
    pub fn read_for_update(&self, id: OperationId) -> CoreResult<C::Document> {
        self.enqueue_read(id, true)?;
        let outcome = self.shared.results.claim(id, self.shared.config.read_timeout);
        if let Err(CoreError::Timeout { .. }) = outcome {
            self.cancel(id);
        }
        outcome
    }

    /// Replaces the document with `document`.
    ///
    /// Never waits for the worker. If `id` names an open transaction, this
    /// write closes it and runs right after the transaction's read;
    /// otherwise it runs in FIFO order. Failures are reported through
    /// [`subscribe`](Self::subscribe) and the log.
    pub fn write(&self, document: C::Document, id: Option<OperationId>) {
        let paired = self.shared.queue.push_write(id, document);
        debug!(id = ?id, paired, "write queued");
    }

    /// Runs a read-modify-write transaction with `f`.
    ///
    /// The document `f` receives is written back when it returns. If `f`
    /// panics, the transaction is cancelled and the document left as it was.
    ///
    /// # Errors
    ///
    /// Returns any error from [`read_for_update`](Self::read_for_update).
    pub fn update<R>(&self, f: impl FnOnce(&mut C::Document) -> R) -> CoreResult<R> {
        let id = self.get_id();
        let mut document = self.read_for_update(id)?;

        let guard = CancelOnDrop {
            manager: self,
            id,
            armed: true,
        };
        let output = f(&mut document);
        guard.disarm();

        self.write(document, Some(id));
        Ok(output)
    }

    /// Closes the transaction `id` without writing.
    ///
    /// A read-for-update that has not run yet is removed from the queue and
    /// its caller, if still waiting, receives [`CoreError::Abandoned`]. A
    /// write already issued for `id` is not discarded: it runs in FIFO order
    /// as a plain write.
    pub fn cancel(&self, id: OperationId) {
        if self.shared.queue.cancel(id) {
            // Absorbed by the timeout marker if the caller gave up already.
            self.shared.results.abandon(id);
        }
        debug!(%id, "transaction cancelled");
    }

    /// Starts the worker if it is not running.
    ///
    /// If a stop was requested and the old worker has not exited yet, waits
    /// for it to exit and then launches a new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn start(&self) -> CoreResult<()> {
        let mut handle = self.worker.lock();

        if self.shared.running.load(Ordering::Acquire) && !self.shared.queue.stop_requested() {
            return Ok(());
        }
        if let Some(previous) = handle.take() {
            if previous.join().is_err() {
                warn!("previous worker panicked");
            }
        }

        self.shared.queue.reset_stop();
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name("docqueue-worker".to_string())
            .spawn(move || worker::run(shared))
        {
            Ok(spawned) => {
                *handle = Some(spawned);
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(e.into())
            }
        }
    }

    /// Asks the worker to stop at its next check.
    ///
    /// Queued operations are not executed: the worker discards them on exit
    /// and their readers receive [`CoreError::Abandoned`]. Operations queued
    /// after the worker has exited stay queued until the next
    /// [`start`](Self::start).
    pub fn stop(&self) {
        self.shared.queue.request_stop();
    }

    /// Stops the worker and waits for its thread to exit.
    pub fn stop_and_wait(&self) {
        self.stop();
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                warn!("worker panicked");
            }
        }
    }

    /// Returns true once the worker has fully exited (or never started).
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        !self.shared.running.load(Ordering::Acquire)
    }

    /// Subscribes to worker events.
    pub fn subscribe(&self) -> Receiver<IoEvent> {
        self.shared.events.subscribe()
    }

    /// Returns the event feed, for polling recent history.
    #[must_use]
    pub fn events(&self) -> &EventFeed {
        &self.shared.events
    }

    /// Number of operations waiting in FIFO order.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// Returns true if `id` names an open transaction.
    #[must_use]
    pub fn is_reserved(&self, id: OperationId) -> bool {
        self.shared.queue.is_reserved(id)
    }

    /// Returns the manager's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.shared.store
    }

    /// Returns the codec.
    #[must_use]
    pub fn codec(&self) -> &C {
        &self.shared.codec
    }

    fn enqueue_read(&self, id: OperationId, wait_for_write: bool) -> CoreResult<()> {
        match self.shared.queue.push_read(id, wait_for_write) {
            Ok(()) => {
                debug!(%id, wait_for_write, "read queued");
                Ok(())
            }
            Err(reason) => {
                warn!(%id, wait_for_write, %reason, "read rejected");
                Err(CoreError::rejected(id, reason))
            }
        }
    }
}

impl<C: DocumentCodec, S> Drop for IoManager<C, S> {
    fn drop(&mut self) {
        self.shared.queue.request_stop();
        if let Some(handle) = self.worker.get_mut().take() {
            if handle.join().is_err() {
                warn!("worker panicked");
            }
        }
    }
}

/// Cancels a transaction unless disarmed, so a panicking update does not
/// leave the worker waiting for a write that never comes.
struct CancelOnDrop<'a, C: DocumentCodec, S: DocumentStore + 'static> {
    manager: &'a IoManager<C, S>,
    id: OperationId,
    armed: bool,
}

impl<C: DocumentCodec, S: DocumentStore + 'static> CancelOnDrop<'_, C, S> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<C: DocumentCodec, S: DocumentStore + 'static> Drop for CancelOnDrop<'_, C, S> {
    fn drop(&mut self) {
        if self.armed {
            self.manager.cancel(self.id);
        }
    }
}
