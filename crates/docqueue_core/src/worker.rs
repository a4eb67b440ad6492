//! The worker loop: the only code that touches the document.

use crate::config::Config;
use crate::error::CoreResult;
use crate::events::{EventFeed, EventStatus};
use crate::id::OperationId;
use crate::operation::{Operation, OperationKind};
use crate::queue::{OperationQueue, Pairing};
use crate::results::ResultStore;
use docqueue_codec::DocumentCodec;
use docqueue_storage::DocumentStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// State shared between the manager handle and its worker thread.
pub(crate) struct Shared<S, C: DocumentCodec> {
    pub store: S,
    pub codec: C,
    pub config: Config,
    pub queue: OperationQueue<C::Document>,
    pub results: ResultStore<C::Document>,
    pub events: EventFeed,
    pub running: AtomicBool,
}

/// Clears `running` when the worker exits, even by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Body of the worker thread.
pub(crate) fn run<S, C>(shared: Arc<Shared<S, C>>)
where
    S: DocumentStore,
    C: DocumentCodec,
{
    let _running = RunningGuard(&shared.running);
    let worker = Worker { shared: &shared };

    info!(store = %shared.store.describe(), codec = shared.codec.name(), "worker started");
    worker.process();
    worker.abandon_pending();
    info!(store = %shared.store.describe(), "worker stopped");
}

struct Worker<'a, S, C: DocumentCodec> {
    shared: &'a Shared<S, C>,
}

impl<S, C> Worker<'_, S, C>
where
    S: DocumentStore,
    C: DocumentCodec,
{
    fn process(&self) {
        let idle = self.shared.config.idle_interval;

        while let Some(op) = self.shared.queue.next(idle) {
            match op {
                Operation::Read { id, wait_for_write } => {
                    let outcome = self.read(id, wait_for_write);
                    let opened = outcome.is_ok();
                    self.shared.results.insert(id, outcome);

                    if wait_for_write {
                        if opened {
                            self.hold_for_write(id);
                        } else {
                            self.close_unopened(id);
                        }
                    }
                }
                Operation::Write { id, payload } => self.write(id, &payload, false),
            }
        }
    }

    /// Keeps the document to this transaction until its write arrives.
    ///
    /// Nothing else is popped from the queue meanwhile, which is what makes
    /// the read-modify-write atomic.
    fn hold_for_write(&self, id: OperationId) {
        match self
            .shared
            .queue
            .take_paired(id, self.shared.config.idle_interval)
        {
            Pairing::Matched(payload) => {
                self.write(Some(id), &payload, true);
                self.shared.queue.release(id);
            }
            Pairing::Cancelled => {
                warn!(%id, "transaction cancelled before its write arrived");
            }
            Pairing::Stopped => {
                // Left reserved: shutdown abandons it along with any write
                // parked meanwhile.
                warn!(%id, "stopped while waiting for transaction write");
            }
        }
    }

    /// Ends a transaction whose read failed. A write already parked for it
    /// is discarded and reported as abandoned.
    fn close_unopened(&self, id: OperationId) {
        if self.shared.queue.release(id).is_some() {
            warn!(%id, "discarding write paired with a failed read");
            self.shared.events.emit(
                Some(id),
                OperationKind::Write { promoted: false },
                EventStatus::Abandoned,
            );
        }
    }

    fn read(&self, id: OperationId, transactional: bool) -> CoreResult<C::Document> {
        let kind = OperationKind::Read { transactional };
        let outcome: CoreResult<C::Document> = self
            .shared
            .store
            .load()
            .map_err(Into::into)
            .and_then(|bytes| self.shared.codec.decode(&bytes).map_err(Into::into));

        match &outcome {
            Ok(_) => {
                debug!(%id, transactional, "read completed");
                self.shared
                    .events
                    .emit(Some(id), kind, EventStatus::Completed);
            }
            Err(e) => {
                error!(%id, transactional, error = %e, "read failed");
                self.shared
                    .events
                    .emit(Some(id), kind, EventStatus::Failed(e.to_string()));
            }
        }
        outcome
    }

    fn write(&self, id: Option<OperationId>, payload: &C::Document, promoted: bool) {
        let kind = OperationKind::Write { promoted };
        let outcome: CoreResult<()> = self
            .shared
            .codec
            .encode(payload)
            .map_err(Into::into)
            .and_then(|bytes| self.shared.store.store(&bytes).map_err(Into::into));

        match outcome {
            Ok(()) => {
                debug!(id = ?id, promoted, "write completed");
                self.shared.events.emit(id, kind, EventStatus::Completed);
            }
            Err(e) => {
                error!(id = ?id, promoted, error = %e, "write failed");
                self.shared
                    .events
                    .emit(id, kind, EventStatus::Failed(e.to_string()));
            }
        }
    }

    /// Discards what is still queued and wakes every abandoned reader.
    fn abandon_pending(&self) {
        let abandoned = self.shared.queue.abandon();
        if abandoned.is_empty() {
            return;
        }

        warn!(count = abandoned.len(), "discarding queued operations on stop");
        for op in abandoned {
            if let Operation::Read { id, .. } = op {
                self.shared.results.abandon(id);
            }
            self.shared
                .events
                .emit(op.id(), op.kind(), EventStatus::Abandoned);
        }
    }
}
