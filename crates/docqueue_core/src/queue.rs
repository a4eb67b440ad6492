//! Operation queue and reservation set.
//!
//! Callers push operations; the worker pops them in FIFO order. A
//! read-for-update reserves its id at push time. A write carrying a reserved
//! id does not enter the FIFO queue at all: it is parked in the reservation
//! slot, where the worker picks it up right after the transactional read.
//! That is what "promotion" means here, and it needs no rescan of the queue.

use crate::error::RejectReason;
use crate::id::OperationId;
use crate::operation::Operation;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// State of an open transaction.
#[derive(Debug)]
enum Slot<D> {
    /// Reserved, paired write not seen yet.
    Open,
    /// Paired write arrived and waits for the worker.
    Matched(D),
    /// The worker took the paired write and is executing it.
    Closing,
    /// The caller gave up; the worker must not wait for a write.
    Cancelled,
}

#[derive(Debug)]
struct QueueState<D> {
    ops: VecDeque<Operation<D>>,
    reserved: HashMap<OperationId, Slot<D>>,
    stop: bool,
}

/// What the worker found while holding a transaction open.
#[derive(Debug, PartialEq)]
pub(crate) enum Pairing<D> {
    /// The paired write, to be executed before anything else.
    Matched(D),
    /// The caller cancelled the transaction.
    Cancelled,
    /// Stop was requested while waiting.
    Stopped,
}

/// FIFO of pending operations shared by callers and the worker.
#[derive(Debug)]
pub(crate) struct OperationQueue<D> {
    state: Mutex<QueueState<D>>,
    work_ready: Condvar,
}

impl<D> OperationQueue<D> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                ops: VecDeque::new(),
                reserved: HashMap::new(),
                stop: false,
            }),
            work_ready: Condvar::new(),
        }
    }

    /// Queues a read.
    ///
    /// Refuses, without touching any state, an id that is nil (for
    /// read-for-update), already queued, or reserved.
    pub fn push_read(&self, id: OperationId, wait_for_write: bool) -> Result<(), RejectReason> {
        if id.is_nil() {
            return Err(RejectReason::MissingId);
        }

        let mut state = self.state.lock();
        if state.reserved.contains_key(&id) {
            return Err(RejectReason::AlreadyReserved);
        }
        if state.ops.iter().any(|op| op.id() == Some(id)) {
            return Err(RejectReason::AlreadyQueued);
        }

        if wait_for_write {
            state.reserved.insert(id, Slot::Open);
        }
        state.ops.push_back(Operation::Read { id, wait_for_write });
        drop(state);

        self.work_ready.notify_all();
        Ok(())
    }

    /// Queues a write. Returns `true` if it was paired with an open
    /// transaction instead of entering the FIFO queue.
    pub fn push_write(&self, id: Option<OperationId>, payload: D) -> bool {
        let id = id.filter(|id| !id.is_nil());

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let paired = match id.and_then(|id| state.reserved.get_mut(&id)) {
            Some(slot) if matches!(slot, Slot::Open) => {
                *slot = Slot::Matched(payload);
                true
            }
            _ => {
                state.ops.push_back(Operation::Write { id, payload });
                false
            }
        };
        drop(guard);

        self.work_ready.notify_all();
        paired
    }

    /// Pops the next operation, sleeping at most `idle` between checks.
    ///
    /// Returns `None` once stop has been requested.
    pub fn next(&self, idle: Duration) -> Option<Operation<D>> {
        let mut state = self.state.lock();
        loop {
            if state.stop {
                return None;
            }
            if let Some(op) = state.ops.pop_front() {
                return Some(op);
            }
            self.work_ready.wait_for(&mut state, idle);
        }
    }

    /// Waits until the write paired with `id` arrives, the transaction is
    /// cancelled, or stop is requested.
    ///
    /// A matched write leaves the reservation in place until [`Self::release`];
    /// the other outcomes release it here.
    pub fn take_paired(&self, id: OperationId, idle: Duration) -> Pairing<D> {
        let mut state = self.state.lock();
        loop {
            match state.reserved.remove(&id) {
                Some(Slot::Matched(payload)) => {
                    state.reserved.insert(id, Slot::Closing);
                    return Pairing::Matched(payload);
                }
                Some(Slot::Cancelled) | None => return Pairing::Cancelled,
                Some(slot) => {
                    if state.stop {
                        return Pairing::Stopped;
                    }
                    state.reserved.insert(id, slot);
                }
            }
            self.work_ready.wait_for(&mut state, idle);
        }
    }

    /// Releases the reservation for `id`, handing back a write that was
    /// parked for it and will now never run as part of the transaction.
    pub fn release(&self, id: OperationId) -> Option<D> {
        match self.state.lock().reserved.remove(&id) {
            Some(Slot::Matched(payload)) => Some(payload),
            _ => None,
        }
    }

    /// Gives up on the transaction `id` from the caller's side.
    ///
    /// A still-queued read is removed and its reservation released. If the
    /// read already ran, the worker is told not to wait for a write. A
    /// write that is already paired is left to run: with its read gone it
    /// moves to the back of the FIFO queue as a plain write.
    ///
    /// Returns `true` if a queued read was removed.
    pub fn cancel(&self, id: OperationId) -> bool {
        let mut state = self.state.lock();
        let before = state.ops.len();
        state
            .ops
            .retain(|op| !matches!(op, Operation::Read { id: read, .. } if *read == id));
        let removed = state.ops.len() != before;

        if removed {
            if let Some(Slot::Matched(payload)) = state.reserved.remove(&id) {
                state.ops.push_back(Operation::Write {
                    id: Some(id),
                    payload,
                });
            }
        } else if let Some(slot) = state.reserved.get_mut(&id) {
            if matches!(slot, Slot::Open) {
                *slot = Slot::Cancelled;
            }
        }
        drop(state);

        self.work_ready.notify_all();
        removed
    }

    /// Removes every queued operation and every reservation.
    ///
    /// Returns the queued operations in queue order, followed by the writes
    /// that were parked for a transaction.
    pub fn abandon(&self) -> Vec<Operation<D>> {
        let mut state = self.state.lock();
        let mut abandoned: Vec<_> = state.ops.drain(..).collect();
        for (id, slot) in state.reserved.drain() {
            if let Slot::Matched(payload) = slot {
                abandoned.push(Operation::Write {
                    id: Some(id),
                    payload,
                });
            }
        }
        abandoned
    }

    pub fn request_stop(&self) {
        // Set under the lock so a worker between its check and its wait
        // cannot miss the notification.
        self.state.lock().stop = true;
        self.work_ready.notify_all();
    }

    pub fn reset_stop(&self) {
        self.state.lock().stop = false;
    }

    pub fn stop_requested(&self) -> bool {
        self.state.lock().stop
    }

    /// Number of operations waiting in FIFO order.
    pub fn len(&self) -> usize {
        self.state.lock().ops.len()
    }

    pub fn is_reserved(&self, id: OperationId) -> bool {
        self.state.lock().reserved.contains_key(&id)
    }
}
