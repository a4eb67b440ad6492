//! Completed read outputs, held until their caller claims them.

use crate::error::{CoreError, CoreResult};
use crate::id::OperationId;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct ResultState<D> {
    entries: HashMap<OperationId, CoreResult<D>>,
    /// Ids whose caller stopped waiting; their late results are dropped.
    forgotten: HashSet<OperationId>,
}

/// Mapping from read id to outcome.
///
/// The worker inserts, callers claim. Each caller waits on the shared
/// condition variable for its own id, and removal happens under the lock,
/// so exactly one claim succeeds per entry.
#[derive(Debug)]
pub(crate) struct ResultStore<D> {
    state: Mutex<ResultState<D>>,
    completed: Condvar,
}

impl<D> ResultStore<D> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ResultState {
                entries: HashMap::new(),
                forgotten: HashSet::new(),
            }),
            completed: Condvar::new(),
        }
    }

    /// Publishes the outcome of the read `id` and wakes waiting callers.
    pub fn insert(&self, id: OperationId, outcome: CoreResult<D>) {
        let mut state = self.state.lock();
        if state.forgotten.remove(&id) {
            return;
        }
        state.entries.insert(id, outcome);
        drop(state);
        self.completed.notify_all();
    }

    /// Wakes the caller of `id` with [`CoreError::Abandoned`].
    pub fn abandon(&self, id: OperationId) {
        self.insert(id, Err(CoreError::Abandoned { id }));
    }

    /// Blocks until the outcome for `id` is available and removes it.
    ///
    /// With a timeout, gives up after `timeout` with [`CoreError::Timeout`]
    /// and marks the id so a late outcome is discarded instead of kept.
    pub fn claim(&self, id: OperationId, timeout: Option<Duration>) -> CoreResult<D> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();
        loop {
            if let Some(outcome) = state.entries.remove(&id) {
                return outcome;
            }
            match deadline {
                None => self.completed.wait(&mut state),
                Some(deadline) => {
                    if self.completed.wait_until(&mut state, deadline).timed_out() {
                        if let Some(outcome) = state.entries.remove(&id) {
                            return outcome;
                        }
                        state.forgotten.insert(id);
                        return Err(CoreError::Timeout { id });
                    }
                }
            }
        }
    }

    /// Number of unclaimed entries.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }
}
