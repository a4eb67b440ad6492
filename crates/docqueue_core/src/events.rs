//! Feed of operations executed (or dropped) by the worker.
//!
//! Writes never report back to their caller, so this feed is where a failed
//! write becomes visible. It also records the exact order in which the
//! worker touched the document.
//!
//! # Usage
//!
//! ```rust,ignore
//! let manager = IoManager::open("configs.json")?;
//! let events = manager.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(event) = events.recv() {
//!         if let EventStatus::Failed(message) = &event.status {
//!             eprintln!("{:?} failed: {}", event.kind, message);
//!         }
//!     }
//! });
//! ```

use crate::id::OperationId;
use crate::operation::OperationKind;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

/// How an operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStatus {
    /// The operation ran and the store accepted it.
    Completed,
    /// The store or codec reported an error.
    Failed(String),
    /// The operation was discarded when the worker stopped.
    Abandoned,
}

/// A single worker event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoEvent {
    /// Position in the worker's execution order, starting at 1.
    pub sequence: u64,
    /// The operation's id, if it had one.
    pub id: Option<OperationId>,
    /// What kind of operation it was.
    pub kind: OperationKind,
    /// How it ended.
    pub status: EventStatus,
}

impl IoEvent {
    /// Returns true if the operation failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.status, EventStatus::Failed(_))
    }
}

#[derive(Debug)]
struct FeedState {
    history: VecDeque<IoEvent>,
    next_sequence: u64,
}

/// Distributes worker events to subscribers and keeps a bounded history.
#[derive(Debug)]
pub struct EventFeed {
    subscribers: RwLock<Vec<Sender<IoEvent>>>,
    state: RwLock<FeedState>,
    max_history: usize,
}

impl EventFeed {
    /// Creates a feed keeping at most `max_history` events.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            state: RwLock::new(FeedState {
                history: VecDeque::new(),
                next_sequence: 1,
            }),
            max_history,
        }
    }

    /// Returns a receiver for all future events.
    pub fn subscribe(&self) -> Receiver<IoEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Records an event and sends it to every live subscriber.
    pub(crate) fn emit(&self, id: Option<OperationId>, kind: OperationKind, status: EventStatus) {
        let event = {
            let mut state = self.state.write();
            let event = IoEvent {
                sequence: state.next_sequence,
                id,
                kind,
                status,
            };
            state.next_sequence += 1;

            if self.max_history > 0 {
                state.history.push_back(event.clone());
                while state.history.len() > self.max_history {
                    state.history.pop_front();
                }
            }
            event
        };

        // Drop disconnected subscribers.
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns events with sequence > `cursor`, up to `limit`.
    pub fn poll(&self, cursor: u64, limit: usize) -> Vec<IoEvent> {
        self.state
            .read()
            .history
            .iter()
            .filter(|e| e.sequence > cursor)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Sequence number of the most recent event, 0 if none.
    pub fn latest_sequence(&self) -> u64 {
        self.state.read().next_sequence - 1
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::with_max_history(1024)
    }
}
