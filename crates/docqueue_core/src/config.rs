//! Manager configuration.

use std::time::Duration;

/// Configuration for opening an [`crate::IoManager`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to launch the worker as part of opening the manager.
    pub start_on_open: bool,

    /// Longest the worker sleeps before re-checking the stop flag.
    ///
    /// The worker is woken immediately when work arrives; this only bounds
    /// how long an idle worker takes to notice `stop()`.
    pub idle_interval: Duration,

    /// Upper bound on how long a caller waits for a read result.
    ///
    /// `None` waits indefinitely.
    pub read_timeout: Option<Duration>,

    /// Whether every write is synced to disk before the worker moves on.
    pub sync_on_write: bool,

    /// Whether missing parent directories are created for the document.
    pub create_dirs: bool,

    /// Number of worker events kept for polling.
    pub event_history: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_on_open: true,
            idle_interval: Duration::from_millis(100),
            read_timeout: None,
            sync_on_write: true,
            create_dirs: true,
            event_history: 1024,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the worker starts when the manager is opened.
    #[must_use]
    pub const fn start_on_open(mut self, value: bool) -> Self {
        self.start_on_open = value;
        self
    }

    /// Sets the worker's idle interval.
    #[must_use]
    pub const fn idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets whether writes are synced to disk.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets whether missing parent directories are created.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Sets how many worker events are kept for polling.
    #[must_use]
    pub const fn event_history(mut self, len: usize) -> Self {
        self.event_history = len;
        self
    }
}
