//! Test fixtures for managers.

use crate::recording::RecordingStore;
use docqueue_core::{Config, IoManager, JsonCodec};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Manager over a shared recording store.
pub type RecordingManager = IoManager<JsonCodec, Arc<RecordingStore>>;

/// Configuration suited to tests: short idle interval, no fsync.
#[must_use]
pub fn test_config() -> Config {
    Config::default()
        .idle_interval(Duration::from_millis(5))
        .sync_on_write(false)
}

/// A JSON manager over a temporary file, removed on drop.
pub struct TestManager {
    manager: IoManager,
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TestManager {
    /// Creates a manager over `doc.json` in a fresh temporary directory.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Creates a manager with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("doc.json");
        let manager = IoManager::open_with_config(&path, config).expect("Failed to open manager");
        Self {
            manager,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Creates a manager whose file already holds `document`.
    pub fn seeded(document: &serde_json::Value) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("doc.json");
        let text = serde_json::to_string_pretty(document).expect("Failed to encode seed");
        std::fs::write(&path, text).expect("Failed to write seed");
        let manager =
            IoManager::open_with_config(&path, test_config()).expect("Failed to open manager");
        Self {
            manager,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Path of the document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file directly, bypassing the manager.
    pub fn file_contents(&self) -> String {
        std::fs::read_to_string(&self.path).expect("Failed to read document file")
    }
}

impl Default for TestManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TestManager {
    type Target = IoManager;

    fn deref(&self) -> &Self::Target {
        &self.manager
    }
}

/// Creates a manager over a fresh recording store.
///
/// The store handle is returned alongside so tests can inspect its log.
pub fn recording_manager(config: Config) -> (RecordingManager, Arc<RecordingStore>) {
    recording_manager_over(RecordingStore::new(), config)
}

/// Creates a manager over the given recording store.
pub fn recording_manager_over(
    store: RecordingStore,
    config: Config,
) -> (RecordingManager, Arc<RecordingStore>) {
    let store = Arc::new(store);
    let manager = IoManager::with_store(Arc::clone(&store), JsonCodec::new(), config)
        .expect("Failed to create manager");
    (manager, store)
}

/// Runs a test with a temporary file-backed manager.
pub fn with_temp_manager<F, R>(f: F) -> R
where
    F: FnOnce(&TestManager) -> R,
{
    let manager = TestManager::new();
    f(&manager)
}

/// Runs a test with a recording manager.
pub fn with_recording_manager<F, R>(f: F) -> R
where
    F: FnOnce(&RecordingManager, &RecordingStore) -> R,
{
    let (manager, store) = recording_manager(test_config());
    f(&manager, &store)
}

/// Polls `condition` until it holds, panicking after five seconds.
pub fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            std::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Common documents for tests.
pub mod scenarios {
    use serde_json::{json, Value};

    /// A settings document with nested sections.
    pub fn settings() -> Value {
        json!({
            "LoginDetails": { "Token": null, "BotUser": false },
            "Theme": "dark",
            "Limits": { "Retries": 3 }
        })
    }

    /// A document holding a single counter.
    pub fn counter(value: i64) -> Value {
        json!({ "counter": value })
    }
}
