//! Stress tests for docqueue.
//!
//! These drive a manager from many threads at once and report how the
//! queue held up.

use docqueue_core::{DocumentStore, IoManager, JsonCodec};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 100,
            threads: 4,
        }
    }
}

impl StressConfig {
    /// Total operations across all threads.
    #[must_use]
    pub fn total(&self) -> usize {
        self.operations * self.threads
    }
}

/// Increments `doc[key]` once per operation from every thread, each through
/// a read-modify-write transaction.
///
/// With no lost updates the counter ends at [`StressConfig::total`].
pub fn stress_concurrent_updates<S>(
    io: &IoManager<JsonCodec, S>,
    key: &str,
    config: &StressConfig,
) -> StressTestResult
where
    S: DocumentStore + 'static,
{
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for _ in 0..config.threads {
            scope.spawn(|| {
                for _ in 0..config.operations {
                    let outcome = io.update(|doc| {
                        let current = doc.get(key).and_then(Value::as_i64).unwrap_or(0);
                        doc[key] = json!(current + 1);
                    });
                    match outcome {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            });
        }
    });

    StressTestResult::new(
        successful.into_inner(),
        failed.into_inner(),
        start.elapsed(),
    )
}

/// Mixes plain reads, plain writes to per-thread keys and transactions.
///
/// Plain writes replace the whole document, so this only checks that every
/// call returns; it makes no claim about the final contents.
pub fn stress_mixed_operations<S>(
    io: &IoManager<JsonCodec, S>,
    config: &StressConfig,
) -> StressTestResult
where
    S: DocumentStore + 'static,
{
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for worker in 0..config.threads {
            let successful = &successful;
            let failed = &failed;
            scope.spawn(move || {
                for i in 0..config.operations {
                    let outcome = match i % 3 {
                        0 => io.read(None).map(|_| ()),
                        1 => {
                            io.write(json!({ "writer": worker, "step": i }), None);
                            Ok(())
                        }
                        _ => io.update(|doc| {
                            doc["last"] = json!(worker);
                        }),
                    };
                    match outcome {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            });
        }
    });

    StressTestResult::new(
        successful.into_inner(),
        failed.into_inner(),
        start.elapsed(),
    )
}
