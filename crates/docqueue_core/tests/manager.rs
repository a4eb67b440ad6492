//! Integration tests for the queued document manager.

use docqueue_core::{
    BinaryCodec, Config, CoreError, DocumentStore, EventStatus, InMemoryStore, IoManager,
    JsonCodec, OperationId, OperationKind, RejectReason, TextCodec,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::tempdir;

type MemoryManager = IoManager<JsonCodec, Arc<InMemoryStore>>;

fn fast_config() -> Config {
    Config::new().idle_interval(Duration::from_millis(5))
}

fn memory_manager(config: Config) -> (MemoryManager, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let manager =
        IoManager::with_store(Arc::clone(&store), JsonCodec::<Value>::new(), config).unwrap();
    (manager, store)
}

fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn creates_empty_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("configs.json");

    let io = IoManager::open_with_config(&path, fast_config()).unwrap();
    assert!(path.exists());
    assert_eq!(io.read(None).unwrap(), json!({}));
}

#[test]
fn keeps_existing_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("configs.json");
    std::fs::write(&path, r#"{"existing": true}"#).unwrap();

    let io = IoManager::open_with_config(&path, fast_config()).unwrap();
    assert_eq!(io.read(None).unwrap(), json!({"existing": true}));
}

#[test]
fn write_then_read_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("configs.json");

    let io = IoManager::open_with_config(&path, fast_config()).unwrap();
    io.write(json!({"a": 1}), None);
    assert_eq!(io.read(None).unwrap(), json!({"a": 1}));

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert_eq!(on_disk, "{\n    \"a\": 1\n}");
}

#[test]
fn get_id_is_unique() {
    let (io, _) = memory_manager(fast_config());
    let ids: HashSet<OperationId> = (0..500).map(|_| io.get_id()).collect();
    assert_eq!(ids.len(), 500);
}

#[test]
fn read_for_update_requires_id() {
    let (io, _) = memory_manager(fast_config());

    let result = io.read_for_update(OperationId::nil());
    assert!(matches!(
        result,
        Err(CoreError::Rejected {
            reason: RejectReason::MissingId,
            ..
        })
    ));
    assert_eq!(io.pending(), 0);
}

#[test]
fn duplicate_reservation_is_rejected() {
    let (io, _) = memory_manager(fast_config());
    let id = io.get_id();

    assert_eq!(io.read_for_update(id).unwrap(), json!({}));
    assert!(io.is_reserved(id));

    let second = io.read_for_update(id);
    assert!(matches!(
        second,
        Err(CoreError::Rejected {
            reason: RejectReason::AlreadyReserved,
            ..
        })
    ));

    // The first transaction is unaffected and still closes normally.
    io.write(json!({"closed": true}), Some(id));
    wait_until("reservation release", || !io.is_reserved(id));
    assert_eq!(io.read(None).unwrap(), json!({"closed": true}));
}

#[test]
fn duplicate_queued_id_is_rejected() {
    let (io, _) = memory_manager(fast_config().start_on_open(false));
    let id = io.get_id();

    io.write(json!({"queued": true}), Some(id));
    let result = io.read_for_update(id);
    assert!(matches!(
        result,
        Err(CoreError::Rejected {
            reason: RejectReason::AlreadyQueued,
            ..
        })
    ));
    assert!(!io.is_reserved(id));
    assert_eq!(io.pending(), 1);
}

#[test]
fn transaction_sees_pre_write_state() {
    let (io, _) = memory_manager(fast_config());
    let io = Arc::new(io);
    let id = io.get_id();

    let reader = {
        let io = Arc::clone(&io);
        thread::spawn(move || io.read_for_update(id).unwrap())
    };
    wait_until("reservation", || io.is_reserved(id));
    io.write(json!({"k": "v"}), Some(id));

    assert_eq!(reader.join().unwrap(), json!({}));
    assert_eq!(io.read(None).unwrap(), json!({"k": "v"}));
}

#[test]
fn nothing_runs_inside_a_transaction() {
    let (io, _) = memory_manager(fast_config());
    let io = Arc::new(io);
    let events = io.subscribe();
    let id = io.get_id();

    let mut doc = io.read_for_update(id).unwrap();

    // Queued while the transaction is open; must wait for it.
    let bystander = {
        let io = Arc::clone(&io);
        thread::spawn(move || {
            io.write(json!({"bystander": true}), None);
            io.read(None).unwrap()
        })
    };
    wait_until("bystander read queued", || io.pending() == 2);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(io.pending(), 2);

    doc["owner"] = json!("transaction");
    io.write(doc, Some(id));

    assert_eq!(bystander.join().unwrap(), json!({"bystander": true}));

    let kinds: Vec<_> = events.try_iter().take(4).map(|e| (e.id, e.kind)).collect();
    assert_eq!(
        kinds[..2],
        [
            (Some(id), OperationKind::Read { transactional: true }),
            (Some(id), OperationKind::Write { promoted: true }),
        ]
    );
    assert_eq!(kinds[2].1, OperationKind::Write { promoted: false });
}

#[test]
fn plain_operations_run_in_fifo_order() {
    let (io, store) = memory_manager(fast_config().start_on_open(false));
    let events = io.subscribe();

    let ids: Vec<_> = (0..10).map(|_| io.get_id()).collect();
    for (i, id) in ids.iter().enumerate() {
        io.write(json!({ "step": i }), Some(*id));
    }
    assert_eq!(io.pending(), 10);
    // Nothing touched the store while stopped.
    assert_eq!(store.data(), Some(b"{}".to_vec()));

    io.start().unwrap();
    assert_eq!(io.read(None).unwrap(), json!({"step": 9}));

    let executed: Vec<_> = events.try_iter().take(10).map(|e| e.id.unwrap()).collect();
    assert_eq!(executed, ids);
}

#[test]
fn stop_with_unmatched_transaction_still_stops() {
    let (io, _) = memory_manager(fast_config());
    let id = io.get_id();

    io.read_for_update(id).unwrap();
    assert!(!io.is_stopped());

    io.stop();
    wait_until("worker exit", || io.is_stopped());
    assert!(!io.is_reserved(id));
}

#[test]
fn stop_abandons_queued_reads() {
    let (io, _) = memory_manager(fast_config());
    let io = Arc::new(io);
    let id = io.get_id();

    io.read_for_update(id).unwrap();
    let waiting = {
        let io = Arc::clone(&io);
        thread::spawn(move || io.read(None))
    };
    wait_until("queued read", || io.pending() == 1);

    io.stop_and_wait();
    assert!(io.is_stopped());
    assert!(matches!(
        waiting.join().unwrap(),
        Err(CoreError::Abandoned { .. })
    ));
    assert_eq!(io.pending(), 0);

    let abandoned = io
        .events()
        .poll(0, 100)
        .into_iter()
        .filter(|e| e.status == EventStatus::Abandoned)
        .count();
    assert_eq!(abandoned, 1);
}

#[test]
fn restart_after_stop() {
    let (io, _) = memory_manager(fast_config());
    io.write(json!({"before": 1}), None);
    assert_eq!(io.read(None).unwrap(), json!({"before": 1}));

    io.stop_and_wait();
    assert!(io.is_stopped());

    // Queued while stopped, executed after restart.
    io.write(json!({"after": 2}), None);
    assert_eq!(io.pending(), 1);

    io.start().unwrap();
    assert!(!io.is_stopped());
    assert_eq!(io.read(None).unwrap(), json!({"after": 2}));
}

#[test]
fn start_is_idempotent() {
    let (io, _) = memory_manager(fast_config());
    io.start().unwrap();
    io.start().unwrap();
    io.write(json!({"x": 1}), None);
    assert_eq!(io.read(None).unwrap(), json!({"x": 1}));

    io.stop();
    io.stop();
    wait_until("worker exit", || io.is_stopped());
}

#[test]
fn read_timeout_while_stopped() {
    let (io, _) = memory_manager(
        fast_config()
            .start_on_open(false)
            .read_timeout(Some(Duration::from_millis(30))),
    );

    let result = io.read(None);
    assert!(matches!(result, Err(CoreError::Timeout { .. })));
}

#[test]
fn timed_out_transaction_is_cancelled() {
    let (io, _) = memory_manager(
        fast_config()
            .start_on_open(false)
            .read_timeout(Some(Duration::from_millis(30))),
    );
    let id = io.get_id();

    let result = io.read_for_update(id);
    assert!(matches!(result, Err(CoreError::Timeout { .. })));
    assert!(!io.is_reserved(id));
    assert_eq!(io.pending(), 0);

    // The id is free again.
    io.start().unwrap();
    assert_eq!(io.read_for_update(id).unwrap(), json!({}));
    io.cancel(id);
    wait_until("reservation release", || !io.is_reserved(id));
}

#[test]
fn cancel_releases_open_transaction() {
    let (io, _) = memory_manager(fast_config());
    let id = io.get_id();

    io.read_for_update(id).unwrap();
    io.cancel(id);
    wait_until("reservation release", || !io.is_reserved(id));

    // The worker is free; a late write for the id is a plain write.
    io.write(json!({"late": true}), Some(id));
    assert_eq!(io.read(None).unwrap(), json!({"late": true}));
}

#[test]
fn cancel_before_read_runs_wakes_reader_and_keeps_write() {
    let (io, _) = memory_manager(fast_config().start_on_open(false));
    let io = Arc::new(io);
    let id = io.get_id();

    let reader = {
        let io = Arc::clone(&io);
        thread::spawn(move || io.read_for_update(id))
    };
    wait_until("reservation", || io.is_reserved(id));

    io.write(json!({"paired": true}), Some(id));
    io.cancel(id);

    assert!(matches!(
        reader.join().unwrap(),
        Err(CoreError::Abandoned { .. })
    ));
    assert!(!io.is_reserved(id));
    assert_eq!(io.pending(), 1);

    io.start().unwrap();
    assert_eq!(io.read(None).unwrap(), json!({"paired": true}));

    let write = io
        .events()
        .poll(0, 100)
        .into_iter()
        .find(|e| e.id == Some(id))
        .expect("write event");
    assert_eq!(write.kind, OperationKind::Write { promoted: false });
    assert_eq!(write.status, EventStatus::Completed);
}

#[test]
fn stop_reports_parked_write() {
    let (io, _) = memory_manager(fast_config().start_on_open(false));
    let io = Arc::new(io);
    let id = io.get_id();

    let reader = {
        let io = Arc::clone(&io);
        thread::spawn(move || io.read_for_update(id))
    };
    wait_until("reservation", || io.is_reserved(id));
    io.write(json!({"paired": true}), Some(id));

    io.start().unwrap();
    io.stop_and_wait();
    let _ = reader.join().unwrap();

    // Whether the transaction ran before the stop or not, its write shows up.
    let write = io
        .events()
        .poll(0, 100)
        .into_iter()
        .find(|e| e.id == Some(id) && matches!(e.kind, OperationKind::Write { .. }))
        .expect("write event");
    assert!(matches!(
        write.status,
        EventStatus::Completed | EventStatus::Abandoned
    ));
    assert!(!io.is_reserved(id));
}

#[test]
fn malformed_document_is_reported_to_reader() {
    let (io, store) = memory_manager(fast_config());
    store.set_data(b"{ not json".to_vec());

    let result = io.read(None);
    assert!(matches!(result, Err(CoreError::Codec(_))));

    // A failed transactional read opens no transaction.
    let id = io.get_id();
    assert!(matches!(io.read_for_update(id), Err(CoreError::Codec(_))));
    wait_until("reservation release", || !io.is_reserved(id));

    // The worker keeps going.
    io.write(json!({"repaired": true}), None);
    assert_eq!(io.read(None).unwrap(), json!({"repaired": true}));
}

#[test]
fn update_runs_closure_atomically() {
    let (io, _) = memory_manager(fast_config());
    io.write(json!({"LoginDetails": {"Token": null}}), None);

    let previous = io
        .update(|doc| {
            let old = doc["LoginDetails"]["Token"].clone();
            doc["LoginDetails"]["Token"] = json!("secret");
            old
        })
        .unwrap();

    assert_eq!(previous, Value::Null);
    assert_eq!(
        io.read(None).unwrap()["LoginDetails"]["Token"],
        json!("secret")
    );
}

#[test]
fn panicking_update_does_not_wedge_worker() {
    let (io, _) = memory_manager(fast_config());
    let io = Arc::new(io);

    let panicker = {
        let io = Arc::clone(&io);
        thread::spawn(move || {
            let _ = io.update(|_doc| -> () { panic!("caller bug") });
        })
    };
    assert!(panicker.join().is_err());

    io.write(json!({"alive": true}), None);
    assert_eq!(io.read(None).unwrap(), json!({"alive": true}));
}

#[test]
fn concurrent_updates_lose_nothing() {
    let (io, _) = memory_manager(fast_config());
    let io = Arc::new(io);
    io.write(json!({"count": 0}), None);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let io = Arc::clone(&io);
            thread::spawn(move || {
                for _ in 0..25 {
                    io.update(|doc| {
                        let count = doc["count"].as_u64().unwrap();
                        doc["count"] = json!(count + 1);
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(io.read(None).unwrap(), json!({"count": 200}));
}

#[test]
fn text_mode_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");

    let io = IoManager::open_with_codec(&path, TextCodec, fast_config()).unwrap();
    assert_eq!(io.read(None).unwrap(), "");

    io.write("not { json".to_string(), None);
    assert_eq!(io.read(None).unwrap(), "not { json");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "not { json");
}

#[test]
fn binary_mode_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blob.bin");

    let io = IoManager::open_with_codec(&path, BinaryCodec, fast_config()).unwrap();
    let id = io.get_id();

    let mut bytes = io.read_for_update(id).unwrap();
    bytes.extend_from_slice(&[0xde, 0xad]);
    io.write(bytes, Some(id));

    assert_eq!(io.read(None).unwrap(), vec![0xde, 0xad]);
}

#[test]
fn drop_stops_worker() {
    let store = Arc::new(InMemoryStore::new());
    {
        let io: MemoryManager =
            IoManager::with_store(Arc::clone(&store), JsonCodec::new(), fast_config()).unwrap();
        io.write(json!({"flushed": true}), None);
        io.read(None).unwrap();
    }
    assert_eq!(
        serde_json::from_slice::<Value>(&store.load().unwrap()).unwrap(),
        json!({"flushed": true})
    );
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct LoginDetails {
    token: Option<String>,
    bot_user: bool,
}

#[test]
fn typed_document_transaction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("login.json");

    let io = IoManager::open_with_codec(&path, JsonCodec::<LoginDetails>::new(), fast_config())
        .unwrap();
    assert_eq!(io.read(None).unwrap(), LoginDetails::default());

    io.update(|details| {
        details.token = Some("abc".to_string());
        details.bot_user = true;
    })
    .unwrap();

    let details = io.read(None).unwrap();
    assert_eq!(details.token.as_deref(), Some("abc"));

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"Token": "abc", "BotUser": true}));
}
