//! Property tests for queue ordering and transaction isolation.

use docqueue_core::{EventStatus, IoEvent, OperationKind};
use docqueue_testkit::prelude::*;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::thread;

fn stored_documents(store: &RecordingStore) -> Vec<Value> {
    store
        .stores()
        .iter()
        .map(|bytes| serde_json::from_slice(bytes).unwrap())
        .collect()
}

/// Every completed transactional read is immediately followed by its own
/// promoted write.
fn assert_transactions_isolated(events: &[IoEvent]) {
    for (index, event) in events.iter().enumerate() {
        let opened = event.kind == OperationKind::Read { transactional: true }
            && event.status == EventStatus::Completed;
        if !opened {
            continue;
        }
        let next = events
            .get(index + 1)
            .unwrap_or_else(|| panic!("transaction {:?} never closed", event.id));
        assert_eq!(next.kind, OperationKind::Write { promoted: true });
        assert_eq!(next.id, event.id);
        assert_eq!(next.sequence, event.sequence + 1);
    }
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn single_caller_scripts_match_sequential_model(script in script_strategy(25)) {
        let model = ScriptModel::run(&script);
        let (io, store) = recording_manager(test_config());

        let mut reads = Vec::new();
        for op in &script {
            match op {
                ScriptOp::Write(value) => io.write(ScriptOp::document(*value), None),
                ScriptOp::Read => reads.push(io.read(None).unwrap()),
                ScriptOp::Update(delta) => io
                    .update(|doc| {
                        let current = doc.get("counter").and_then(Value::as_i64).unwrap_or(0);
                        doc["counter"] = json!(current + delta);
                    })
                    .unwrap(),
            }
        }
        io.read(None).unwrap();

        prop_assert_eq!(reads, model.reads);
        prop_assert_eq!(stored_documents(&store), model.stores);
        prop_assert_eq!(store.overlaps(), 0);
    }

    #[test]
    fn transactions_are_never_interleaved((threads, updates) in contention_strategy()) {
        let (io, store) = recording_manager(test_config());

        thread::scope(|scope| {
            for _ in 0..threads {
                let io = &io;
                scope.spawn(move || {
                    for step in 0..updates {
                        io.update(|doc| {
                            let current = doc.get("counter").and_then(Value::as_i64).unwrap_or(0);
                            doc["counter"] = json!(current + 1);
                        })
                        .unwrap();
                        if step % 2 == 0 {
                            io.read(None).unwrap();
                        }
                    }
                });
            }
        });
        io.read(None).unwrap();

        let events = io.events().poll(0, usize::MAX);
        assert_transactions_isolated(&events);

        let expected = i64::try_from(threads * updates).unwrap();
        prop_assert_eq!(io.read(None).unwrap()["counter"].as_i64(), Some(expected));
        prop_assert_eq!(store.overlaps(), 0);
    }
}

#[test]
fn plain_writes_interleave_between_transactions_only() {
    let (io, store) = recording_manager(test_config());

    thread::scope(|scope| {
        for writer in 0..3 {
            let io = &io;
            scope.spawn(move || {
                for step in 0..20 {
                    if writer == 0 {
                        io.update(|doc| doc["tx"] = json!(step)).unwrap();
                    } else {
                        io.write(json!({ "plain": writer, "step": step }), None);
                    }
                }
            });
        }
    });
    io.read(None).unwrap();

    assert_transactions_isolated(&io.events().poll(0, usize::MAX));
    assert_eq!(store.stores().len(), 60);
    assert_eq!(store.overlaps(), 0);
}

#[test]
fn failed_write_is_published_and_worker_continues() {
    let (io, store) = recording_manager(test_config());
    let events = io.subscribe();

    store.fail_stores(true);
    io.write(json!({ "lost": true }), None);
    io.read(None).unwrap();
    store.fail_stores(false);

    io.write(json!({ "kept": true }), None);
    assert_eq!(io.read(None).unwrap(), json!({ "kept": true }));

    let failure = events
        .try_iter()
        .find(IoEvent::is_failure)
        .expect("write failure event");
    assert_eq!(failure.kind, OperationKind::Write { promoted: false });
    assert!(!io.is_stopped());
}

#[test]
fn failed_transactional_read_closes_transaction() {
    let (io, store) = recording_manager(test_config());

    store.fail_loads(true);
    let id = io.get_id();
    assert!(io.read_for_update(id).is_err());
    store.fail_loads(false);

    wait_until("reservation released", || !io.is_reserved(id));
    io.write(json!({ "after": 1 }), None);
    assert_eq!(io.read(None).unwrap(), json!({ "after": 1 }));
}

#[test]
fn failed_transactional_read_reports_parked_write() {
    let (io, store) = recording_manager(test_config().start_on_open(false));
    let id = io.get_id();

    thread::scope(|scope| {
        let reader = scope.spawn(|| io.read_for_update(id));
        wait_until("reservation", || io.is_reserved(id));
        io.write(json!({ "paired": true }), Some(id));

        store.fail_loads(true);
        io.start().unwrap();
        assert!(reader.join().unwrap().is_err());
    });
    store.fail_loads(false);

    let parked_write = || {
        io.events()
            .poll(0, usize::MAX)
            .into_iter()
            .find(|e| e.id == Some(id) && matches!(e.kind, OperationKind::Write { .. }))
    };
    wait_until("parked write reported", || parked_write().is_some());
    assert_eq!(parked_write().unwrap().status, EventStatus::Abandoned);
    assert!(!io.is_reserved(id));

    assert_eq!(io.read(None).unwrap(), json!({}));
    assert!(store.stores().is_empty());
}

proptest! {
    #![proptest_config(PropTestConfig::thorough().to_proptest_config())]

    #[test]
    #[ignore = "slow; run with --ignored"]
    fn thorough_scripts_match_sequential_model(script in script_strategy(60)) {
        let model = ScriptModel::run(&script);
        let (io, store) = recording_manager(test_config());

        let mut reads = Vec::new();
        for op in &script {
            match op {
                ScriptOp::Write(value) => io.write(ScriptOp::document(*value), None),
                ScriptOp::Read => reads.push(io.read(None).unwrap()),
                ScriptOp::Update(delta) => io
                    .update(|doc| {
                        let current = doc.get("counter").and_then(Value::as_i64).unwrap_or(0);
                        doc["counter"] = json!(current + delta);
                    })
                    .unwrap(),
            }
        }
        io.read(None).unwrap();

        prop_assert_eq!(reads, model.reads);
        prop_assert_eq!(stored_documents(&store), model.stores);
    }
}
