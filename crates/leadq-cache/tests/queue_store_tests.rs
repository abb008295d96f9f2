//! Integration tests for SqliteQueueStore and SqliteDeviceIdentity
//!
//! Each test creates a fresh database. File-backed tests reopen the same
//! path to check that state survives a restart.

use std::time::Duration;

use chrono::{TimeZone, Utc};

use leadq_cache::{DatabasePool, SqliteDeviceIdentity, SqliteQueueStore};
use leadq_core::domain::{Payload, Record, RecordState, Submission};
use leadq_core::ports::{IDeviceIdentity, IQueueStore};

// ============================================================================
// Test helpers
// ============================================================================

async fn setup() -> (DatabasePool, SqliteQueueStore) {
    let db = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let store = SqliteQueueStore::new(db.pool().clone());
    (db, store)
}

fn record(name: &str) -> Record {
    let payload = Payload::new()
        .with("fullName", name)
        .with("email", format!("{}@x.com", name.to_lowercase()));
    let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
    Record::queued(Submission::captured_at(payload, at))
}

fn failed_record(name: &str) -> Record {
    let mut r = record(name);
    r.record_failed_attempt(1).unwrap();
    r
}

async fn write_raw(db: &DatabasePool, key: &str, value: &str) {
    sqlx::query("INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, '')")
        .bind(key)
        .bind(value)
        .execute(db.pool())
        .await
        .unwrap();
}

// ============================================================================
// Queue store
// ============================================================================

#[tokio::test]
async fn test_empty_store_loads_nothing() {
    let (_db, store) = setup().await;
    assert!(store.load_all().await.unwrap().is_empty());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_save_then_load_preserves_order_and_fields() {
    let (_db, store) = setup().await;
    let records = vec![record("Asha"), failed_record("Ben"), record("Chen")];

    store.save_all(&records).await.unwrap();
    let loaded = store.load_all().await.unwrap();

    assert_eq!(loaded, records);
    assert_eq!(loaded[1].state(), RecordState::Failed);
    assert_eq!(loaded[1].attempts(), 1);
    assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_save_of_loaded_snapshot_is_a_noop() {
    let (_db, store) = setup().await;
    store
        .save_all(&[record("Asha"), failed_record("Ben")])
        .await
        .unwrap();

    let before = store.load_all().await.unwrap();
    store.save_all(&before).await.unwrap();
    let after = store.load_all().await.unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn test_save_replaces_previous_snapshot() {
    let (_db, store) = setup().await;
    store
        .save_all(&[record("Asha"), record("Ben")])
        .await
        .unwrap();

    let only = record("Chen");
    store.save_all(std::slice::from_ref(&only)).await.unwrap();

    assert_eq!(store.load_all().await.unwrap(), vec![only]);
}

#[tokio::test]
async fn test_persisted_layout_is_a_json_array_under_pending_leads() {
    let (db, store) = setup().await;
    let r = record("Asha");
    store.save_all(std::slice::from_ref(&r)).await.unwrap();

    let raw: String = sqlx::query_scalar("SELECT value FROM kv WHERE key = 'pendingLeads'")
        .fetch_one(db.pool())
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert!(json.is_array());
    assert_eq!(json[0]["id"], r.id().to_string());
    assert_eq!(json[0]["payload"]["fullName"], "Asha");
    assert_eq!(json[0]["attempts"], 0);
    assert_eq!(json[0]["state"], "pending");
    assert_eq!(json[0]["capturedAt"], "2026-10-19T09:00:00Z");
}

#[tokio::test]
async fn test_clear_all_on_mixed_records() {
    let (_db, store) = setup().await;
    store
        .save_all(&[
            record("A"),
            failed_record("B"),
            record("C"),
            failed_record("D"),
            record("E"),
        ])
        .await
        .unwrap();
    assert_eq!(store.count().await.unwrap(), 5);

    store.clear_all().await.unwrap();

    assert!(store.load_all().await.unwrap().is_empty());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_clear_all_keeps_device_id() {
    let (db, store) = setup().await;
    let identity = SqliteDeviceIdentity::new(db.pool().clone());
    let id = identity.device_id().await.unwrap();
    store.save_all(&[record("A")]).await.unwrap();

    store.clear_all().await.unwrap();

    assert_eq!(identity.device_id().await.unwrap(), id);
}

#[tokio::test]
async fn test_corrupt_queue_is_an_error_not_an_empty_queue() {
    let (db, store) = setup().await;
    write_raw(&db, "pendingLeads", "{not json").await;

    let err = store.load_all().await.unwrap_err();
    assert!(err.to_string().contains("pendingLeads"), "got: {err}");
    assert!(store.count().await.is_err());
}

#[tokio::test]
async fn test_record_with_unknown_state_is_corrupt() {
    let (db, store) = setup().await;
    write_raw(
        &db,
        "pendingLeads",
        r#"[{"id":"6a1f2f7e-3c1e-4c55-9e7e-0d3f1b8f2a10","payload":{},"capturedAt":"2026-10-19T09:00:00Z","attempts":0,"state":"synced"}]"#,
    )
    .await;

    assert!(store.load_all().await.is_err());
}

#[tokio::test]
async fn test_queue_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leadq.db");
    let records = vec![record("Asha"), record("Ben")];

    {
        let db = DatabasePool::new(&path).await.unwrap();
        let store = SqliteQueueStore::new(db.pool().clone());
        store.save_all(&records).await.unwrap();
        db.pool().close().await;
    }

    let db = DatabasePool::new(&path).await.unwrap();
    let store = SqliteQueueStore::new(db.pool().clone());
    assert_eq!(store.load_all().await.unwrap(), records);
}

#[tokio::test]
async fn test_update_applies_mutation_and_persists() {
    let (_db, store) = setup().await;
    store.save_all(&[record("A")]).await.unwrap();

    let second = record("B");
    let returned = store
        .update(Box::new(move |mut records| {
            records.push(second);
            records
        }))
        .await
        .unwrap();

    let names: Vec<_> = store
        .load_all()
        .await
        .unwrap()
        .iter()
        .map(|r| r.payload().get_str("fullName").unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(returned.len(), 2);
}

#[tokio::test]
async fn test_update_on_corrupt_queue_leaves_data_untouched() {
    let (db, store) = setup().await;
    write_raw(&db, "pendingLeads", "{not json").await;

    let result = store.update(Box::new(|records| records)).await;
    assert!(result.is_err());

    let raw: String = sqlx::query_scalar("SELECT value FROM kv WHERE key = 'pendingLeads'")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(raw, "{not json");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_updates_from_two_pools_keep_both_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leadq.db");
    let daemon_db = DatabasePool::new(&path).await.unwrap();
    let cli_db = DatabasePool::new(&path).await.unwrap();
    let daemon = SqliteQueueStore::new(daemon_db.pool().clone());
    let cli = SqliteQueueStore::new(cli_db.pool().clone());
    let reader = cli.clone();

    let delivered = record("A");
    let delivered_id = delivered.id();
    daemon.save_all(&[delivered]).await.unwrap();

    // The daemon removes A but stalls between its read and its write.
    let (inside_tx, inside_rx) = tokio::sync::oneshot::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let commit = tokio::spawn(async move {
        daemon
            .update(Box::new(move |records| {
                let _ = inside_tx.send(());
                release_rx.recv().unwrap();
                records
                    .into_iter()
                    .filter(|r| r.id() != delivered_id)
                    .collect()
            }))
            .await
    });
    inside_rx.await.unwrap();

    let captured = record("B");
    let captured_id = captured.id();
    let append = tokio::spawn(async move {
        cli.update(Box::new(move |mut records| {
            records.push(captured);
            records
        }))
        .await
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!append.is_finished(), "second writer must wait for the first");

    release_tx.send(()).unwrap();
    commit.await.unwrap().unwrap();
    append.await.unwrap().unwrap();

    let records = reader.load_all().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id(), captured_id);
}

// ============================================================================
// Device identity
// ============================================================================

#[tokio::test]
async fn test_device_id_is_generated_once() {
    let (db, _store) = setup().await;
    let identity = SqliteDeviceIdentity::new(db.pool().clone());

    let first = identity.device_id().await.unwrap();
    let second = identity.device_id().await.unwrap();

    assert_eq!(first, second);
    assert!(first.as_str().starts_with("device-"));
    assert_eq!(first.as_str().len(), "device-".len() + 9);
}

#[tokio::test]
async fn test_device_id_reuses_stored_value() {
    let (db, _store) = setup().await;
    write_raw(&db, "deviceId", "device-abc123def").await;

    let identity = SqliteDeviceIdentity::new(db.pool().clone());
    assert_eq!(identity.device_id().await.unwrap().as_str(), "device-abc123def");
}

#[tokio::test]
async fn test_invalid_stored_device_id_is_an_error() {
    let (db, _store) = setup().await;
    write_raw(&db, "deviceId", "not a device id").await;

    let identity = SqliteDeviceIdentity::new(db.pool().clone());
    assert!(identity.device_id().await.is_err());
}

#[tokio::test]
async fn test_device_id_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leadq.db");

    let first = {
        let db = DatabasePool::new(&path).await.unwrap();
        let id = SqliteDeviceIdentity::new(db.pool().clone())
            .device_id()
            .await
            .unwrap();
        db.pool().close().await;
        id
    };

    let db = DatabasePool::new(&path).await.unwrap();
    let second = SqliteDeviceIdentity::new(db.pool().clone())
        .device_id()
        .await
        .unwrap();
    assert_eq!(first, second);
}
