// Integration tests for the snapshot history: retention, best-effort pruning,
// and cold-start lookup of the newest valid snapshot.

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use trailhead_core::validation::Validator;
use trailhead_store::{DataLayout, SnapshotStore};

fn setup_store() -> (TempDir, SnapshotStore) {
    let dir = TempDir::new().expect("Failed to create temp data directory");
    let store = SnapshotStore::new(DataLayout::new(dir.path().join("trails.json")));
    store.ensure_history().unwrap();
    (dir, store)
}

fn valid_payload(stamp: &str) -> Value {
    json!({
        "generated_at": stamp,
        "island_groups": [{"island": "Madeira", "trails": [
            {"code": "PR1", "name": "Vereda do Areeiro", "status": "open"}
        ]}],
        "status_legend": {"open": "Fully open"},
        "sources": []
    })
}

#[test]
fn test_retention_keeps_newest_n() {
    // Given: N + k snapshots
    let (_dir, store) = setup_store();
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 6, 10, 0).unwrap();
    let (n, k) = (5usize, 3usize);
    let mut created = Vec::new();
    for day in 0..(n + k) {
        let at = base + Duration::days(day as i64);
        created.push(store.save_as_snapshot_at(&valid_payload("2024-01-01T00:00:00Z"), at).unwrap());
    }

    // When: pruning to N
    let report = store.prune_snapshots(n).unwrap();

    // Then: exactly the k oldest were deleted and N remain in order
    assert!(report.is_clean());
    let expected_deleted: Vec<String> = created[..k].iter().map(|s| s.name.clone()).collect();
    assert_eq!(report.deleted, expected_deleted);

    let remaining = store.list_snapshots().unwrap();
    assert_eq!(remaining.len(), n);
    assert_eq!(remaining, created[k..].to_vec());
}

#[test]
fn test_prune_under_window_deletes_nothing() {
    let (_dir, store) = setup_store();
    store.save_as_snapshot(&valid_payload("2024-01-01T00:00:00Z")).unwrap();

    let report = store.prune_snapshots(30).unwrap();

    assert!(report.deleted.is_empty());
    assert_eq!(store.list_snapshots().unwrap().len(), 1);
}

#[test]
fn test_prune_failure_does_not_block_others() {
    // Given: the oldest "snapshot" is a non-empty directory that cannot be unlinked
    let (_dir, store) = setup_store();
    let history = store.layout().history_dir();
    let stuck = history.join("trails_2000-01-01T00-00-00.000000Z.json");
    fs::create_dir(&stuck).unwrap();
    fs::write(stuck.join("pin"), b"x").unwrap();

    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let second = store
        .save_as_snapshot_at(&valid_payload("2024-01-01T00:00:00Z"), base)
        .unwrap();
    let third = store
        .save_as_snapshot_at(&valid_payload("2024-01-02T00:00:00Z"), base + Duration::days(1))
        .unwrap();

    // When: pruning to one
    let report = store.prune_snapshots(1).unwrap();

    // Then: the stuck entry is reported, the next-oldest is still deleted
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "trails_2000-01-01T00-00-00.000000Z.json");
    assert_eq!(report.deleted, vec![second.name]);
    assert!(third.path.exists());
}

#[test]
fn test_latest_good_skips_invalid_and_garbage() {
    let (_dir, store) = setup_store();
    let validator = Validator::load(&store.layout().schema_file()).unwrap();
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

    let good = store
        .save_as_snapshot_at(&valid_payload("2024-03-01T00:00:00Z"), base)
        .unwrap();
    store
        .save_as_snapshot_at(&json!({"generated_at": "2024-03-02T00:00:00Z"}), base + Duration::days(1))
        .unwrap();
    fs::write(
        store.layout().history_dir().join("trails_2024-03-03T00-00-00.000000Z.json"),
        b"{ truncated",
    )
    .unwrap();

    let latest = store.latest_good_snapshot(&validator).unwrap();
    assert_eq!(latest, Some(good));
}

#[test]
fn test_latest_good_none_when_empty() {
    let (_dir, store) = setup_store();
    let validator = store.validator().unwrap();
    assert_eq!(store.latest_good_snapshot(&validator).unwrap(), None);
}

#[test]
fn test_snapshot_content_is_payload() {
    let (_dir, store) = setup_store();
    let payload = valid_payload("2024-01-01T00:00:00Z");

    let snap = store.save_as_snapshot(&payload).unwrap();

    assert_eq!(store.read_snapshot(&snap).unwrap(), payload);
    assert!(snap.created_at().is_some());
}
