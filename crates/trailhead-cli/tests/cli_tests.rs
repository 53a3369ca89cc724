//! CLI integration tests
//!
//! Drive the `trailhead` binary against a scratch data file.

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn candidate(dir: &TempDir, name: &str, doc: &Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, doc.to_string()).unwrap();
    path
}

fn payload(stamp: &str) -> Value {
    json!({
        "generated_at": stamp,
        "island_groups": [{"island": "Madeira", "trails": [
            {"code": "PR1", "name": "Vereda do Areeiro", "status": "open"}
        ]}],
        "status_legend": {"open": "Fully open"},
        "sources": []
    })
}

fn trailhead(dir: &TempDir, data_file: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trailhead"))
        .current_dir(dir.path())
        .env_remove("ADMIN_TOKEN")
        .env_remove("PORT")
        .env("TRAILHEAD_LOG_PROFILE", "production")
        .args(args)
        .arg("--data-file")
        .arg(data_file)
        .output()
        .expect("Failed to execute CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_refresh_backups_health() {
    let dir = TempDir::new().unwrap();
    let data_file = dir.path().join("data").join("trails.json");
    let good = candidate(&dir, "good.json", &payload("2024-01-01T00:00:00Z"));

    let out = trailhead(&dir, &data_file, &["refresh", "--candidate", good.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let outcome: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(outcome["ok"], true);
    assert_eq!(outcome["count"], 1);

    let out = trailhead(&dir, &data_file, &["backups"]);
    assert!(out.status.success());
    let names: Vec<String> = stdout(&out).lines().map(str::to_string).collect();
    assert_eq!(names, vec![outcome["snapshot"].as_str().unwrap().to_string()]);

    let out = trailhead(&dir, &data_file, &["health"]);
    let health: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(health, json!({"ok": true, "updated_at": "2024-01-01T00:00:00Z"}));
}

#[test]
fn test_rejected_candidate_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let data_file = dir.path().join("data").join("trails.json");
    let mut bad = payload("2024-01-02T00:00:00Z");
    bad.as_object_mut().unwrap().remove("status_legend");
    let bad = candidate(&dir, "bad.json", &bad);

    let out = trailhead(&dir, &data_file, &["refresh", "--candidate", bad.to_str().unwrap()]);

    assert!(!out.status.success());
    let outcome: Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(outcome["error"], "validation_failed");
    assert!(!data_file.exists());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("ERR_VALIDATION_FAILED"), "stderr: {stderr}");
}

#[test]
fn test_rollback() {
    let dir = TempDir::new().unwrap();
    let data_file = dir.path().join("data").join("trails.json");
    let first = candidate(&dir, "first.json", &payload("2024-01-01T00:00:00Z"));
    let second = candidate(&dir, "second.json", &payload("2024-01-02T00:00:00Z"));

    let out = trailhead(&dir, &data_file, &["refresh", "--candidate", first.to_str().unwrap()]);
    let first_outcome: Value = serde_json::from_str(&stdout(&out)).unwrap();
    trailhead(&dir, &data_file, &["refresh", "--candidate", second.to_str().unwrap()]);

    let name = first_outcome["snapshot"].as_str().unwrap();
    let out = trailhead(&dir, &data_file, &["rollback", name]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let canonical: Value = serde_json::from_slice(&fs::read(&data_file).unwrap()).unwrap();
    assert_eq!(canonical["generated_at"], "2024-01-01T00:00:00Z");

    let out = trailhead(&dir, &data_file, &["rollback", "trails_missing.json"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no snapshot named trails_missing.json"));
}
