use trailhead_core::errors::{ExError, ExErrorKind, TrailError};

#[test]
fn test_snapshot_not_found_carries_name() {
    let err: ExError = TrailError::SnapshotNotFound {
        name: "trails_2024-01-01T00-00-00.000000Z.json".to_string(),
    }
    .into();

    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.code(), "ERR_NOT_FOUND");
    assert_eq!(err.snapshot(), Some("trails_2024-01-01T00-00-00.000000Z.json"));
    assert_eq!(err.message(), "snapshot_not_found");
}

#[test]
fn test_fetch_failure_is_acquisition() {
    let err: ExError = TrailError::FetchFailed {
        source_name: "https://example.org/trails.json".to_string(),
        reason: "connection refused".to_string(),
    }
    .into();

    assert_eq!(err.kind(), ExErrorKind::Acquisition);
    assert_eq!(err.op(), Some("fetch"));
    assert!(err.message().contains("connection refused"));
}

#[test]
fn test_timeouts_share_kind_but_not_op() {
    let fetch: ExError = TrailError::FetchTimedOut {
        source_name: "upstream".to_string(),
        after_ms: 20_000,
    }
    .into();
    let run: ExError = TrailError::RunTimedOut {
        stage: "promoting".to_string(),
        budget_ms: 300_000,
    }
    .into();

    assert_eq!(fetch.kind(), ExErrorKind::Timeout);
    assert_eq!(run.kind(), ExErrorKind::Timeout);
    assert_ne!(fetch.op(), run.op());
}

#[test]
fn test_in_progress_is_concurrency() {
    let err: ExError = TrailError::RefreshInProgress.into();
    assert_eq!(err.kind(), ExErrorKind::Concurrency);
    assert_eq!(err.message(), "refresh already in progress");
}

#[test]
fn test_rebuild_error_uses_step_as_op() {
    let err: ExError = TrailError::RebuildFailed {
        step: "render".to_string(),
        reason: "template missing".to_string(),
    }
    .into();
    assert_eq!(err.kind(), ExErrorKind::Rebuild);
    assert_eq!(err.op(), Some("render"));
}

#[test]
fn test_serde_json_error_is_serialization() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: ExError = parse_err.into();
    assert_eq!(err.kind(), ExErrorKind::Serialization);
}
