use thiserror::Error;

/// Result type alias using the structured error
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure in the pipeline maps onto one of these kinds. Each kind has a
/// stable code used in logs, HTTP error bodies and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    NotFound,
    /// Candidate payload violated the schema (the run ends `Rejected`)
    ValidationFailed,

    // Pipeline stages
    /// The Fetcher could not produce a candidate (network, parse)
    Acquisition,
    /// Snapshot write, rename or promotion failed
    Persistence,
    /// Enricher/Renderer failed after a successful promotion (non-fatal)
    Rebuild,

    // Integration/IO
    Io,
    Serialization,
    Timeout,
    /// Another run already holds the single-flight gate
    Concurrency,
    Config,

    // Auth
    Unauthorised,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ValidationFailed => "ERR_VALIDATION_FAILED",
            ExErrorKind::Acquisition => "ERR_ACQUISITION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Rebuild => "ERR_REBUILD",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Unauthorised => "ERR_UNAUTHORISED",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) for programmatic handling plus the
/// operation and snapshot context needed to debug a failed run.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    snapshot: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            snapshot: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add snapshot name context
    pub fn with_snapshot(mut self, name: impl Into<String>) -> Self {
        self.snapshot = Some(name.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the snapshot context, if any
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(snapshot) = &self.snapshot {
            write!(f, " (snapshot: {})", snapshot)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain failures of the refresh-and-promotion pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrailError {
    /// The Fetcher failed to produce a candidate payload
    #[error("Fetch from {source_name} failed: {reason}")]
    FetchFailed { source_name: String, reason: String },

    /// The Fetcher did not answer within its timeout
    #[error("Fetch from {source_name} timed out after {after_ms}ms")]
    FetchTimedOut { source_name: String, after_ms: u64 },

    /// The run exceeded its maximum duration and was abandoned
    #[error("Run exceeded its {budget_ms}ms budget before {stage}")]
    RunTimedOut { stage: String, budget_ms: u64 },

    /// Another run holds the single-flight gate
    #[error("refresh already in progress")]
    RefreshInProgress,

    /// No snapshot with this name exists in the history
    #[error("Snapshot not found: {name}")]
    SnapshotNotFound { name: String },

    /// A snapshot file could not be parsed as JSON
    #[error("Snapshot {name} is malformed: {reason}")]
    MalformedSnapshot { name: String, reason: String },

    /// The schema file is missing, unreadable or does not compile
    #[error("Schema unavailable at {path}: {reason}")]
    SchemaUnavailable { path: String, reason: String },

    /// The candidate payload was rejected by the Validation Gate
    #[error("Candidate rejected with {fault_count} validation faults")]
    ValidationFailed { fault_count: usize },

    /// An Enricher or Renderer step failed
    #[error("Rebuild step {step} failed: {reason}")]
    RebuildFailed { step: String, reason: String },

    /// Schedule configuration cannot be turned into a trigger
    #[error("Invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    /// Credential missing or wrong
    #[error("unauthorized")]
    Unauthorised,
}

impl From<TrailError> for ExError {
    fn from(err: TrailError) -> Self {
        let message = err.to_string();
        match err {
            TrailError::FetchFailed { .. } => ExError::new(ExErrorKind::Acquisition)
                .with_op("fetch")
                .with_message(message),

            TrailError::FetchTimedOut { .. } => ExError::new(ExErrorKind::Timeout)
                .with_op("fetch")
                .with_message(message),

            TrailError::RunTimedOut { .. } => ExError::new(ExErrorKind::Timeout)
                .with_op("refresh")
                .with_message(message),

            TrailError::RefreshInProgress => ExError::new(ExErrorKind::Concurrency)
                .with_op("acquire_gate")
                .with_message(message),

            TrailError::SnapshotNotFound { name } => ExError::new(ExErrorKind::NotFound)
                .with_op("find_snapshot")
                .with_snapshot(name)
                .with_message("snapshot_not_found"),

            TrailError::MalformedSnapshot { name, .. } => {
                ExError::new(ExErrorKind::Serialization)
                    .with_op("read_snapshot")
                    .with_snapshot(name)
                    .with_message(message)
            }

            TrailError::SchemaUnavailable { .. } => ExError::new(ExErrorKind::Config)
                .with_op("load_schema")
                .with_message(message),

            TrailError::ValidationFailed { .. } => ExError::new(ExErrorKind::ValidationFailed)
                .with_op("validate")
                .with_message(message),

            TrailError::RebuildFailed { step, .. } => ExError::new(ExErrorKind::Rebuild)
                .with_op(step)
                .with_message(message),

            TrailError::InvalidSchedule { .. } => ExError::new(ExErrorKind::Config)
                .with_op("schedule")
                .with_message(message),

            TrailError::Unauthorised => ExError::new(ExErrorKind::Unauthorised)
                .with_op("authorize")
                .with_message(message),
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_kind_codes() {
        let cases = [
            (ExErrorKind::Acquisition, "ERR_ACQUISITION"),
            (ExErrorKind::ValidationFailed, "ERR_VALIDATION_FAILED"),
            (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
            (ExErrorKind::Rebuild, "ERR_REBUILD"),
            (ExErrorKind::Concurrency, "ERR_CONCURRENCY"),
            (ExErrorKind::Unauthorised, "ERR_UNAUTHORISED"),
        ];
        for (kind, code) in cases {
            assert_eq!(kind.code(), code);
        }
    }

    #[test]
    fn test_rejected_candidate_maps_to_validation_failed() {
        let err = ExError::from(TrailError::ValidationFailed { fault_count: 3 });
        assert_eq!(err.kind(), ExErrorKind::ValidationFailed);
        assert_eq!(err.op(), Some("validate"));
        assert!(err.message().contains("3 validation faults"));
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::Persistence)
            .with_op("promote")
            .with_snapshot("trails_x.json")
            .with_message("rename failed");
        let s = err.to_string();
        assert!(s.starts_with("[ERR_PERSISTENCE]"));
        assert!(s.contains("'promote'"));
        assert!(s.contains("rename failed"));
        assert!(s.contains("trails_x.json"));
    }

    #[test]
    fn test_std_error_source_chain() {
        use std::error::Error;
        let inner = ExError::new(ExErrorKind::Io).with_message("disk full");
        let outer = ExError::new(ExErrorKind::Persistence).with_source(inner);
        let src = outer.source().unwrap();
        assert!(src.to_string().contains("disk full"));
    }
}
