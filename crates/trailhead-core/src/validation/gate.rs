use crate::errors::{ExError, Result, TrailError};
use crate::model::TrailDataset;
use chrono::DateTime;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Default schema installed next to a fresh data file
pub const BUNDLED_SCHEMA: &str = include_str!("schema.trails.json");

/// One field-level violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFault {
    /// JSON pointer of the offending location (`""` is the document root)
    pub path: String,
    pub message: String,
}

impl ValidationFault {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of running the gate over a candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub faults: Vec<ValidationFault>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn fault_count(&self) -> usize {
        self.faults.len()
    }

    fn push_unless_reported(&mut self, fault: ValidationFault) {
        if !self.faults.iter().any(|f| f.path == fault.path) {
            self.faults.push(fault);
        }
    }
}

/// Compiled schema plus the dataset rules layered on top of it
pub struct Validator {
    schema: JSONSchema,
    origin: String,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Compile a schema document
    pub fn from_schema(schema: &Value, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let compiled = JSONSchema::compile(schema).map_err(|e| {
            ExError::from(TrailError::SchemaUnavailable {
                path: origin.clone(),
                reason: e.to_string(),
            })
        })?;
        Ok(Self {
            schema: compiled,
            origin,
        })
    }

    /// Load and compile the schema stored at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| {
            ExError::from(TrailError::SchemaUnavailable {
                path: path.display().to_string(),
                reason,
            })
        };
        let raw = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let schema: Value = serde_json::from_str(&raw).map_err(|e| unavailable(e.to_string()))?;
        Self::from_schema(&schema, path.display().to_string())
    }

    /// Validator for the schema shipped with this crate
    pub fn bundled() -> Result<Self> {
        let schema: Value = serde_json::from_str(BUNDLED_SCHEMA)?;
        Self::from_schema(&schema, "bundled")
    }

    /// Where the schema came from (file path or `bundled`)
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Check a candidate and collect every violation
    pub fn validate(&self, candidate: &Value) -> ValidationReport {
        let mut report = ValidationReport::default();

        if let Err(errors) = self.schema.validate(candidate) {
            for error in errors {
                report
                    .faults
                    .push(ValidationFault::new(error.instance_path.to_string(), error.to_string()));
            }
        }

        check_date_times(candidate, &mut report);
        check_unique_codes(candidate, &mut report);
        report
    }

    /// Validate and, on success, lift the candidate into the typed dataset
    ///
    /// A schema that is looser than the typed model cannot smuggle a payload
    /// through: a candidate that passes the schema but does not deserialize is
    /// rejected with a root-level fault.
    pub fn admit(&self, candidate: &Value) -> std::result::Result<TrailDataset, ValidationReport> {
        let mut report = self.validate(candidate);
        if !report.is_ok() {
            return Err(report);
        }
        match TrailDataset::deserialize(candidate) {
            Ok(dataset) => Ok(dataset),
            Err(e) => {
                report.faults.push(ValidationFault::new("", e.to_string()));
                Err(report)
            }
        }
    }
}

fn check_date_time(value: Option<&Value>, path: String, report: &mut ValidationReport) {
    if let Some(Value::String(s)) = value {
        if DateTime::parse_from_rfc3339(s).is_err() {
            report.push_unless_reported(ValidationFault::new(
                path,
                format!("\"{}\" is not a \"date-time\"", s),
            ));
        }
    }
}

fn check_date_times(candidate: &Value, report: &mut ValidationReport) {
    check_date_time(candidate.get("generated_at"), "/generated_at".into(), report);

    if let Some(Value::Array(sources)) = candidate.get("sources") {
        for (i, source) in sources.iter().enumerate() {
            check_date_time(
                source.get("fetched_at"),
                format!("/sources/{}/fetched_at", i),
                report,
            );
        }
    }
}

fn check_unique_codes(candidate: &Value, report: &mut ValidationReport) {
    let Some(Value::Array(groups)) = candidate.get("island_groups") else {
        return;
    };
    for (g, group) in groups.iter().enumerate() {
        let Some(Value::Array(trails)) = group.get("trails") else {
            continue;
        };
        let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
        for (t, trail) in trails.iter().enumerate() {
            let Some(code) = trail.get("code").and_then(Value::as_str) else {
                continue;
            };
            if let Some(first) = first_seen.get(code) {
                report.faults.push(ValidationFault::new(
                    format!("/island_groups/{}/trails/{}/code", g, t),
                    format!("duplicate code \"{}\" (first at index {})", code, first),
                ));
            } else {
                first_seen.insert(code, t);
            }
        }
    }
}
