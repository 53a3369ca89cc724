//! Service configuration
//!
//! Layered with the `config` crate, lowest precedence first:
//! built-in defaults, `trailhead.toml` (or an explicit file), the legacy
//! `ADMIN_TOKEN` / `PORT` variables, then `TRAILHEAD_*` variables
//! (`TRAILHEAD_SCHEDULE__TIME` for nested keys).

use async_trait::async_trait;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use trailhead_core::errors::{ExError, ExErrorKind, Result, TrailError};
use trailhead_core::logging_facility::Profile;
use trailhead_core_types::Sensitive;
use trailhead_engine::{
    Fetcher, FileFetcher, HttpJsonFetcher, NoopEnricher, NoopRenderer, Orchestrator,
    OrchestratorConfig,
};
use trailhead_store::{DataLayout, SnapshotStore};

const ENV_PREFIX: &str = "TRAILHEAD";
const LEGACY_VARS: [&str; 2] = ["ADMIN_TOKEN", "PORT"];

/// Daily trigger
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub enabled: bool,
    /// Local wall-clock time, `HH:MM`
    pub time: String,
    /// IANA zone name
    pub timezone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub data_file: PathBuf,
    pub bind: String,
    pub port: u16,
    #[serde(default)]
    pub admin_token: Option<Sensitive<String>>,
    /// `http(s)://` URL or local path of the candidate payload
    #[serde(default)]
    pub source_url: Option<String>,
    pub fetch_timeout_secs: u64,
    pub run_timeout_secs: u64,
    pub retention: usize,
    pub schedule: ScheduleConfig,
    pub log_profile: Profile,
}

fn config_error(err: ConfigError) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_config")
        .with_message(err.to_string())
}

impl ServiceConfig {
    /// Load from the process environment
    ///
    /// `file` must exist when given; otherwise `./trailhead.toml` is optional.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_sources(file, std::env::vars().collect())
    }

    /// Load with an explicit variable map instead of the process environment
    pub fn from_sources(file: Option<&Path>, env: HashMap<String, String>) -> Result<Self> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name("trailhead").required(false),
        };
        let legacy: HashMap<String, String> = env
            .iter()
            .filter(|(k, _)| LEGACY_VARS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let config = Config::builder()
            .set_default("data_file", "public/data/trails.json")
            .and_then(|b| b.set_default("bind", "0.0.0.0"))
            .and_then(|b| b.set_default("port", 3000_i64))
            .and_then(|b| b.set_default("fetch_timeout_secs", 20_i64))
            .and_then(|b| b.set_default("run_timeout_secs", 300_i64))
            .and_then(|b| b.set_default("retention", 30_i64))
            .and_then(|b| b.set_default("schedule.enabled", true))
            .and_then(|b| b.set_default("schedule.time", "06:10"))
            .and_then(|b| b.set_default("schedule.timezone", "Atlantic/Madeira"))
            .and_then(|b| b.set_default("log_profile", "development"))
            .map_err(config_error)?
            .add_source(file_source)
            .add_source(Environment::default().source(Some(legacy)))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(env)),
            )
            .build()
            .map_err(config_error)?;

        let mut loaded: ServiceConfig = config.try_deserialize().map_err(config_error)?;
        loaded.admin_token = loaded.admin_token.filter(|t| !t.expose().is_empty());
        if loaded.retention == 0 {
            return Err(ExError::new(ExErrorKind::Config)
                .with_op("load_config")
                .with_message("retention must be at least 1"));
        }
        Ok(loaded)
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            retention: self.retention,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            run_timeout: Duration::from_secs(self.run_timeout_secs),
        }
    }

    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(DataLayout::new(&self.data_file))
    }

    /// Fetcher for `source_url`
    pub fn fetcher(&self) -> Result<Arc<dyn Fetcher>> {
        match self.source_url.as_deref() {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(Arc::new(
                HttpJsonFetcher::new(url, Duration::from_secs(self.fetch_timeout_secs))?,
            )),
            Some(path) => Ok(Arc::new(FileFetcher::new(
                path.strip_prefix("file://").unwrap_or(path),
            ))),
            None => Ok(Arc::new(MissingSource)),
        }
    }

    /// Orchestrator over the configured layout with the default collaborators
    pub fn build_orchestrator(&self) -> Result<Orchestrator> {
        Ok(self.build_orchestrator_with(self.fetcher()?))
    }

    pub fn build_orchestrator_with(&self, fetcher: Arc<dyn Fetcher>) -> Orchestrator {
        Orchestrator::new(
            self.snapshot_store(),
            fetcher,
            Arc::new(NoopEnricher),
            Arc::new(NoopRenderer),
            self.orchestrator_config(),
        )
    }
}

/// Stand-in when no `source_url` is configured: every run fails to acquire
/// and the last good dataset keeps being served
struct MissingSource;

#[async_trait]
impl Fetcher for MissingSource {
    fn source_name(&self) -> &str {
        "unconfigured"
    }

    async fn fetch(&self) -> Result<Value> {
        Err(TrailError::FetchFailed {
            source_name: "unconfigured".to_string(),
            reason: "source_url is not set".to_string(),
        }
        .into())
    }
}
