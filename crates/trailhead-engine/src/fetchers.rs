//! Fetchers that ship with the engine
//!
//! Scraping the upstream status document is a separate concern; these fetchers
//! consume a candidate payload that is already JSON.

use crate::collaborators::Fetcher;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use trailhead_core::{ExError, Result, TrailError};

fn fetch_failed(source_name: &str, reason: impl ToString) -> ExError {
    TrailError::FetchFailed {
        source_name: source_name.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// GET a JSON candidate from a URL
#[derive(Debug, Clone)]
pub struct HttpJsonFetcher {
    url: String,
    client: reqwest::Client,
}

impl HttpJsonFetcher {
    /// `timeout` bounds each request; the orchestrator applies its own bound too
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("trailhead/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| fetch_failed(&url, e))?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl Fetcher for HttpJsonFetcher {
    fn source_name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Value> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_failed(&self.url, e))?;
        response
            .json::<Value>()
            .await
            .map_err(|e| fetch_failed(&self.url, e))
    }
}

/// Read a JSON candidate from a local file
#[derive(Debug, Clone)]
pub struct FileFetcher {
    path: PathBuf,
    name: String,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Value> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| fetch_failed(&self.name, e))?;
        serde_json::from_slice(&raw).map_err(|e| fetch_failed(&self.name, e))
    }
}
