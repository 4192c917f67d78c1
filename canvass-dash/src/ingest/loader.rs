//! Address source chain
//!
//! Sources are tried in priority order: local files, remote candidate
//! URLs, an uploaded file, then the synthetic generator. A failing tier is
//! logged and skipped; the synthetic tier cannot fail, so a load always
//! yields records.

use canvass_common::config::DataConfig;
use canvass_common::{AddressRecord, Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::payload::parse_payload;
use super::sample::generate_sample_addresses;
use super::SourceError;

const USER_AGENT: &str = concat!("canvass-dash/", env!("CARGO_PKG_VERSION"));

/// Which tier of the chain produced the records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Local,
    Remote,
    Upload,
    Synthetic,
}

/// Winning source: tier plus path, URL or file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedFrom {
    pub kind: SourceKind,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Status message about one source attempt, surfaced to the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct LoadNotice {
    pub level: NoticeLevel,
    pub source: String,
    pub message: String,
}

/// File supplied by the volunteer
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Result of running the chain
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub records: Vec<AddressRecord>,
    pub loaded_from: LoadedFrom,
    pub notices: Vec<LoadNotice>,
    pub loaded_at: DateTime<Utc>,
}

/// Address loader holding the configured source chain
pub struct AddressLoader {
    http_client: reqwest::Client,
    local_paths: Vec<PathBuf>,
    remote_urls: Vec<String>,
    sample_per_precinct: usize,
}

impl AddressLoader {
    /// Build a loader from the `[data]` config section
    pub fn new(config: &DataConfig) -> Result<Self> {
        Self::with_sources(
            config.local_paths.clone(),
            config.remote_urls(),
            Duration::from_secs(config.fetch_timeout_secs),
            config.sample_per_precinct,
        )
    }

    pub fn with_sources(
        local_paths: Vec<PathBuf>,
        remote_urls: Vec<String>,
        fetch_timeout: Duration,
        sample_per_precinct: usize,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http_client,
            local_paths,
            remote_urls,
            sample_per_precinct: sample_per_precinct.max(1),
        })
    }

    /// Run the chain. `upload` is tried after the configured sources.
    pub async fn load(&self, upload: Option<&Upload>) -> LoadOutcome {
        let mut notices = Vec::new();

        for path in &self.local_paths {
            let location = path.display().to_string();
            let attempt = self.read_local(path).await;
            if let Some(records) = settle(attempt, &location, &mut notices) {
                return finish(records, SourceKind::Local, location, notices);
            }
        }

        for url in &self.remote_urls {
            let attempt = self.fetch_remote(url).await;
            if let Some(records) = settle(attempt, url, &mut notices) {
                return finish(records, SourceKind::Remote, url.clone(), notices);
            }
        }

        if let Some(upload) = upload {
            let attempt = decode_upload(upload);
            if let Some(records) = settle(attempt, &upload.filename, &mut notices) {
                return finish(records, SourceKind::Upload, upload.filename.clone(), notices);
            }
        }

        warn!("No address source succeeded, using sample data");
        notices.push(LoadNotice {
            level: NoticeLevel::Error,
            source: "synthetic".to_string(),
            message: "No address files loaded. Using sample data.".to_string(),
        });
        let records = generate_sample_addresses(self.sample_per_precinct);
        finish(records, SourceKind::Synthetic, "synthetic".to_string(), notices)
    }

    async fn read_local(&self, path: &Path) -> std::result::Result<Vec<AddressRecord>, SourceError> {
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SourceError::Unreachable(e.to_string()))?;
        parse_payload(&body)
    }

    async fn fetch_remote(&self, url: &str) -> std::result::Result<Vec<AddressRecord>, SourceError> {
        tracing::debug!(url = %url, "Fetching address payload");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unreachable(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Unreachable(e.to_string()))?;
        parse_payload(&body)
    }
}

fn decode_upload(upload: &Upload) -> std::result::Result<Vec<AddressRecord>, SourceError> {
    let body = std::str::from_utf8(&upload.bytes)
        .map_err(|e| SourceError::Malformed(format!("upload is not UTF-8: {}", e)))?;
    parse_payload(body)
}

/// Record the attempt as a notice; hand back the records on success
fn settle(
    attempt: std::result::Result<Vec<AddressRecord>, SourceError>,
    location: &str,
    notices: &mut Vec<LoadNotice>,
) -> Option<Vec<AddressRecord>> {
    match attempt {
        Ok(records) => {
            info!(source = %location, count = records.len(), "Loaded addresses");
            notices.push(LoadNotice {
                level: NoticeLevel::Info,
                source: location.to_string(),
                message: format!("Loaded {} addresses", records.len()),
            });
            Some(records)
        }
        Err(e) => {
            warn!(source = %location, error = %e, "Address source failed");
            notices.push(LoadNotice {
                level: NoticeLevel::Warning,
                source: location.to_string(),
                message: e.to_string(),
            });
            None
        }
    }
}

fn finish(
    records: Vec<AddressRecord>,
    kind: SourceKind,
    location: String,
    notices: Vec<LoadNotice>,
) -> LoadOutcome {
    LoadOutcome {
        records,
        loaded_from: LoadedFrom { kind, location },
        notices,
        loaded_at: Utc::now(),
    }
}
