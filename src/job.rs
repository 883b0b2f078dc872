//! Job model and the JSON job-list loader.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobLoadError {
    #[error("failed to read job file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse job file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ExecMode {
    /// One address at a time, in order, no delay.
    #[serde(rename = "sync", alias = "sequential")]
    Sequential,
    /// One task per address, launches spaced by the job delay.
    #[serde(rename = "async", alias = "paced")]
    ConcurrentPaced,
}

impl std::fmt::Display for ExecMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecMode::Sequential => write!(f, "sync"),
            ExecMode::ConcurrentPaced => write!(f, "async"),
        }
    }
}

/// A named batch of addresses fetched under one execution mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: String,
    urls: Vec<String>,
    delay: Duration,
    mode: ExecMode,
}

impl Job {
    pub fn new(id: impl Into<String>, urls: Vec<String>, delay: Duration, mode: ExecMode) -> Self {
        Self {
            id: id.into(),
            urls,
            delay,
            mode,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }
}

/// One record of the on-disk job list.
#[derive(Debug, Deserialize)]
struct JobRecord {
    id: String,
    #[serde(default)]
    urls: Vec<String>,
    /// Milliseconds.
    #[serde(default)]
    delay: u64,
    #[serde(default)]
    sync: bool,
    #[serde(default)]
    mode: Option<ExecMode>,
}

impl From<JobRecord> for Job {
    fn from(r: JobRecord) -> Self {
        let mode = r
            .mode
            .unwrap_or(if r.sync { ExecMode::Sequential } else { ExecMode::ConcurrentPaced });
        Job::new(r.id, r.urls, Duration::from_millis(r.delay), mode)
    }
}

/// Decode a JSON array of job records.
pub fn parse_jobs(json: &str) -> Result<Vec<Job>, serde_json::Error> {
    let records: Vec<JobRecord> = serde_json::from_str(json)?;
    Ok(records.into_iter().map(Job::from).collect())
}

/// Read and decode the job list at `path`.
pub fn load_jobs(path: &Path) -> Result<Vec<Job>, JobLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| JobLoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let jobs = parse_jobs(&content).map_err(|source| JobLoadError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), count = jobs.len(), "loaded job list");
    Ok(jobs)
}
