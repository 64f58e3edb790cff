use crate::proxy::ProxyEndpoint;
use crate::transport::TransportError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub target_dir: PathBuf,
    pub filename: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, target_dir: impl AsRef<Path>) -> Self {
        Self {
            url: url.into(),
            target_dir: target_dir.as_ref().to_path_buf(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    #[error("downloaded {bytes} bytes")]
    Success { bytes: u64 },

    #[error("HTTP error {0}")]
    HttpError(u16),

    #[error("{0}")]
    TransportError(TransportError),

    #[error("file too large: {declared} bytes (limit: {limit} bytes)")]
    SizeExceeded { declared: u64, limit: u64 },

    #[error("IO error: {0}")]
    IoError(String),
}

#[derive(Debug, Clone)]
pub struct Attempt {
    pub number: u32,
    pub proxy: Option<ProxyEndpoint>,
    pub outcome: AttemptOutcome,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("file too large: {declared} bytes (limit: {limit} bytes)")]
    SizeExceeded { declared: u64, limit: u64 },

    #[error("retries exhausted, last error: {0}")]
    Exhausted(AttemptOutcome),

    #[error("no proxy available")]
    NoProxyAvailable,

    #[error("IO error: {0}")]
    Io(String),
}

#[derive(Debug, Clone)]
pub enum DownloadResult {
    /// An empty attempt list means the file was already present.
    Success { path: PathBuf, attempts: Vec<Attempt> },
    Failure { reason: FailureReason, attempts: Vec<Attempt> },
}

impl DownloadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadResult::Success { .. })
    }

    pub fn attempts(&self) -> &[Attempt] {
        match self {
            DownloadResult::Success { attempts, .. } | DownloadResult::Failure { attempts, .. } => {
                attempts
            }
        }
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.attempts()
            .iter()
            .map(|a| match a.outcome {
                AttemptOutcome::Success { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }
}

#[derive(Debug)]
pub struct DownloadReport {
    pub url: String,
    pub result: DownloadResult,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_duration: Duration,
    pub reports: Vec<DownloadReport>,
}

impl BatchSummary {
    pub fn from_reports(reports: Vec<DownloadReport>, total_duration: Duration) -> Self {
        let total = reports.len();
        let succeeded = reports.iter().filter(|r| r.result.is_success()).count();
        Self {
            total,
            succeeded,
            failed: total - succeeded,
            total_duration,
            reports,
        }
    }
}
