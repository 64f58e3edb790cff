pub mod batch;
pub mod config;
pub mod delay;
pub mod downloader;
pub mod error;
pub mod filename;
pub mod identity;
pub mod parser;
pub mod proxy;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use batch::BatchRunner;
pub use config::{DownloadConfig, ProxyCredentials};
pub use delay::{DelayRange, Pause, Sleep};
pub use downloader::DownloadEngine;
pub use error::DownloaderError;
pub use filename::filename_from_url;
pub use identity::{IdentitySource, UserAgentPool};
pub use proxy::{ProxyEndpoint, ProxyPool, ProxySource};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
pub use types::{
    Attempt, AttemptOutcome, BatchSummary, DownloadReport, DownloadRequest, DownloadResult,
    FailureReason,
};
