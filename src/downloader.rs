use crate::config::{DownloadConfig, CHUNK_SIZE};
use crate::delay::{Pause, Sleep};
use crate::filename::filename_from_url;
use crate::identity::IdentitySource;
use crate::proxy::{ProxyEndpoint, ProxySource};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::types::{Attempt, AttemptOutcome, DownloadRequest, DownloadResult, FailureReason};
use futures::{StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio_util::io::{ReaderStream, StreamReader};

const MIB: f64 = 1_048_576.0;

/// Downloads one URL at a time with proxy rotation, retries and size limits.
pub struct DownloadEngine {
    config: DownloadConfig,
    transport: Arc<dyn Transport>,
    proxies: Arc<dyn ProxySource>,
    identities: Arc<dyn IdentitySource>,
    pause: Arc<dyn Pause>,
}

impl DownloadEngine {
    pub fn new(
        config: DownloadConfig,
        transport: Arc<dyn Transport>,
        proxies: Arc<dyn ProxySource>,
        identities: Arc<dyn IdentitySource>,
    ) -> Self {
        Self {
            config,
            transport,
            proxies,
            identities,
            pause: Arc::new(Sleep),
        }
    }

    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub async fn download(&self, request: &DownloadRequest) -> DownloadResult {
        let filename = request
            .filename
            .clone()
            .unwrap_or_else(|| filename_from_url(&request.url));
        let path = request.target_dir.join(&filename);

        if is_regular_file(&path).await {
            info!("File already exists: {}", path.display());
            return DownloadResult::Success {
                path,
                attempts: Vec::new(),
            };
        }

        if let Err(e) = fs::create_dir_all(&request.target_dir).await {
            error!(
                "Cannot create download directory {}: {}",
                request.target_dir.display(),
                e
            );
            return DownloadResult::Failure {
                reason: FailureReason::Io(e.to_string()),
                attempts: Vec::new(),
            };
        }

        let user_agent = self.identities.next();
        let max_retries = self.config.max_retries.max(1);
        let mut attempts: Vec<Attempt> = Vec::new();

        let mut next_proxy = match self.acquire_proxy(&request.url).await {
            Ok(proxy) => proxy,
            Err(reason) => return DownloadResult::Failure { reason, attempts },
        };

        for number in 1..=max_retries {
            // Bound to this attempt only; the next one is acquired before backing off.
            let proxy = next_proxy.take();

            let outcome = self
                .attempt(&request.url, &path, &user_agent, proxy.as_ref())
                .await;

            let terminal = match &outcome {
                AttemptOutcome::Success { bytes } => {
                    info!("Successfully downloaded: {} ({} bytes)", filename, bytes);
                    None
                }
                AttemptOutcome::SizeExceeded { declared, limit } => {
                    warn!(
                        "File too large: {:.1} MB (limit: {:.1} MB)",
                        *declared as f64 / MIB,
                        *limit as f64 / MIB
                    );
                    Some(FailureReason::SizeExceeded {
                        declared: *declared,
                        limit: *limit,
                    })
                }
                AttemptOutcome::IoError(message) => {
                    error!("Cannot write {}: {}", path.display(), message);
                    Some(FailureReason::Io(message.clone()))
                }
                AttemptOutcome::TransportError(e) => {
                    warn!("Error downloading {}: {}", request.url, e);
                    if let Some(endpoint) = &proxy {
                        self.evict(endpoint).await;
                    }
                    None
                }
                AttemptOutcome::HttpError(status) => {
                    warn!("HTTP Error {} for {}", status, request.url);
                    None
                }
            };

            let succeeded = matches!(outcome, AttemptOutcome::Success { .. });
            attempts.push(Attempt {
                number,
                proxy,
                outcome,
            });

            if succeeded {
                return DownloadResult::Success { path, attempts };
            }
            if let Some(reason) = terminal {
                return DownloadResult::Failure { reason, attempts };
            }

            if number < max_retries {
                next_proxy = match self.acquire_proxy(&request.url).await {
                    Ok(proxy) => proxy,
                    Err(reason) => return DownloadResult::Failure { reason, attempts },
                };
                let delay = self.config.delay.sample();
                info!(
                    "Retrying in {:.1} seconds... (Attempt {}/{})",
                    delay.as_secs_f64(),
                    number + 1,
                    max_retries
                );
                self.pause.pause(delay).await;
            }
        }

        error!(
            "Failed to download {} after {} attempts",
            request.url, max_retries
        );
        let last = attempts
            .last()
            .map(|a| a.outcome.clone())
            .unwrap_or_else(|| AttemptOutcome::IoError("no attempt was made".to_string()));
        DownloadResult::Failure {
            reason: FailureReason::Exhausted(last),
            attempts,
        }
    }

    /// `Ok(None)` in direct mode; an empty pool is terminal.
    async fn acquire_proxy(&self, url: &str) -> Result<Option<ProxyEndpoint>, FailureReason> {
        if !self.config.use_proxy {
            return Ok(None);
        }
        match self.proxies.next().await {
            Some(endpoint) => Ok(Some(endpoint)),
            None => {
                error!("No proxy available for {}", url);
                Err(FailureReason::NoProxyAvailable)
            }
        }
    }

    async fn evict(&self, endpoint: &ProxyEndpoint) {
        if let Err(e) = self.proxies.evict(endpoint).await {
            error!("Failed to persist eviction of proxy {}: {}", endpoint, e);
        }
    }

    async fn attempt(
        &self,
        url: &str,
        path: &Path,
        user_agent: &str,
        proxy: Option<&ProxyEndpoint>,
    ) -> AttemptOutcome {
        let request = HttpRequest {
            url,
            user_agent,
            proxy,
        };
        let response = match self.transport.get(request).await {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::TransportError(e),
        };

        if response.status != 200 {
            return AttemptOutcome::HttpError(response.status);
        }

        if let (Some(limit), Some(declared)) = (self.config.max_file_size, response.content_length)
        {
            if declared > limit {
                return AttemptOutcome::SizeExceeded { declared, limit };
            }
        }

        self.write_body(response, path).await
    }

    async fn write_body(&self, response: HttpResponse, path: &Path) -> AttemptOutcome {
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => file,
            Err(e) => return AttemptOutcome::IoError(format!("{}: {}", path.display(), e)),
        };

        let pb = self.create_progress_bar(path, response.content_length);
        match self.stream_into(file, response, &pb).await {
            Ok(bytes) => {
                pb.finish();
                AttemptOutcome::Success { bytes }
            }
            Err(outcome) => {
                pb.abandon_with_message("Download failed");
                match fs::remove_file(path).await {
                    Ok(()) => debug!("Removed partial file {}", path.display()),
                    Err(e) => warn!("Cannot remove partial file {}: {}", path.display(), e),
                }
                outcome
            }
        }
    }

    async fn stream_into(
        &self,
        mut file: File,
        response: HttpResponse,
        pb: &ProgressBar,
    ) -> Result<u64, AttemptOutcome> {
        let declared = response.content_length;
        let reader = StreamReader::new(
            response
                .body
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e)),
        );
        let mut chunks = ReaderStream::with_capacity(reader, CHUNK_SIZE);
        let mut downloaded: u64 = 0;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| AttemptOutcome::TransportError(body_error(e)))?;
            downloaded += chunk.len() as u64;

            // Without a declared length the cap is enforced on the bytes actually received.
            if declared.is_none() {
                if let Some(limit) = self.config.max_file_size {
                    if downloaded > limit {
                        return Err(AttemptOutcome::SizeExceeded {
                            declared: downloaded,
                            limit,
                        });
                    }
                }
            }

            file.write_all(&chunk)
                .await
                .map_err(|e| AttemptOutcome::IoError(e.to_string()))?;
            pb.set_position(downloaded);
        }

        file.flush()
            .await
            .map_err(|e| AttemptOutcome::IoError(e.to_string()))?;

        if let Some(expected) = declared {
            if downloaded < expected {
                return Err(AttemptOutcome::TransportError(TransportError::Body(format!(
                    "body ended after {} of {} bytes",
                    downloaded, expected
                ))));
            }
        }

        Ok(downloaded)
    }

    fn create_progress_bar(&self, path: &Path, total: Option<u64>) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = match total {
            Some(len) if len > 0 => {
                let pb = ProgressBar::new(len);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {percent}% {bytes}/{total_bytes} ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                );
                pb
            }
            _ => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} {msg} {bytes} ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb
            }
        };
        pb.set_message(
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string(),
        );
        pb
    }
}

async fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Recovers the transport error that `StreamReader` wrapped into an `io::Error`.
fn body_error(e: io::Error) -> TransportError {
    let message = e.to_string();
    match e
        .into_inner()
        .and_then(|inner| inner.downcast::<TransportError>().ok())
    {
        Some(transport) => *transport,
        None => TransportError::Body(message),
    }
}
