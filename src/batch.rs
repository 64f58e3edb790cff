use crate::delay::{DelayRange, Pause, Sleep};
use crate::downloader::DownloadEngine;
use crate::error::DownloaderError;
use crate::filename::filename_from_url;
use crate::types::{BatchSummary, DownloadReport, DownloadRequest, DownloadResult};
use log::info;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

pub struct BatchRunner {
    engine: DownloadEngine,
    delay: DelayRange,
    pause: Arc<dyn Pause>,
}

impl BatchRunner {
    pub fn new(engine: DownloadEngine, delay: DelayRange) -> Self {
        Self {
            engine,
            delay,
            pause: Arc::new(Sleep),
        }
    }

    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    /// Downloads `urls` in order, one at a time. A failed URL never stops the batch.
    pub async fn run(&self, urls: &[String], target_dir: &Path) -> BatchSummary {
        let start_time = Instant::now();
        let total = urls.len();
        info!("Found {} URLs to process", total);

        let mut reports = Vec::with_capacity(total);
        for (i, url) in urls.iter().enumerate() {
            info!("Processing URL {}/{}: {}", i + 1, total, url);

            let started = Instant::now();
            let request = DownloadRequest::new(url.as_str(), target_dir);
            let result = self.engine.download(&request).await;
            reports.push(DownloadReport {
                url: url.clone(),
                result,
                duration: started.elapsed(),
            });

            if i + 1 < total {
                let delay = self.delay.sample();
                info!(
                    "Waiting {:.1} seconds before next download...",
                    delay.as_secs_f64()
                );
                self.pause.pause(delay).await;
            }
        }

        BatchSummary::from_reports(reports, start_time.elapsed())
    }

    pub async fn write_report(summary: &BatchSummary, path: &Path) -> Result<(), DownloaderError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut wtr = csv::WriterBuilder::new().from_path(path)?;

        wtr.write_record([
            "Filename",
            "Status",
            "Attempts",
            "Size (MB)",
            "Duration (s)",
            "URL",
            "Error",
        ])?;

        for report in &summary.reports {
            let (filename, status, error) = match &report.result {
                DownloadResult::Success { path, attempts } => (
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown")
                        .to_string(),
                    if attempts.is_empty() { "Skipped" } else { "Success" },
                    String::new(),
                ),
                DownloadResult::Failure { reason, .. } => (
                    filename_from_url(&report.url),
                    "Failed",
                    reason.to_string(),
                ),
            };
            let size_mb = report.result.bytes_downloaded() as f64 / 1_048_576.0;

            wtr.write_record(&[
                filename,
                status.to_string(),
                report.result.attempts().len().to_string(),
                format!("{:.2}", size_mb),
                format!("{:.2}", report.duration.as_secs_f64()),
                report.url.clone(),
                error,
            ])?;
        }

        wtr.flush()?;
        info!("Wrote download report to {}", path.display());
        Ok(())
    }
}
