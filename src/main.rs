mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Cli;
use colored::*;
use log::{error, info, warn};
use proxy_downloader::{
    parser, BatchRunner, BatchSummary, DownloadEngine, DownloadResult, ProxyPool, ProxySource,
    ReqwestTransport, UserAgentPool,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting proxy downloader");

    let cli = Cli::parse();
    let config = cli.download_config()?;
    info!(
        "Proxy usage: {}, delay: {:?}..{:?}",
        config.use_proxy,
        config.delay.min(),
        config.delay.max()
    );

    let urls = parser::read_urls(&cli.url_file)
        .await
        .with_context(|| format!("Failed to read URL list {}", cli.url_file.display()))?;

    tokio::fs::create_dir_all(&cli.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create download directory {}",
                cli.output_dir.display()
            )
        })?;

    let proxies: Arc<dyn ProxySource> = if config.use_proxy {
        let pool = ProxyPool::load(&cli.proxy_file).await.with_context(|| {
            format!("Failed to load proxy list {}", cli.proxy_file.display())
        })?;
        if pool.is_empty().await {
            warn!(
                "Proxy list {} is empty; every download will fail",
                cli.proxy_file.display()
            );
        }
        Arc::new(pool)
    } else {
        Arc::new(ProxyPool::new(Vec::new()))
    };

    let identities = match &cli.user_agents {
        Some(path) => UserAgentPool::load(path)
            .await
            .with_context(|| format!("Failed to load user agents {}", path.display()))?,
        None => UserAgentPool::default(),
    };

    let transport = ReqwestTransport::new(&config).context("Failed to build HTTP client")?;
    let delay = config.delay;
    let engine = DownloadEngine::new(config, Arc::new(transport), proxies, Arc::new(identities));
    let runner = BatchRunner::new(engine, delay);

    let summary = runner.run(&urls, &cli.output_dir).await;

    if let Some(report) = &cli.report {
        if let Err(e) = BatchRunner::write_report(&summary, report).await {
            error!("Failed to write report {}: {}", report.display(), e);
        }
    }

    print_summary(&summary);

    if summary.failed > 0 {
        error!("{} downloads failed", summary.failed);
        bail!("{} of {} downloads failed", summary.failed, summary.total);
    }
    println!("\n{}", "All downloads completed successfully".green());
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!("\n{}", "Download Summary:".bold());
    println!("Total URLs processed: {}", summary.total);
    println!(
        "Successfully downloaded: {}",
        summary.succeeded.to_string().green()
    );
    println!("Failed downloads: {}", summary.failed.to_string().red());
    println!("Total duration: {:.2?}", summary.total_duration);

    if summary.failed > 0 {
        println!("\n{}", "Failed Downloads:".red().bold());
        for report in &summary.reports {
            if let DownloadResult::Failure { reason, attempts } = &report.result {
                println!(
                    "✗ {} - {} ({} attempts)",
                    report.url.red(),
                    reason,
                    attempts.len()
                );
            }
        }
    }
}
