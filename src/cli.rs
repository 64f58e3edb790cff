use clap::Parser;
use proxy_downloader::config::{DEFAULT_MAX_DELAY_SECS, DEFAULT_MIN_DELAY_SECS};
use proxy_downloader::{DelayRange, DownloadConfig, DownloaderError, ProxyCredentials};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Batch file downloader with proxy rotation", long_about = None)]
pub struct Cli {
    /// Text file containing URLs to download, one per line
    pub url_file: PathBuf,

    /// Disable proxy usage
    #[arg(long)]
    pub no_proxy: bool,

    /// Minimum delay between downloads and retries, in seconds
    #[arg(long, default_value_t = DEFAULT_MIN_DELAY_SECS)]
    pub min_delay: f64,

    /// Maximum delay between downloads and retries, in seconds
    #[arg(long, default_value_t = DEFAULT_MAX_DELAY_SECS)]
    pub max_delay: f64,

    /// Output directory for downloaded files
    #[arg(short, long, default_value = "downloads")]
    pub output_dir: PathBuf,

    /// Proxy list, one endpoint per line; failing proxies are removed from it
    #[arg(short, long, default_value = "proxies.txt")]
    pub proxy_file: PathBuf,

    /// User agent list, one per line (optional)
    #[arg(short, long)]
    pub user_agents: Option<PathBuf>,

    /// Username for authenticated proxies
    #[arg(long)]
    pub proxy_username: Option<String>,

    /// Password for authenticated proxies
    #[arg(long, requires = "proxy_username")]
    pub proxy_password: Option<String>,

    /// Write a CSV report of every download to this path
    #[arg(short, long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    pub fn download_config(&self) -> Result<DownloadConfig, DownloaderError> {
        let proxy_credentials = self.proxy_username.as_ref().map(|username| ProxyCredentials {
            username: username.clone(),
            password: self.proxy_password.clone().unwrap_or_default(),
        });

        let config = DownloadConfig {
            use_proxy: !self.no_proxy,
            delay: DelayRange::from_secs(self.min_delay, self.max_delay)?,
            proxy_credentials,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults_keep_proxy_and_delay_settings() {
        let cli = Cli::try_parse_from(["proxy-downloader", "urls.txt"]).unwrap();
        let config = cli.download_config().unwrap();

        assert_eq!(cli.url_file, PathBuf::from("urls.txt"));
        assert_eq!(cli.output_dir, PathBuf::from("downloads"));
        assert!(config.use_proxy);
        assert_eq!(config.delay.min(), Duration::from_secs(5));
        assert_eq!(config.delay.max(), Duration::from_secs(15));
        assert_eq!(config.max_retries, 3);
        assert!(config.proxy_credentials.is_none());
    }

    #[test]
    fn flags_override_proxy_and_delays() {
        let cli = Cli::try_parse_from([
            "proxy-downloader",
            "urls.txt",
            "--no-proxy",
            "--min-delay",
            "0.5",
            "--max-delay",
            "2",
            "--proxy-username",
            "alice",
            "--proxy-password",
            "secret",
        ])
        .unwrap();
        let config = cli.download_config().unwrap();

        assert!(!config.use_proxy);
        assert_eq!(config.delay.min(), Duration::from_millis(500));
        assert_eq!(config.delay.max(), Duration::from_secs(2));
        assert_eq!(
            config.proxy_credentials,
            Some(ProxyCredentials {
                username: "alice".to_string(),
                password: "secret".to_string(),
            })
        );
    }

    #[test]
    fn inverted_delays_are_rejected() {
        let cli = Cli::try_parse_from([
            "proxy-downloader",
            "urls.txt",
            "--min-delay",
            "9",
            "--max-delay",
            "1",
        ])
        .unwrap();
        assert!(cli.download_config().is_err());
    }

    #[test]
    fn url_file_is_required() {
        assert!(Cli::try_parse_from(["proxy-downloader"]).is_err());
    }
}
