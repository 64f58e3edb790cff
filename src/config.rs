use crate::delay::DelayRange;
use crate::error::DownloaderError;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;
pub const DEFAULT_MIN_DELAY_SECS: f64 = 5.0;
pub const DEFAULT_MAX_DELAY_SECS: f64 = 15.0;
pub const DEFAULT_DELAY: DelayRange =
    DelayRange::from_bounds(Duration::from_secs(5), Duration::from_secs(15));

/// Size of each write to the destination file.
pub const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub use_proxy: bool,
    pub max_retries: u32,
    pub timeout: Duration,
    /// Upper bound on a file's size in bytes; `None` disables the check.
    pub max_file_size: Option<u64>,
    pub delay: DelayRange,
    pub proxy_credentials: Option<ProxyCredentials>,
    pub show_progress: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            use_proxy: true,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            max_file_size: Some(DEFAULT_MAX_FILE_SIZE),
            delay: DEFAULT_DELAY,
            proxy_credentials: None,
            show_progress: true,
        }
    }
}

impl DownloadConfig {
    pub fn validate(&self) -> Result<(), DownloaderError> {
        if self.max_retries == 0 {
            return Err(DownloaderError::ConfigError(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(DownloaderError::ConfigError(
                "timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_compiled_in_values() {
        let config = DownloadConfig::default();
        assert!(config.use_proxy);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_file_size, Some(500 * 1024 * 1024));
        assert_eq!(config.delay.min(), Duration::from_secs(5));
        assert_eq!(config.delay.max(), Duration::from_secs(15));
        assert!(config.proxy_credentials.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_delay_matches_cli_defaults() {
        assert_eq!(
            DEFAULT_DELAY,
            DelayRange::from_secs(DEFAULT_MIN_DELAY_SECS, DEFAULT_MAX_DELAY_SECS).unwrap()
        );
    }

    #[test]
    fn zero_retries_is_rejected() {
        let config = DownloadConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DownloaderError::ConfigError(_))
        ));
    }
}
