use crate::error::DownloaderError;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Inclusive bounds for the randomized pauses between attempts and between downloads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Result<Self, DownloaderError> {
        if min > max {
            return Err(DownloaderError::ConfigError(format!(
                "minimum delay {:?} is greater than maximum delay {:?}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn from_secs(min: f64, max: f64) -> Result<Self, DownloaderError> {
        for secs in [min, max] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(DownloaderError::ConfigError(format!(
                    "delay must be a non-negative number of seconds, got {}",
                    secs
                )));
            }
        }
        Self::new(Duration::from_secs_f64(min), Duration::from_secs_f64(max))
    }

    /// Const constructor for compiled-in ranges; inverted bounds fail const evaluation.
    pub(crate) const fn from_bounds(min: Duration, max: Duration) -> Self {
        assert!(
            min.as_nanos() <= max.as_nanos(),
            "minimum delay is greater than maximum delay"
        );
        Self { min, max }
    }

    pub const fn zero() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draws a duration uniformly from `[min, max]`.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

pub struct Sleep;

#[async_trait]
impl Pause for Sleep {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_stays_within_bounds() {
        let range = DelayRange::from_secs(0.5, 1.5).unwrap();
        for _ in 0..200 {
            let d = range.sample();
            assert!(d >= Duration::from_millis(500), "{:?} below minimum", d);
            assert!(d <= Duration::from_millis(1500), "{:?} above maximum", d);
        }
    }

    #[test]
    fn equal_bounds_yield_fixed_delay() {
        let range = DelayRange::from_secs(2.0, 2.0).unwrap();
        assert_eq!(range.sample(), Duration::from_secs(2));
        assert_eq!(DelayRange::zero().sample(), Duration::ZERO);
    }

    #[test]
    fn rejects_inverted_or_negative_bounds() {
        assert!(matches!(
            DelayRange::from_secs(10.0, 5.0),
            Err(DownloaderError::ConfigError(_))
        ));
        assert!(DelayRange::from_secs(-1.0, 5.0).is_err());
        assert!(DelayRange::from_secs(0.0, f64::NAN).is_err());
    }

    #[test]
    #[should_panic(expected = "minimum delay is greater than maximum delay")]
    fn const_constructor_rejects_inverted_bounds() {
        DelayRange::from_bounds(Duration::from_secs(2), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_waits_for_the_requested_duration() {
        let start = tokio::time::Instant::now();
        Sleep.pause(Duration::from_secs(3)).await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
