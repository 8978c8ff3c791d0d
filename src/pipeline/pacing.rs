// src/pipeline/pacing.rs

//! Randomized pauses between targets.

use std::time::Duration;

use rand::Rng;

use crate::error::{AppError, Result};
use crate::models::PacingConfig;

/// Uniform random delay in `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self> {
        let min = delay_bound("min_delay_secs", min_secs)?;
        let max = delay_bound("max_delay_secs", max_secs)?;
        if min > max {
            return Err(AppError::validation(format!(
                "pacing min_delay_secs ({min_secs}) exceeds max_delay_secs ({max_secs})"
            )));
        }
        Ok(Self { min, max })
    }

    /// Always waits exactly `delay`.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    /// Never waits.
    pub fn disabled() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn from_config(config: &PacingConfig) -> Result<Self> {
        Self::new(config.min_delay_secs, config.max_delay_secs)
    }

    /// Draw the next delay.
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rand::rng().random_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Sleep for a freshly drawn delay and return it.
    pub async fn pause(&self) -> Duration {
        let delay = self.next_delay();
        if !delay.is_zero() {
            log::info!("Waiting {:.1}s before next target", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

/// A configured bound as a `Duration`; rejects negative, non-finite and overflowing values.
fn delay_bound(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| {
        AppError::validation(format!("pacing {name} ({secs}) is not a valid delay: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_within_bounds() {
        let pacer = Pacer::new(10.0, 20.0).unwrap();
        for _ in 0..200 {
            let delay = pacer.next_delay();
            assert!(delay >= Duration::from_secs(10), "{delay:?}");
            assert!(delay <= Duration::from_secs(20), "{delay:?}");
        }
    }

    #[test]
    fn test_equal_bounds_are_fixed() {
        let pacer = Pacer::new(2.5, 2.5).unwrap();
        assert_eq!(pacer.next_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn test_rejects_bad_bounds() {
        assert!(Pacer::new(20.0, 10.0).is_err());
        assert!(Pacer::new(-1.0, 10.0).is_err());
        assert!(Pacer::new(0.0, f64::INFINITY).is_err());
        assert!(Pacer::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_rejects_bounds_beyond_duration_range() {
        assert!(Pacer::new(10.0, 1e30).is_err());
        assert!(Pacer::new(1e30, 1e30).is_err());
        assert!(Pacer::new(0.0, 86_400.0).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_advances_clock() {
        let start = tokio::time::Instant::now();
        let delay = Pacer::fixed(Duration::from_secs(7)).pause().await;
        assert_eq!(delay, Duration::from_secs(7));
        assert!(start.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_pause_is_instant() {
        let start = tokio::time::Instant::now();
        Pacer::disabled().pause().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
