use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// A uniformly sampled wait, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange::new(0.0, 0.0);

    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    pub fn is_valid(&self) -> bool {
        self.min_secs.is_finite()
            && self.max_secs.is_finite()
            && self.min_secs >= 0.0
            && self.max_secs >= self.min_secs
    }

    pub fn sample(&self) -> Duration {
        if !self.is_valid() {
            return Duration::ZERO;
        }
        if self.max_secs == self.min_secs {
            return Duration::from_secs_f64(self.min_secs);
        }
        Duration::from_secs_f64(rand::rng().random_range(self.min_secs..=self.max_secs))
    }
}

/// Waits placed around network calls to stay under the upstream's rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Pacing {
    pub after_success: DelayRange,
    pub after_challenge: DelayRange,
    pub backoff: DelayRange,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_success: DelayRange::new(1.0, 4.0),
            after_challenge: DelayRange::new(10.0, 25.0),
            backoff: DelayRange::new(5.0, 15.0),
        }
    }
}

impl Pacing {
    /// No waiting at all.
    pub fn immediate() -> Self {
        Self {
            after_success: DelayRange::ZERO,
            after_challenge: DelayRange::ZERO,
            backoff: DelayRange::ZERO,
        }
    }

    /// Wait after the failed `attempt` (1-based); grows linearly with the attempt number.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.sample() * attempt
    }

    pub fn is_valid(&self) -> bool {
        self.after_success.is_valid() && self.after_challenge.is_valid() && self.backoff.is_valid()
    }
}

pub(crate) async fn pause(wait: Duration) {
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::{DelayRange, Pacing};
    use std::time::Duration;

    #[test]
    fn test_that_samples_stay_within_the_range() {
        let range = DelayRange::new(1.0, 4.0);
        for _ in 0..200 {
            let wait = range.sample();
            assert!(wait >= Duration::from_secs(1) && wait <= Duration::from_secs(4));
        }
    }

    #[test]
    fn test_that_backoff_grows_with_the_attempt() {
        let pacing = Pacing {
            backoff: DelayRange::new(5.0, 5.0),
            ..Pacing::immediate()
        };
        assert_eq!(pacing.backoff_for(1), Duration::from_secs(5));
        assert_eq!(pacing.backoff_for(3), Duration::from_secs(15));
    }

    #[test]
    fn test_that_invalid_ranges_do_not_wait() {
        assert_eq!(DelayRange::new(3.0, 1.0).sample(), Duration::ZERO);
        assert_eq!(DelayRange::new(-1.0, 1.0).sample(), Duration::ZERO);
        assert!(!Pacing {
            backoff: DelayRange::new(f64::NAN, 1.0),
            ..Pacing::default()
        }
        .is_valid());
    }

    #[test]
    fn test_that_default_pacing_is_valid() {
        assert!(Pacing::default().is_valid());
        assert_eq!(Pacing::immediate().backoff_for(4), Duration::ZERO);
    }
}
