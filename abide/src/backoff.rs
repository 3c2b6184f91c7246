use crate::RetryConfig;
use backoff::backoff::Backoff as InnerBackoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::fmt::{Debug, Formatter};
use std::time::Duration;

/// The mutable delay state of a single retry run.
///
/// Thin wrapper around [`ExponentialBackoff`] that starts at the
/// [base delay](RetryConfig::base_delay) and multiplies the delay by the
/// [backoff factor](RetryConfig::backoff_factor) on every step. A factor of
/// `1.0` yields a constant delay. Each delay, jitter included, is capped at
/// the optional [max delay](RetryConfig::max_delay).
///
/// Unlike the inner implementation, this schedule never runs out: the number
/// of attempts, not the elapsed time, bounds a retry run.
///
/// ```
/// use abide::{Backoff, RetryConfig};
/// use std::time::Duration;
///
/// let config = RetryConfig::builder()
///     .with_base_delay(Duration::from_secs(1))
///     .with_backoff_factor(2.0)
///     .build();
/// let mut backoff = Backoff::new(&config);
///
/// assert_eq!(backoff.next(), Duration::from_secs(1));
/// assert_eq!(backoff.next(), Duration::from_secs(2));
/// assert_eq!(backoff.next(), Duration::from_secs(4));
/// ```
pub struct Backoff {
    inner: ExponentialBackoff,
    cap: Duration,
}

impl Backoff {
    /// Builds a new [`Backoff`] based on the given [`RetryConfig`].
    pub fn new(config: impl AsRef<RetryConfig>) -> Self {
        let config = config.as_ref();
        let cap = config.max_delay().unwrap_or(Duration::MAX);
        let inner = ExponentialBackoffBuilder::new()
            .with_initial_interval(config.base_delay())
            .with_max_interval(cap)
            .with_randomization_factor(config.jitter())
            .with_multiplier(config.backoff_factor())
            .with_max_elapsed_time(None)
            .build();

        Self { inner, cap }
    }

    /// Returns the delay to wait before the next attempt, and advances the
    /// schedule.
    pub fn next(&mut self) -> Duration {
        // Without a max elapsed time the inner backoff never gives up. The
        // inner cap applies neither to the first interval nor after jitter.
        self.inner
            .next_backoff()
            .unwrap_or(self.cap)
            .min(self.cap)
    }

    /// Resets this backoff to the base delay.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Debug for Backoff {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backoff")
            .field("current_interval", &self.inner.current_interval)
            .field("multiplier", &self.inner.multiplier)
            .field("cap", &self.cap)
            .finish()
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
