use std::time::Duration;

/// Defines the fine-tune parameters of a [`Retry`](crate::Retry) run.
///
/// The delay before retry `k` (1-based) is `base_delay * backoff_factor^(k-1)`,
/// capped at `max_delay` if one is set, and optionally randomized by `jitter`.
///
/// This config comes with a custom [`Deserialize`](serde::Deserialize)
/// implementation (feature `config`), which matches keys regardless of case
/// and punctuation and accepts human-readable durations:
///
/// ```yaml
/// max_attempts: 5
/// base_delay: 500ms
/// backoff_factor: 2.0
/// max_delay: 10s
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub(crate) max_attempts: u32,
    pub(crate) base_delay: Duration,
    pub(crate) backoff_factor: f64,
    pub(crate) max_delay: Option<Duration>,
    pub(crate) jitter: f64,
}

impl RetryConfig {
    /// Returns a new [`RetryConfig`] builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// The total number of attempts, including the first one. Always at
    /// least `1`; a value of `1` means no retries at all.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay before the first retry.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// The multiplier applied to the delay after each failed attempt. Always at
    /// least `1.0`; a value of `1.0` keeps the delay constant.
    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// The upper bound of a single delay, if any.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// The randomization factor of each delay, between `0.0` (exact delays)
    /// and `1.0`. A delay `d` becomes a random value in
    /// `[d * (1 - jitter), d * (1 + jitter)]`.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }
}

impl RetryConfig {
    fn default_max_attempts() -> u32 {
        3
    }

    fn default_base_delay() -> Duration {
        Duration::from_secs(1)
    }

    fn default_backoff_factor() -> f64 {
        1.0
    }

    fn default_max_delay() -> Option<Duration> {
        None
    }

    fn default_jitter() -> f64 {
        0.0
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            base_delay: Self::default_base_delay(),
            backoff_factor: Self::default_backoff_factor(),
            max_delay: Self::default_max_delay(),
            jitter: Self::default_jitter(),
        }
    }
}

impl AsRef<RetryConfig> for RetryConfig {
    fn as_ref(&self) -> &RetryConfig {
        self
    }
}

/// Allows to build the [`RetryConfig`] incrementally.
///
/// Out-of-range values are clamped into range rather than rejected: zero
/// attempts become one, a factor below `1.0` (or not finite) becomes `1.0`, and
/// jitter is clamped into `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    /// Returns a new [`RetryConfig`] builder, starting from the defaults.
    pub fn new() -> Self {
        Self {
            config: RetryConfig::default(),
        }
    }

    /// Sets the [max attempts](RetryConfig::max_attempts).
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            config: RetryConfig {
                max_attempts: max_attempts.max(1),
                ..self.config
            },
        }
    }

    /// Sets the [base delay](RetryConfig::base_delay).
    pub fn with_base_delay(self, base_delay: Duration) -> Self {
        Self {
            config: RetryConfig {
                base_delay,
                ..self.config
            },
        }
    }

    /// Sets the [backoff factor](RetryConfig::backoff_factor).
    pub fn with_backoff_factor(self, backoff_factor: f64) -> Self {
        let backoff_factor = if backoff_factor.is_finite() {
            backoff_factor.max(1.0)
        } else {
            1.0
        };

        Self {
            config: RetryConfig {
                backoff_factor,
                ..self.config
            },
        }
    }

    /// Sets the [max delay](RetryConfig::max_delay).
    pub fn with_max_delay(self, max_delay: Option<Duration>) -> Self {
        Self {
            config: RetryConfig {
                max_delay,
                ..self.config
            },
        }
    }

    /// Sets the [jitter](RetryConfig::jitter).
    pub fn with_jitter(self, jitter: f64) -> Self {
        let jitter = if jitter.is_nan() {
            0.0
        } else {
            jitter.clamp(0.0, 1.0)
        };

        Self {
            config: RetryConfig {
                jitter,
                ..self.config
            },
        }
    }

    /// Builds and returns the [`RetryConfig`].
    pub fn build(self) -> RetryConfig {
        self.config
    }
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "config")]
const _: () = {
    use crate::config::field::{DurationValue, config_field};
    use serde::de::{Error, IgnoredAny, MapAccess, Unexpected, Visitor};
    use serde::{Deserialize, Deserializer};
    use std::fmt::Formatter;

    impl<'de> Deserialize<'de> for RetryConfig {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(RetryConfigVisitor)
        }
    }

    struct RetryConfigVisitor;

    impl<'de> Visitor<'de> for RetryConfigVisitor {
        type Value = RetryConfig;

        fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
            formatter.write_str("a map of retry configuration")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut max_attempts: Option<u32> = None;
            let mut base_delay: Option<DurationValue> = None;
            let mut backoff_factor: Option<f64> = None;
            let mut max_delay: Option<DurationValue> = None;
            let mut jitter: Option<f64> = None;

            while let Some(key) = map.next_key()? {
                match key {
                    RetryConfigField::max_attempts => key.poll(&mut map, &mut max_attempts)?,
                    RetryConfigField::base_delay => key.poll(&mut map, &mut base_delay)?,
                    RetryConfigField::backoff_factor => key.poll(&mut map, &mut backoff_factor)?,
                    RetryConfigField::max_delay => key.poll(&mut map, &mut max_delay)?,
                    RetryConfigField::jitter => key.poll(&mut map, &mut jitter)?,
                    RetryConfigField::__ignore => map.next_value::<IgnoredAny>()?,
                };
            }

            let max_attempts = max_attempts.unwrap_or_else(RetryConfig::default_max_attempts);
            if max_attempts == 0 {
                return Err(Error::invalid_value(
                    Unexpected::Unsigned(0),
                    &"at least one attempt",
                ));
            }

            let backoff_factor = backoff_factor.unwrap_or_else(RetryConfig::default_backoff_factor);
            if !backoff_factor.is_finite() || backoff_factor < 1.0 {
                return Err(Error::invalid_value(
                    Unexpected::Float(backoff_factor),
                    &"a finite backoff factor of at least 1.0",
                ));
            }

            let jitter = jitter.unwrap_or_else(RetryConfig::default_jitter);
            if !(0.0..=1.0).contains(&jitter) {
                return Err(Error::invalid_value(
                    Unexpected::Float(jitter),
                    &"a jitter between 0.0 and 1.0",
                ));
            }

            Ok(RetryConfig {
                max_attempts,
                base_delay: base_delay
                    .map(|value| value.0)
                    .unwrap_or_else(RetryConfig::default_base_delay),
                backoff_factor,
                max_delay: max_delay
                    .map(|value| Some(value.0))
                    .unwrap_or_else(RetryConfig::default_max_delay),
                jitter,
            })
        }
    }

    config_field!(
        RetryConfigField,
        max_attempts | "times" | "max_retries" | "attempts",
        base_delay | "delay" | "retry_delay",
        backoff_factor | "backoff" | "multiplier",
        max_delay,
        jitter | "randomization_factor",
    );
};
