use std::time::Duration;

/// Defines the timing of a [`Wait`](crate::Wait) for a boolean condition.
///
/// ```yaml
/// timeout: 30s
/// poll_interval: 500ms
/// message: Order never reached the book
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    pub(crate) timeout: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) message: String,
}

impl WaitConfig {
    /// Returns a new [`WaitConfig`] builder.
    pub fn builder() -> WaitConfigBuilder {
        WaitConfigBuilder::new()
    }

    /// How long to keep evaluating the condition. Always positive.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// How long to suspend between two evaluations. Always positive.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// The message carried by the [`Timeout`](crate::Timeout) error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl WaitConfig {
    fn default_timeout() -> Duration {
        Duration::from_secs(30)
    }

    fn default_poll_interval() -> Duration {
        Duration::from_millis(500)
    }

    fn default_message() -> String {
        "Condition not met".to_string()
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Self::default_timeout(),
            poll_interval: Self::default_poll_interval(),
            message: Self::default_message(),
        }
    }
}

impl AsRef<WaitConfig> for WaitConfig {
    fn as_ref(&self) -> &WaitConfig {
        self
    }
}

/// The smallest timeout or poll interval a builder accepts.
pub(crate) const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Allows to build the [`WaitConfig`] incrementally.
///
/// A zero timeout or poll interval is raised to one millisecond.
#[derive(Debug, Clone)]
pub struct WaitConfigBuilder {
    config: WaitConfig,
}

impl WaitConfigBuilder {
    /// Returns a new [`WaitConfig`] builder, starting from the defaults.
    pub fn new() -> Self {
        Self {
            config: WaitConfig::default(),
        }
    }

    /// Sets the [timeout](WaitConfig::timeout).
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            config: WaitConfig {
                timeout: timeout.max(MIN_PERIOD),
                ..self.config
            },
        }
    }

    /// Sets the [poll interval](WaitConfig::poll_interval).
    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            config: WaitConfig {
                poll_interval: poll_interval.max(MIN_PERIOD),
                ..self.config
            },
        }
    }

    /// Sets the [message](WaitConfig::message).
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            config: WaitConfig {
                message: message.into(),
                ..self.config
            },
        }
    }

    /// Builds and returns the [`WaitConfig`].
    pub fn build(self) -> WaitConfig {
        self.config
    }
}

impl Default for WaitConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialization shared by [`WaitConfig`] and [`PollConfig`](crate::PollConfig),
/// which differ only in their defaults.
#[cfg(feature = "config")]
pub(crate) mod cadence {
    use crate::config::field::{DurationValue, config_field};
    use serde::de::{Error, IgnoredAny, MapAccess};
    use std::time::Duration;

    /// The timing fields of a wait, each falling back to a default.
    pub(crate) struct Cadence {
        pub(crate) timeout: Duration,
        pub(crate) poll_interval: Duration,
        pub(crate) message: String,
    }

    impl Cadence {
        /// Reads the timing fields from the given map, rejecting a zero timeout
        /// or poll interval.
        pub(crate) fn visit<'de, A>(mut map: A, defaults: Cadence) -> Result<Self, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut timeout: Option<DurationValue> = None;
            let mut poll_interval: Option<DurationValue> = None;
            let mut message: Option<String> = None;

            while let Some(key) = map.next_key()? {
                match key {
                    CadenceField::timeout => key.poll(&mut map, &mut timeout)?,
                    CadenceField::poll_interval => key.poll(&mut map, &mut poll_interval)?,
                    CadenceField::message => key.poll(&mut map, &mut message)?,
                    CadenceField::__ignore => map.next_value::<IgnoredAny>()?,
                };
            }

            let timeout = positive(timeout, defaults.timeout, "timeout")?;
            let poll_interval = positive(poll_interval, defaults.poll_interval, "poll interval")?;

            Ok(Cadence {
                timeout,
                poll_interval,
                message: message.unwrap_or(defaults.message),
            })
        }
    }

    fn positive<E>(value: Option<DurationValue>, default: Duration, what: &str) -> Result<Duration, E>
    where
        E: Error,
    {
        match value {
            None => Ok(default),
            Some(DurationValue(duration)) if duration.is_zero() => {
                Err(Error::custom(format_args!("expected a positive {}, got 0s", what)))
            }
            Some(DurationValue(duration)) => Ok(duration),
        }
    }

    config_field!(
        CadenceField,
        timeout | "timeout_secs",
        poll_interval | "interval" | "poll_every",
        message | "description",
    );
}

#[cfg(feature = "config")]
const _: () = {
    use self::cadence::Cadence;
    use serde::de::{MapAccess, Visitor};
    use serde::{Deserialize, Deserializer};
    use std::fmt::Formatter;

    impl<'de> Deserialize<'de> for WaitConfig {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(WaitConfigVisitor)
        }
    }

    struct WaitConfigVisitor;

    impl<'de> Visitor<'de> for WaitConfigVisitor {
        type Value = WaitConfig;

        fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
            formatter.write_str("a map of wait configuration")
        }

        fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let defaults = Cadence {
                timeout: WaitConfig::default_timeout(),
                poll_interval: WaitConfig::default_poll_interval(),
                message: WaitConfig::default_message(),
            };
            let cadence = Cadence::visit(map, defaults)?;

            Ok(WaitConfig {
                timeout: cadence.timeout,
                poll_interval: cadence.poll_interval,
                message: cadence.message,
            })
        }
    }
};
