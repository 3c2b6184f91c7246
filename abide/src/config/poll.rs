use crate::config::wait::MIN_PERIOD;
use std::time::Duration;

/// Defines the timing of a [`Poll`](crate::Poll) for a produced value.
///
/// Shares its keys with [`WaitConfig`](crate::WaitConfig), but polls less
/// often by default since every evaluation usually issues a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub(crate) timeout: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) message: String,
}

impl PollConfig {
    /// Returns a new [`PollConfig`] builder.
    pub fn builder() -> PollConfigBuilder {
        PollConfigBuilder::new()
    }

    /// How long to keep producing values. Always positive.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// How long to suspend between two evaluations. Always positive.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// The message carried by the [`PollTimeout`](crate::PollTimeout) error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PollConfig {
    fn default_timeout() -> Duration {
        Duration::from_secs(30)
    }

    fn default_poll_interval() -> Duration {
        Duration::from_secs(1)
    }

    fn default_message() -> String {
        "Polling condition not met".to_string()
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Self::default_timeout(),
            poll_interval: Self::default_poll_interval(),
            message: Self::default_message(),
        }
    }
}

impl AsRef<PollConfig> for PollConfig {
    fn as_ref(&self) -> &PollConfig {
        self
    }
}

/// Allows to build the [`PollConfig`] incrementally.
///
/// A zero timeout or poll interval is raised to one millisecond.
#[derive(Debug, Clone)]
pub struct PollConfigBuilder {
    config: PollConfig,
}

impl PollConfigBuilder {
    /// Returns a new [`PollConfig`] builder, starting from the defaults.
    pub fn new() -> Self {
        Self {
            config: PollConfig::default(),
        }
    }

    /// Sets the [timeout](PollConfig::timeout).
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            config: PollConfig {
                timeout: timeout.max(MIN_PERIOD),
                ..self.config
            },
        }
    }

    /// Sets the [poll interval](PollConfig::poll_interval).
    pub fn with_poll_interval(self, poll_interval: Duration) -> Self {
        Self {
            config: PollConfig {
                poll_interval: poll_interval.max(MIN_PERIOD),
                ..self.config
            },
        }
    }

    /// Sets the [message](PollConfig::message).
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            config: PollConfig {
                message: message.into(),
                ..self.config
            },
        }
    }

    /// Builds and returns the [`PollConfig`].
    pub fn build(self) -> PollConfig {
        self.config
    }
}

impl Default for PollConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "config")]
const _: () = {
    use crate::config::wait::cadence::Cadence;
    use serde::de::{MapAccess, Visitor};
    use serde::{Deserialize, Deserializer};
    use std::fmt::Formatter;

    impl<'de> Deserialize<'de> for PollConfig {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(PollConfigVisitor)
        }
    }

    struct PollConfigVisitor;

    impl<'de> Visitor<'de> for PollConfigVisitor {
        type Value = PollConfig;

        fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
            formatter.write_str("a map of polling configuration")
        }

        fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let defaults = Cadence {
                timeout: PollConfig::default_timeout(),
                poll_interval: PollConfig::default_poll_interval(),
                message: PollConfig::default_message(),
            };
            let cadence = Cadence::visit(map, defaults)?;

            Ok(PollConfig {
                timeout: cadence.timeout,
                poll_interval: cadence.poll_interval,
                message: cadence.message,
            })
        }
    }
};
