use crate::{PollConfig, RetryConfig, WaitConfig};
use config::{Config, ConfigError, Environment};
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt::Formatter;

/// The default prefix of environment variables read by [`AbideConfig::from_env`].
const DEFAULT_ENV_PREFIX: &str = "ABIDE";

/// Groups the configuration of all primitives into one section.
///
/// Deserializes from any [`serde`] source, for example a `retry`/`wait`/`poll`
/// section in a test suite's own configuration file:
///
/// ```yaml
/// retry:
///   max_attempts: 3
///   base_delay: 1s
/// wait:
///   timeout: 30s
/// poll:
///   poll_interval: 2s
/// ```
///
/// or from the environment with [`AbideConfig::from_env`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbideConfig {
    retry: RetryConfig,
    wait: WaitConfig,
    poll: PollConfig,
}

impl AbideConfig {
    /// Exposes the [`RetryConfig`] section.
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Exposes the [`WaitConfig`] section.
    pub fn wait(&self) -> &WaitConfig {
        &self.wait
    }

    /// Exposes the [`PollConfig`] section.
    pub fn poll(&self) -> &PollConfig {
        &self.poll
    }
}

impl AbideConfig {
    /// Loads the configuration from `ABIDE_*` environment variables, after
    /// loading a `.env` file from the current directory or its ancestors, if
    /// there is one.
    ///
    /// Sections and keys are separated by a double underscore:
    ///
    /// ```text
    /// ABIDE_RETRY__MAX_ATTEMPTS=5
    /// ABIDE_RETRY__BASE_DELAY=500ms
    /// ABIDE_WAIT__TIMEOUT=10s
    /// ABIDE_POLL__POLL_INTERVAL=2
    /// ```
    ///
    /// Variables already present in the environment take precedence over the
    /// `.env` file. Missing variables fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Same as [`from_env`](AbideConfig::from_env), with a custom variable
    /// prefix.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded environment from dotenv file");
        }

        Self::from_environment(Self::environment(prefix))
    }

    fn environment(prefix: &str) -> Environment {
        Environment::with_prefix(prefix)
            .prefix_separator("_")
            .separator("__")
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

const _: () = {
    impl<'de> Deserialize<'de> for AbideConfig {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(AbideConfigVisitor)
        }
    }

    struct AbideConfigVisitor;

    impl<'de> Visitor<'de> for AbideConfigVisitor {
        type Value = AbideConfig;

        fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
            formatter.write_str("a map of retry, wait and poll configuration")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut retry = None;
            let mut wait = None;
            let mut poll = None;

            while let Some(key) = map.next_key()? {
                match key {
                    AbideConfigField::retry => key.poll(&mut map, &mut retry)?,
                    AbideConfigField::wait => key.poll(&mut map, &mut wait)?,
                    AbideConfigField::poll => key.poll(&mut map, &mut poll)?,
                    AbideConfigField::__ignore => map.next_value::<IgnoredAny>()?,
                };
            }

            Ok(AbideConfig {
                retry: retry.unwrap_or_default(),
                wait: wait.unwrap_or_default(),
                poll: poll.unwrap_or_default(),
            })
        }
    }

    crate::config::field::config_field!(
        AbideConfigField,
        retry | "retries",
        wait | "wait_until",
        poll | "poll_until",
    );
};
