#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Implements the clock and suspend strategies shared by all primitives.
mod timer;
pub use self::timer::simulated::SimulatedTimer;
pub use self::timer::thread::ThreadTimer;
#[cfg(feature = "async")]
pub use self::timer::cooperative::TokioTimer;
#[cfg(feature = "async")]
pub use self::timer::AsyncTimer;
pub use self::timer::{Clock, Timer};

/// Implements the delay schedule between retry attempts.
mod backoff;
pub use self::backoff::Backoff;

/// Implements the fault kinds surfaced by the primitives.
mod error;
pub use self::error::{PollTimeout, Timeout, WaitError};

/// Implements the configuration sections of all primitives.
mod config {
    pub mod poll;
    pub mod retry;
    pub mod wait;

    /// Implements the aggregate section loaded from the environment.
    #[cfg(feature = "config")]
    pub mod env;

    /// Implements the shared deserialization helpers.
    #[cfg(feature = "config")]
    pub mod field;
}
#[cfg(feature = "config")]
pub use self::config::env::AbideConfig;
pub use self::config::poll::{PollConfig, PollConfigBuilder};
pub use self::config::retry::{RetryConfig, RetryConfigBuilder};
pub use self::config::wait::{WaitConfig, WaitConfigBuilder};

/// Implements the monotonic deadline shared by the waiting primitives.
mod deadline;

/// Implements the retry-on-fault wrapper.
mod retry;
pub use self::retry::{Retry, retry};
#[cfg(feature = "async")]
pub use self::retry::retry_async;

/// Implements the condition-wait primitive.
mod wait;
pub use self::wait::{Wait, wait_until};
#[cfg(feature = "async")]
pub use self::wait::wait_until_async;

/// Implements the value-polling primitive.
mod poll;
pub use self::poll::{Poll, poll_until};
#[cfg(feature = "async")]
pub use self::poll::poll_until_async;
