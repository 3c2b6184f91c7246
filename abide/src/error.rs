use std::time::Duration;
use thiserror::Error;

/// Signals that a wait ran past its deadline without the condition being
/// satisfied.
///
/// This is an expected outcome of polling, always recoverable by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} after {elapsed:?} (timeout {timeout:?})")]
pub struct Timeout {
    message: String,
    timeout: Duration,
    elapsed: Duration,
}

/// Signals that a value poll ran past its deadline, carrying the last value
/// that failed the condition.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{timeout}; last result: {last:?}")]
pub struct PollTimeout<V> {
    timeout: Timeout,
    last: V,
}

/// The outcome of a wait whose predicate or producer may itself fail.
///
/// Polling primitives only tolerate "not yet": a fault raised by the predicate
/// or producer is never retried, it ends the wait immediately as
/// [`Fault`](WaitError::Fault).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaitError<E, T = Timeout> {
    /// The deadline elapsed without the condition being satisfied.
    #[error(transparent)]
    Timeout(T),

    /// The predicate or producer failed.
    #[error(transparent)]
    Fault(E),
}

impl Timeout {
    pub(crate) fn new(message: impl Into<String>, timeout: Duration, elapsed: Duration) -> Self {
        Self {
            message: message.into(),
            timeout,
            elapsed,
        }
    }

    /// Returns the descriptive message of the wait that timed out.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the time actually elapsed when the wait gave up. Never less
    /// than the [configured timeout](Timeout::timeout).
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl<V> PollTimeout<V> {
    pub(crate) fn new(timeout: Timeout, last: V) -> Self {
        Self { timeout, last }
    }

    /// Returns the descriptive message of the poll that timed out.
    pub fn message(&self) -> &str {
        self.timeout.message()
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout.timeout()
    }

    /// Returns the time actually elapsed when the poll gave up.
    pub fn elapsed(&self) -> Duration {
        self.timeout.elapsed()
    }

    /// Exposes the last value produced before the poll gave up.
    pub fn last(&self) -> &V {
        &self.last
    }

    /// Consumes this error, returning the last value produced before the poll
    /// gave up.
    pub fn into_last(self) -> V {
        self.last
    }

    /// Drops the last value, keeping only the plain [`Timeout`].
    pub fn into_timeout(self) -> Timeout {
        self.timeout
    }
}

impl<E, T> WaitError<E, T> {
    /// Reports whether this is a [`Timeout`](WaitError::Timeout).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Reports whether this is a [`Fault`](WaitError::Fault).
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    /// Returns the timeout, if this is one.
    pub fn into_timeout(self) -> Option<T> {
        match self {
            Self::Timeout(timeout) => Some(timeout),
            Self::Fault(_) => None,
        }
    }

    /// Returns the fault, if this is one.
    pub fn into_fault(self) -> Option<E> {
        match self {
            Self::Timeout(_) => None,
            Self::Fault(fault) => Some(fault),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn timeout_display() {
        // Given
        let timeout = Timeout::new("Job not complete", Duration::from_secs(2), Duration::from_millis(2500));

        // When
        let display = timeout.to_string();

        // Then
        assert_eq!(display, "Job not complete after 2.5s (timeout 2s)");
    }

    #[test]
    fn poll_timeout_display() {
        // Given
        let timeout = Timeout::new("Status not ready", Duration::from_secs(1), Duration::from_secs(1));
        let poll_timeout = PollTimeout::new(timeout, "pending");

        // When
        let display = poll_timeout.to_string();

        // Then
        assert_eq!(display, "Status not ready after 1s (timeout 1s); last result: \"pending\"");
        assert_eq!(poll_timeout.into_last(), "pending");
    }

    #[test]
    fn wait_error_is_transparent() {
        // Given
        let timeout = Timeout::new("Never", Duration::from_secs(1), Duration::from_secs(2));
        let as_timeout: WaitError<std::io::Error> = WaitError::Timeout(timeout.clone());
        let as_fault: WaitError<std::io::Error> =
            WaitError::Fault(std::io::Error::other("broken pipe"));

        // Then
        assert_eq!(as_timeout.to_string(), timeout.to_string());
        assert_eq!(as_fault.to_string(), "broken pipe");
        assert!(as_timeout.is_timeout());
        assert!(as_fault.is_fault());
        assert_eq!(as_timeout.into_timeout(), Some(timeout));
    }
}
