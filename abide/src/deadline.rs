use crate::{Clock, Timeout};
use std::time::{Duration, Instant};

/// An absolute point in monotonic time, fixed when a wait starts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    start: Instant,
    timeout: Duration,
}

impl Deadline {
    /// Starts the countdown on the given clock.
    pub(crate) fn start(clock: &impl Clock, timeout: Duration) -> Self {
        Self {
            start: clock.now(),
            timeout,
        }
    }

    /// Returns the elapsed time if it already exceeds the timeout.
    ///
    /// Reaching the deadline exactly is not exceeding it: a condition that
    /// becomes true precisely at the deadline is still observed.
    pub(crate) fn exceeded(&self, clock: &impl Clock) -> Option<Duration> {
        let elapsed = clock.now().saturating_duration_since(self.start);

        (elapsed > self.timeout).then_some(elapsed)
    }

    /// Builds the [`Timeout`] error for this deadline.
    pub(crate) fn timeout(&self, message: &str, elapsed: Duration) -> Timeout {
        Timeout::new(message, self.timeout, elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SimulatedTimer, Timer};
    use pretty_assertions::assert_eq;

    #[test]
    fn exceeded_only_past_timeout() {
        // Given
        let timer = SimulatedTimer::new();
        let deadline = Deadline::start(&timer, Duration::from_secs(1));

        // Then
        assert_eq!(deadline.exceeded(&timer), None);

        // When
        timer.sleep(Duration::from_secs(1));

        // Then
        assert_eq!(deadline.exceeded(&timer), None);

        // When
        timer.sleep(Duration::from_millis(1));

        // Then
        assert_eq!(deadline.exceeded(&timer), Some(Duration::from_millis(1001)));
    }
}
