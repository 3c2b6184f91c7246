mod common;

#[cfg(test)]
mod tests {
    use crate::common::logs::LogCapture;
    use abide::{Retry, RetryConfig, SimulatedTimer, Wait, WaitConfig};
    use assertables::assert_contains;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tracing::Level;

    #[test]
    fn retries_are_logged_as_warnings() {
        // Given
        let capture = LogCapture::new();
        let config = RetryConfig::builder()
            .with_max_attempts(3)
            .with_base_delay(Duration::from_millis(100))
            .build();
        let retry = Retry::new(config).with_timer(SimulatedTimer::new());

        // When
        let result = capture.run(|| retry.call(|| Err::<(), _>("connection refused")));

        // Then
        assert_eq!(result, Err("connection refused"));

        let warnings = capture.lines_at(Level::WARN);
        assert_eq!(warnings.len(), 2);
        assert_contains!(warnings[0], "Attempt failed, retrying");
        assert_contains!(warnings[0], "attempt=1");
        assert_contains!(warnings[0], "max_attempts=3");
        assert_contains!(warnings[0], "error=\"connection refused\"");
        assert_contains!(warnings[0], "delay=100ms");
        assert_contains!(warnings[1], "attempt=2");

        let debugs = capture.lines_at(Level::DEBUG);
        assert_eq!(debugs.len(), 1);
        assert_contains!(debugs[0], "Retries exhausted");
    }

    #[test]
    fn first_attempt_success_logs_nothing() {
        // Given
        let capture = LogCapture::new();
        let retry = Retry::new(RetryConfig::default()).with_timer(SimulatedTimer::new());

        // When
        let result = capture.run(|| retry.call(|| Ok::<_, String>(42)));

        // Then
        assert_eq!(result, Ok(42));
        assert!(capture.lines().is_empty());
    }

    #[test]
    fn wait_timeout_is_logged() {
        // Given
        let capture = LogCapture::new();
        let config = WaitConfig::builder()
            .with_timeout(Duration::from_secs(1))
            .with_poll_interval(Duration::from_millis(500))
            .with_message("Index never refreshed")
            .build();
        let wait = Wait::new(config).with_timer(SimulatedTimer::new());

        // When
        let result = capture.run(|| wait.until(|| false));

        // Then
        assert!(result.is_err());
        assert_eq!(capture.lines_at(Level::TRACE).len(), 3);

        let debugs = capture.lines_at(Level::DEBUG);
        assert_eq!(debugs.len(), 1);
        assert_contains!(debugs[0], "Wait timed out");
        assert_contains!(debugs[0], "Index never refreshed after 1.5s (timeout 1s)");
    }
}
