#![cfg(feature = "async")]

#[cfg(test)]
mod tests {
    use abide::{Retry, RetryConfig, TokioTimer, poll_until_async, wait_until_async};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn abort_stops_wait() {
        // Given
        let evaluations = Arc::new(AtomicU32::new(0));
        let counter = evaluations.clone();
        let handle = tokio::spawn(wait_until_async(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(false)
            },
            Duration::from_secs(60),
            Duration::from_secs(1),
            "Never aborted",
        ));

        // When
        tokio::time::sleep(Duration::from_millis(3500)).await;
        handle.abort();
        let outcome = handle.await;
        let evaluations_at_abort = evaluations.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;

        // Then
        assert!(outcome.unwrap_err().is_cancelled());
        assert!(evaluations_at_abort >= 3);
        assert_eq!(evaluations.load(Ordering::SeqCst), evaluations_at_abort);
    }

    #[tokio::test(start_paused = true)]
    async fn outer_timeout_is_not_a_wait_timeout() {
        // When
        let outcome = tokio::time::timeout(
            Duration::from_secs(2),
            wait_until_async(
                || std::future::ready(false),
                Duration::from_secs(60),
                Duration::from_millis(100),
                "Inner timeout",
            ),
        )
        .await;

        // Then
        assert!(outcome.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn outer_timeout_cancels_poll() {
        // Given
        let mut calls = 0u32;

        // When
        let outcome = tokio::time::timeout(
            Duration::from_millis(2500),
            poll_until_async(
                || {
                    calls += 1;
                    std::future::ready(calls)
                },
                |_| false,
                Duration::from_secs(60),
                Duration::from_secs(1),
                "Inner timeout",
            ),
        )
        .await;

        // Then
        assert!(outcome.is_err());
        assert!((2..=4).contains(&calls));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_stops_retry() {
        // Given
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let config = RetryConfig::builder()
            .with_max_attempts(100)
            .with_base_delay(Duration::from_secs(1))
            .build();
        let retry = Retry::new(config).with_timer(TokioTimer);
        let handle = tokio::spawn(async move {
            retry
                .call_async(|| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>("still down") }
                })
                .await
        });

        // When
        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.abort();
        let outcome = handle.await;
        let attempts_at_abort = attempts.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;

        // Then
        assert!(outcome.unwrap_err().is_cancelled());
        assert!(attempts_at_abort < 100);
        assert_eq!(attempts.load(Ordering::SeqCst), attempts_at_abort);
    }
}
