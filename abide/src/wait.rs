use crate::deadline::Deadline;
use crate::{ThreadTimer, Timeout, Timer, WaitConfig, WaitError};
use std::convert::Infallible;
use std::time::Duration;

#[cfg(feature = "async")]
use crate::AsyncTimer;

/// Waits until a boolean condition becomes true, or fails with a [`Timeout`].
///
/// The condition is evaluated immediately, and then again after every
/// [poll interval](WaitConfig::poll_interval), until it returns `true` or the
/// monotonic time elapsed since the start exceeds the
/// [timeout](WaitConfig::timeout). The condition is therefore evaluated at
/// least once, and at most `floor(timeout / poll_interval) + 1` times.
///
/// The timeout is only enforced between evaluations: a condition that blocks
/// indefinitely cannot be interrupted.
///
/// ```
/// use abide::{SimulatedTimer, Wait, WaitConfig};
/// use std::time::Duration;
///
/// let timer = SimulatedTimer::new();
/// let config = WaitConfig::builder()
///     .with_timeout(Duration::from_secs(1))
///     .with_poll_interval(Duration::from_millis(250))
///     .with_message("Order never filled")
///     .build();
///
/// let mut evaluations = 0;
/// let error = Wait::new(config)
///     .with_timer(timer)
///     .until(|| {
///         evaluations += 1;
///         false
///     })
///     .unwrap_err();
///
/// assert_eq!(evaluations, 5);
/// assert_eq!(error.message(), "Order never filled");
/// assert!(error.elapsed() >= error.timeout());
/// ```
#[derive(Debug, Clone)]
pub struct Wait<T = ThreadTimer> {
    config: WaitConfig,
    timer: T,
}

impl Wait {
    /// Creates a new [`Wait`] from the given config, suspending with the
    /// [`ThreadTimer`].
    pub fn new(config: impl Into<WaitConfig>) -> Self {
        Self {
            config: config.into(),
            timer: ThreadTimer,
        }
    }
}

#[cfg(feature = "async")]
impl Wait<crate::TokioTimer> {
    /// Creates a new [`Wait`] from the given config, suspending cooperatively
    /// with the [`TokioTimer`](crate::TokioTimer).
    pub fn new_async(config: impl Into<WaitConfig>) -> Self {
        Wait::new(config).with_timer(crate::TokioTimer)
    }
}

impl<T> Wait<T> {
    /// Replaces the timer used for measuring time and suspending.
    pub fn with_timer<U>(self, timer: U) -> Wait<U> {
        Wait {
            config: self.config,
            timer,
        }
    }

    /// Exposes the config of this [`Wait`].
    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    fn timed_out(&self, deadline: &Deadline, elapsed: Duration) -> Timeout {
        let timeout = deadline.timeout(self.config.message(), elapsed);
        tracing::debug!(error = %timeout, "Wait timed out");

        timeout
    }
}

impl<T> Wait<T>
where
    T: Timer,
{
    /// Blocks the calling thread until the given condition returns `true`.
    pub fn until<F>(&self, mut condition: F) -> Result<(), Timeout>
    where
        F: FnMut() -> bool,
    {
        self.try_until(|| Ok::<_, Infallible>(condition()))
            .map_err(|error| match error {
                WaitError::Timeout(timeout) => timeout,
                WaitError::Fault(never) => match never {},
            })
    }

    /// Blocks the calling thread until the given fallible condition returns
    /// `Ok(true)`.
    ///
    /// A condition that returns an error ends the wait immediately with
    /// [`WaitError::Fault`]: only "not yet" is tolerated, never a failure.
    pub fn try_until<E, F>(&self, mut condition: F) -> Result<(), WaitError<E>>
    where
        F: FnMut() -> Result<bool, E>,
    {
        let deadline = Deadline::start(&self.timer, self.config.timeout());

        loop {
            if condition().map_err(WaitError::Fault)? {
                return Ok(());
            }

            tracing::trace!("Condition not met yet");
            self.timer.sleep(self.config.poll_interval());

            if let Some(elapsed) = deadline.exceeded(&self.timer) {
                return Err(WaitError::Timeout(self.timed_out(&deadline, elapsed)));
            }
        }
    }
}

#[cfg(feature = "async")]
impl<T> Wait<T>
where
    T: AsyncTimer,
{
    /// Suspends the current task until the given asynchronous condition
    /// resolves to `true`.
    ///
    /// Dropping the returned future cancels the wait at its current suspension
    /// point; cancellation never turns into a [`Timeout`].
    pub async fn until_async<F, Fut>(&self, mut condition: F) -> Result<(), Timeout>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.try_until_async(|| {
            let future = condition();
            async move { Ok::<_, Infallible>(future.await) }
        })
        .await
        .map_err(|error| match error {
            WaitError::Timeout(timeout) => timeout,
            WaitError::Fault(never) => match never {},
        })
    }

    /// Suspends the current task until the given asynchronous fallible
    /// condition resolves to `Ok(true)`.
    pub async fn try_until_async<E, F, Fut>(&self, mut condition: F) -> Result<(), WaitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        let deadline = Deadline::start(&self.timer, self.config.timeout());

        loop {
            if condition().await.map_err(WaitError::Fault)? {
                return Ok(());
            }

            tracing::trace!("Condition not met yet");
            self.timer.sleep(self.config.poll_interval()).await;

            if let Some(elapsed) = deadline.exceeded(&self.timer) {
                return Err(WaitError::Timeout(self.timed_out(&deadline, elapsed)));
            }
        }
    }
}

/// Blocks the calling thread until the given condition returns `true`,
/// evaluating it every `poll_interval` for up to `timeout`.
///
/// Shorthand for [`Wait::until`].
pub fn wait_until<F>(
    condition: F,
    timeout: Duration,
    poll_interval: Duration,
    message: impl Into<String>,
) -> Result<(), Timeout>
where
    F: FnMut() -> bool,
{
    let config = WaitConfig::builder()
        .with_timeout(timeout)
        .with_poll_interval(poll_interval)
        .with_message(message)
        .build();

    Wait::new(config).until(condition)
}

/// Suspends the current task until the given asynchronous condition resolves to
/// `true`, evaluating it every `poll_interval` for up to `timeout` on the tokio
/// timer.
///
/// Shorthand for [`Wait::until_async`].
#[cfg(feature = "async")]
pub async fn wait_until_async<F, Fut>(
    condition: F,
    timeout: Duration,
    poll_interval: Duration,
    message: impl Into<String>,
) -> Result<(), Timeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let config = WaitConfig::builder()
        .with_timeout(timeout)
        .with_poll_interval(poll_interval)
        .with_message(message)
        .build();

    Wait::new_async(config)
        .until_async(condition)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimulatedTimer;
    use pretty_assertions::assert_eq;

    fn make_wait(timeout_ms: u64, interval_ms: u64) -> (Wait<SimulatedTimer>, SimulatedTimer) {
        let timer = SimulatedTimer::new();
        let config = WaitConfig::builder()
            .with_timeout(Duration::from_millis(timeout_ms))
            .with_poll_interval(Duration::from_millis(interval_ms))
            .with_message("Never happened")
            .build();

        (Wait::new(config).with_timer(timer.clone()), timer)
    }

    #[test]
    fn already_true() {
        // Given
        let (wait, timer) = make_wait(1000, 100);
        let mut evaluations = 0;

        // When
        let result = wait.until(|| {
            evaluations += 1;
            true
        });

        // Then
        assert_eq!(result, Ok(()));
        assert_eq!(evaluations, 1);
        assert!(timer.suspensions().is_empty());
    }

    #[test]
    fn becomes_true() {
        // Given
        let (wait, timer) = make_wait(1000, 100);
        let mut evaluations = 0;

        // When
        let result = wait.until(|| {
            evaluations += 1;
            evaluations == 4
        });

        // Then
        assert_eq!(result, Ok(()));
        assert_eq!(evaluations, 4);
        assert_eq!(timer.elapsed(), Duration::from_millis(300));
    }

    #[test]
    fn never_true_evaluation_count() {
        for (timeout_ms, interval_ms) in [(1000, 250), (1000, 300), (1000, 1000), (999, 1000), (5, 1)] {
            // Given
            let (wait, timer) = make_wait(timeout_ms, interval_ms);
            let mut evaluations = 0;

            // When
            let error = wait
                .until(|| {
                    evaluations += 1;
                    false
                })
                .unwrap_err();

            // Then
            assert_eq!(evaluations, timeout_ms / interval_ms + 1, "{}ms / {}ms", timeout_ms, interval_ms);
            assert!(error.elapsed() >= Duration::from_millis(timeout_ms));
            assert_eq!(error.elapsed(), timer.elapsed());
            assert_eq!(error.timeout(), Duration::from_millis(timeout_ms));
            assert_eq!(error.message(), "Never happened");
        }
    }

    #[test]
    fn true_exactly_at_deadline() {
        // Given
        let (wait, timer) = make_wait(1000, 500);
        let mut evaluations = 0;

        // When
        let result = wait.until(|| {
            evaluations += 1;
            timer.elapsed() >= Duration::from_millis(1000)
        });

        // Then
        assert_eq!(result, Ok(()));
        assert_eq!(evaluations, 3);
    }

    #[test]
    fn fault_propagates_without_waiting() {
        // Given
        let (wait, timer) = make_wait(1000, 100);
        let mut evaluations = 0;

        // When
        let result = wait.try_until(|| {
            evaluations += 1;
            Err::<bool, _>("connection refused")
        });

        // Then
        assert_eq!(result, Err(WaitError::Fault("connection refused")));
        assert_eq!(evaluations, 1);
        assert!(timer.suspensions().is_empty());
    }

    #[test]
    fn fault_after_false_propagates() {
        // Given
        let (wait, timer) = make_wait(1000, 100);
        let mut evaluations = 0;

        // When
        let result = wait.try_until(|| {
            evaluations += 1;
            if evaluations < 3 { Ok(false) } else { Err("socket closed") }
        });

        // Then
        assert_eq!(result, Err(WaitError::Fault("socket closed")));
        assert_eq!(timer.suspensions().len(), 2);
    }

    #[test]
    fn slow_condition_still_times_out() {
        // Given
        let (wait, timer) = make_wait(1000, 100);

        // When
        let error = wait
            .until(|| {
                timer.advance(Duration::from_millis(400));
                false
            })
            .unwrap_err();

        // Then
        assert_eq!(error.elapsed(), Duration::from_millis(1500));
        assert_eq!(timer.suspensions().len(), 3);
    }

    #[cfg(feature = "async")]
    mod asynchronous {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test(start_paused = true)]
        async fn new_async_suspends_on_tokio() {
            // Given
            let config = WaitConfig::builder()
                .with_timeout(Duration::from_secs(3))
                .with_poll_interval(Duration::from_secs(1))
                .build();
            let start = tokio::time::Instant::now();

            // When
            let error = Wait::new_async(config)
                .until_async(|| std::future::ready(false))
                .await
                .unwrap_err();

            // Then
            assert!(start.elapsed() >= Duration::from_secs(4));
            assert_eq!(error.message(), "Condition not met");
        }

        #[tokio::test]
        async fn awaits_the_condition() {
            // Given
            let (wait, timer) = make_wait(1000, 100);
            let mut evaluations = 0;

            // When
            let result = wait
                .until_async(|| {
                    evaluations += 1;
                    let ready = evaluations == 3;
                    async move {
                        tokio::task::yield_now().await;
                        ready
                    }
                })
                .await;

            // Then
            assert_eq!(result, Ok(()));
            assert_eq!(timer.suspensions(), vec![Duration::from_millis(100); 2]);
        }

        #[tokio::test]
        async fn never_true_evaluation_count() {
            // Given
            let (wait, _) = make_wait(1000, 250);
            let mut evaluations = 0;

            // When
            let error = wait
                .until_async(|| {
                    evaluations += 1;
                    std::future::ready(false)
                })
                .await
                .unwrap_err();

            // Then
            assert_eq!(evaluations, 5);
            assert!(error.elapsed() > Duration::from_millis(1000));
        }

        #[tokio::test]
        async fn fault_propagates() {
            // Given
            let (wait, timer) = make_wait(1000, 250);

            // When
            let result = wait
                .try_until_async(|| async { Err::<bool, _>("query failed") })
                .await;

            // Then
            assert_eq!(result, Err(WaitError::Fault("query failed")));
            assert!(timer.suspensions().is_empty());
        }
    }
}
