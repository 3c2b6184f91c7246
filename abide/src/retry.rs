use crate::{Backoff, RetryConfig, ThreadTimer, Timer};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "async")]
use crate::AsyncTimer;

type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type RetryObserver<E> = Arc<dyn Fn(&E, u32) + Send + Sync>;

/// Executes a fallible operation, retrying it on retryable faults.
///
/// Attempts are numbered from `1` to
/// [`max_attempts`](RetryConfig::max_attempts):
///
/// - On success, the value is returned immediately.
/// - On a retryable fault before the last attempt, the
///   [observer](Retry::on_retry) is called with the fault and the attempt
///   number, the timer suspends for the current [`Backoff`] delay, and the next
///   attempt runs.
/// - On a retryable fault at the last attempt, that fault is returned as is.
/// - On a fault that is not [retryable](Retry::when), the fault is returned
///   immediately, without calling the observer or suspending.
///
/// The error is never wrapped: the caller gets back the operation’s own `E`.
/// Panics are never caught.
///
/// ```
/// use abide::{Retry, RetryConfig, SimulatedTimer};
/// use std::time::Duration;
///
/// let timer = SimulatedTimer::new();
/// let config = RetryConfig::builder()
///     .with_max_attempts(4)
///     .with_base_delay(Duration::from_secs(1))
///     .with_backoff_factor(2.0)
///     .build();
///
/// let mut calls = 0;
/// let result = Retry::new(config)
///     .with_timer(timer.clone())
///     .call(|| {
///         calls += 1;
///         if calls < 4 { Err("not yet") } else { Ok(calls) }
///     });
///
/// assert_eq!(result, Ok(4));
/// assert_eq!(
///     timer.suspensions(),
///     vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)],
/// );
/// ```
pub struct Retry<E, T = ThreadTimer> {
    config: RetryConfig,
    timer: T,
    retry_if: Option<RetryPredicate<E>>,
    on_retry: Option<RetryObserver<E>>,
}

impl<E> Retry<E> {
    /// Creates a new [`Retry`] from the given config, suspending with the
    /// [`ThreadTimer`] and treating every fault as retryable.
    pub fn new(config: impl Into<RetryConfig>) -> Self {
        Self {
            config: config.into(),
            timer: ThreadTimer,
            retry_if: None,
            on_retry: None,
        }
    }
}

#[cfg(feature = "async")]
impl<E> Retry<E, crate::TokioTimer> {
    /// Creates a new [`Retry`] from the given config, suspending cooperatively
    /// with the [`TokioTimer`](crate::TokioTimer) and treating every fault as
    /// retryable.
    pub fn new_async(config: impl Into<RetryConfig>) -> Self {
        Retry::new(config).with_timer(crate::TokioTimer)
    }
}

impl<E, T> Retry<E, T> {
    /// Replaces the timer used for suspending between attempts.
    pub fn with_timer<U>(self, timer: U) -> Retry<E, U> {
        Retry {
            config: self.config,
            timer,
            retry_if: self.retry_if,
            on_retry: self.on_retry,
        }
    }

    /// Narrows the set of retryable faults to those matching the given
    /// predicate. Any other fault is returned immediately.
    pub fn when<P>(self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            retry_if: Some(Arc::new(predicate)),
            ..self
        }
    }

    /// Registers an observer called with the fault and the attempt number
    /// before each suspension. Never called after the last attempt.
    pub fn on_retry<O>(self, observer: O) -> Self
    where
        O: Fn(&E, u32) + Send + Sync + 'static,
    {
        Self {
            on_retry: Some(Arc::new(observer)),
            ..self
        }
    }

    /// Exposes the config of this [`Retry`].
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn is_retryable(&self, error: &E) -> bool {
        self.retry_if
            .as_ref()
            .is_none_or(|predicate| predicate(error))
    }

    /// Decides what to do about a fault at the given attempt: returns the delay
    /// to suspend for before the next attempt, or gives the fault back when
    /// the run is over.
    fn next_delay(&self, error: E, attempt: u32, backoff: &mut Backoff) -> Result<Duration, E>
    where
        E: Debug,
    {
        let max_attempts = self.config.max_attempts();

        if !self.is_retryable(&error) {
            tracing::debug!(attempt, max_attempts, ?error, "Fault is not retryable");
            return Err(error);
        }

        if attempt >= max_attempts {
            tracing::debug!(attempt, max_attempts, ?error, "Retries exhausted");
            return Err(error);
        }

        let delay = backoff.next();
        tracing::warn!(
            attempt,
            max_attempts,
            ?error,
            delay = ?delay,
            "Attempt failed, retrying"
        );

        if let Some(observer) = &self.on_retry {
            observer(&error, attempt);
        }

        Ok(delay)
    }
}

impl<E, T> Retry<E, T>
where
    E: Debug,
    T: Timer,
{
    /// Runs the given operation under this retry policy, blocking the calling
    /// thread between attempts.
    pub fn call<R, F>(&self, mut operation: F) -> Result<R, E>
    where
        F: FnMut() -> Result<R, E>,
    {
        let mut backoff = Backoff::new(&self.config);
        let mut attempt = 1;

        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let delay = self.next_delay(error, attempt, &mut backoff)?;
                    self.timer.sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(feature = "async")]
impl<E, T> Retry<E, T>
where
    E: Debug,
    T: AsyncTimer,
{
    /// Runs the given asynchronous operation under this retry policy,
    /// suspending cooperatively between attempts.
    ///
    /// Dropping the returned future cancels the run at its current suspension
    /// point; cancellation is never treated as a fault.
    pub async fn call_async<R, F, Fut>(&self, mut operation: F) -> Result<R, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let mut backoff = Backoff::new(&self.config);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let delay = self.next_delay(error, attempt, &mut backoff)?;
                    self.timer.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl<E, T> Clone for Retry<E, T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            timer: self.timer.clone(),
            retry_if: self.retry_if.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<E, T> Debug for Retry<E, T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retry")
            .field("config", &self.config)
            .field("timer", &self.timer)
            .field("retry_if", &self.retry_if.as_ref().map(|_| "<predicate>"))
            .field("on_retry", &self.on_retry.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

/// Runs the given operation with the given config, retrying on every fault and
/// blocking the calling thread between attempts.
///
/// Shorthand for [`Retry::new(config).call(operation)`](Retry::call).
pub fn retry<R, E, F>(config: impl Into<RetryConfig>, operation: F) -> Result<R, E>
where
    E: Debug,
    F: FnMut() -> Result<R, E>,
{
    Retry::new(config).call(operation)
}

/// Runs the given asynchronous operation with the given config, retrying on
/// every fault and suspending on the tokio timer between attempts.
///
/// Shorthand for
/// [`Retry::new_async(config).call_async(operation)`](Retry::call_async).
#[cfg(feature = "async")]
pub async fn retry_async<R, E, F, Fut>(config: impl Into<RetryConfig>, operation: F) -> Result<R, E>
where
    E: Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    Retry::new_async(config).call_async(operation).await
}
