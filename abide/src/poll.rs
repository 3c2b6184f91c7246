use crate::deadline::Deadline;
use crate::{PollConfig, PollTimeout, ThreadTimer, Timer, WaitError};
use std::convert::Infallible;
use std::time::Duration;

#[cfg(feature = "async")]
use crate::AsyncTimer;

/// Repeatedly produces a value until it satisfies a condition, or fails with a
/// [`PollTimeout`] carrying the last value produced.
///
/// Follows the same loop as [`Wait`](crate::Wait): produce a value and check
/// it, then suspend for the [poll interval](PollConfig::poll_interval), and
/// give up once the elapsed time exceeds the [timeout](PollConfig::timeout).
/// The producer is called at least once.
///
/// Typical producers issue a request (read a job status, count the messages
/// in a queue), and the condition checks the response.
///
/// ```
/// use abide::{Poll, PollConfig, SimulatedTimer};
/// use std::time::Duration;
///
/// let mut statuses = vec!["queued", "running", "done"].into_iter();
/// let status = Poll::new(PollConfig::default())
///     .with_timer(SimulatedTimer::new())
///     .until(|| statuses.next().unwrap_or("done"), |status| *status == "done")
///     .unwrap();
///
/// assert_eq!(status, "done");
/// ```
#[derive(Debug, Clone)]
pub struct Poll<T = ThreadTimer> {
    config: PollConfig,
    timer: T,
}

impl Poll {
    /// Creates a new [`Poll`] from the given config, suspending with the
    /// [`ThreadTimer`].
    pub fn new(config: impl Into<PollConfig>) -> Self {
        Self {
            config: config.into(),
            timer: ThreadTimer,
        }
    }
}

#[cfg(feature = "async")]
impl Poll<crate::TokioTimer> {
    /// Creates a new [`Poll`] from the given config, suspending cooperatively
    /// with the [`TokioTimer`](crate::TokioTimer).
    pub fn new_async(config: impl Into<PollConfig>) -> Self {
        Poll::new(config).with_timer(crate::TokioTimer)
    }
}

impl<T> Poll<T> {
    /// Replaces the timer used for measuring time and suspending.
    pub fn with_timer<U>(self, timer: U) -> Poll<U> {
        Poll {
            config: self.config,
            timer,
        }
    }

    /// Exposes the config of this [`Poll`].
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    fn timed_out<V>(&self, deadline: &Deadline, elapsed: Duration, last: V) -> PollTimeout<V> {
        let timeout = deadline.timeout(self.config.message(), elapsed);
        tracing::debug!(error = %timeout, "Poll timed out");

        PollTimeout::new(timeout, last)
    }
}

fn flatten<V>(error: WaitError<Infallible, PollTimeout<V>>) -> PollTimeout<V> {
    match error {
        WaitError::Timeout(timeout) => timeout,
        WaitError::Fault(never) => match never {},
    }
}

impl<T> Poll<T>
where
    T: Timer,
{
    /// Blocks the calling thread until the given producer returns a value
    /// satisfying the given condition, and returns that value.
    pub fn until<V, P, C>(&self, mut producer: P, condition: C) -> Result<V, PollTimeout<V>>
    where
        P: FnMut() -> V,
        C: FnMut(&V) -> bool,
    {
        self.try_until(|| Ok::<_, Infallible>(producer()), condition)
            .map_err(flatten)
    }

    /// Blocks the calling thread until the given fallible producer returns a
    /// value satisfying the given condition.
    ///
    /// A producer that returns an error ends the poll immediately with
    /// [`WaitError::Fault`].
    pub fn try_until<V, E, P, C>(
        &self,
        mut producer: P,
        mut condition: C,
    ) -> Result<V, WaitError<E, PollTimeout<V>>>
    where
        P: FnMut() -> Result<V, E>,
        C: FnMut(&V) -> bool,
    {
        let deadline = Deadline::start(&self.timer, self.config.timeout());

        loop {
            let value = producer().map_err(WaitError::Fault)?;
            if condition(&value) {
                return Ok(value);
            }

            tracing::trace!("Polled value does not satisfy the condition yet");
            self.timer.sleep(self.config.poll_interval());

            if let Some(elapsed) = deadline.exceeded(&self.timer) {
                return Err(WaitError::Timeout(self.timed_out(&deadline, elapsed, value)));
            }
        }
    }
}

#[cfg(feature = "async")]
impl<T> Poll<T>
where
    T: AsyncTimer,
{
    /// Suspends the current task until the given asynchronous producer
    /// resolves to a value satisfying the given condition.
    ///
    /// The timeout is cooperative: a producer that never resolves is not
    /// interrupted. Wrap it in [`tokio::time::timeout`] if that matters.
    pub async fn until_async<V, P, Fut, C>(
        &self,
        mut producer: P,
        condition: C,
    ) -> Result<V, PollTimeout<V>>
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = V>,
        C: FnMut(&V) -> bool,
    {
        self.try_until_async(
            || {
                let future = producer();
                async move { Ok::<_, Infallible>(future.await) }
            },
            condition,
        )
        .await
        .map_err(flatten)
    }

    /// Suspends the current task until the given asynchronous fallible
    /// producer resolves to a value satisfying the given condition.
    pub async fn try_until_async<V, E, P, Fut, C>(
        &self,
        mut producer: P,
        mut condition: C,
    ) -> Result<V, WaitError<E, PollTimeout<V>>>
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        C: FnMut(&V) -> bool,
    {
        let deadline = Deadline::start(&self.timer, self.config.timeout());

        loop {
            let value = producer().await.map_err(WaitError::Fault)?;
            if condition(&value) {
                return Ok(value);
            }

            tracing::trace!("Polled value does not satisfy the condition yet");
            self.timer.sleep(self.config.poll_interval()).await;

            if let Some(elapsed) = deadline.exceeded(&self.timer) {
                return Err(WaitError::Timeout(self.timed_out(&deadline, elapsed, value)));
            }
        }
    }
}

/// Blocks the calling thread until the given producer returns a value
/// satisfying the given condition, polling every `poll_interval` for up to
/// `timeout`.
///
/// Shorthand for [`Poll::until`].
pub fn poll_until<V, P, C>(
    producer: P,
    condition: C,
    timeout: Duration,
    poll_interval: Duration,
    message: impl Into<String>,
) -> Result<V, PollTimeout<V>>
where
    P: FnMut() -> V,
    C: FnMut(&V) -> bool,
{
    let config = PollConfig::builder()
        .with_timeout(timeout)
        .with_poll_interval(poll_interval)
        .with_message(message)
        .build();

    Poll::new(config).until(producer, condition)
}

/// Suspends the current task until the given asynchronous producer resolves to
/// a value satisfying the given condition, polling every `poll_interval` for up
/// to `timeout` on the tokio timer.
///
/// Shorthand for [`Poll::until_async`].
#[cfg(feature = "async")]
pub async fn poll_until_async<V, P, Fut, C>(
    producer: P,
    condition: C,
    timeout: Duration,
    poll_interval: Duration,
    message: impl Into<String>,
) -> Result<V, PollTimeout<V>>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = V>,
    C: FnMut(&V) -> bool,
{
    let config = PollConfig::builder()
        .with_timeout(timeout)
        .with_poll_interval(poll_interval)
        .with_message(message)
        .build();

    Poll::new_async(config)
        .until_async(producer, condition)
        .await
}
