use std::time::{Duration, Instant};

pub mod simulated;
pub mod thread;

#[cfg(feature = "async")]
pub mod cooperative;

/// A monotonic time source.
///
/// All deadlines in this crate are measured against a [`Clock`], never against
/// the wall clock, so adjusting the system time cannot shorten or extend a wait.
pub trait Clock {
    /// Returns the current point in monotonic time.
    fn now(&self) -> Instant;
}

/// A [`Clock`] that can suspend the calling thread.
///
/// This is the thread-blocking scheduling strategy: the caller is the only
/// actor, and a suspension blocks it entirely.
pub trait Timer: Clock {
    /// Blocks the calling thread for the given duration.
    fn sleep(&self, duration: Duration);
}

/// A [`Clock`] that can suspend the current task cooperatively.
///
/// This is the cooperative scheduling strategy: a suspension yields to the
/// async runtime, letting other tasks run in the meantime. Dropping the
/// returned future cancels the suspension.
#[cfg(feature = "async")]
#[async_trait::async_trait]
pub trait AsyncTimer: Clock + Send + Sync {
    /// Suspends the current task for the given duration.
    async fn sleep(&self, duration: Duration);
}

impl<T> Clock for &T
where
    T: Clock + ?Sized,
{
    fn now(&self) -> Instant {
        (**self).now()
    }
}

impl<T> Timer for &T
where
    T: Timer + ?Sized,
{
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl<T> AsyncTimer for &T
where
    T: AsyncTimer + ?Sized,
{
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await
    }
}
