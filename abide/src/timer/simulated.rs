use crate::{Clock, Timer};
use parking_lot::Mutex as SyncMutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A [`Timer`] whose clock only moves when something sleeps on it.
///
/// Every requested suspension is recorded and immediately added to the
/// simulated elapsed time, so tests can drive retry and polling loops through
/// minutes of virtual time without real delay, and then inspect exactly which
/// suspensions were requested.
///
/// This timer can be cheaply cloned: all clones share the same clock and the
/// same record of suspensions.
///
/// ```
/// use abide::{Clock, SimulatedTimer, Timer};
/// use std::time::Duration;
///
/// let timer = SimulatedTimer::new();
/// let start = timer.now();
///
/// timer.sleep(Duration::from_secs(30));
///
/// assert_eq!(timer.now() - start, Duration::from_secs(30));
/// assert_eq!(timer.suspensions(), vec![Duration::from_secs(30)]);
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedTimer {
    inner: Arc<SyncMutex<SimulatedState>>,
}

#[derive(Debug)]
struct SimulatedState {
    origin: Instant,
    elapsed: Duration,
    suspensions: Vec<Duration>,
}

impl SimulatedTimer {
    /// Returns a brand new [`SimulatedTimer`] with zero elapsed time.
    pub fn new() -> Self {
        let state = SimulatedState {
            origin: Instant::now(),
            elapsed: Duration::ZERO,
            suspensions: Vec::new(),
        };

        Self {
            inner: Arc::new(SyncMutex::new(state)),
        }
    }

    /// Moves the simulated clock forward without recording a suspension.
    ///
    /// Useful for simulating an operation that itself takes time.
    pub fn advance(&self, duration: Duration) {
        self.inner.lock().elapsed += duration;
    }

    /// Reports the total simulated time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.inner.lock().elapsed
    }

    /// Returns all suspensions requested so far, in order.
    pub fn suspensions(&self) -> Vec<Duration> {
        self.inner.lock().suspensions.clone()
    }

    /// Records a suspension and advances the clock by its duration.
    fn suspend(&self, duration: Duration) {
        let mut state = self.inner.lock();

        state.suspensions.push(duration);
        state.elapsed += duration;
    }
}

impl Default for SimulatedTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimulatedTimer {
    fn now(&self) -> Instant {
        let state = self.inner.lock();

        state.origin + state.elapsed
    }
}

impl Timer for SimulatedTimer {
    fn sleep(&self, duration: Duration) {
        self.suspend(duration);
    }
}

#[cfg(feature = "async")]
const _: () = {
    use crate::AsyncTimer;
    use async_trait::async_trait;

    #[async_trait]
    impl AsyncTimer for SimulatedTimer {
        async fn sleep(&self, duration: Duration) {
            self.suspend(duration);

            // Still a genuine suspension point: other tasks get to run, and a
            // cancelled caller is dropped right here
            tokio::task::yield_now().await;
        }
    }
};
