use crate::{AsyncTimer, Clock};
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// The default cooperative [`AsyncTimer`], backed by the tokio time driver.
///
/// Reads time through [`tokio::time::Instant`], so a paused test runtime
/// (`#[tokio::test(start_paused = true)]`) controls the clock as well as the
/// suspensions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokioTimer;

impl Clock for TokioTimer {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

#[async_trait]
impl AsyncTimer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
