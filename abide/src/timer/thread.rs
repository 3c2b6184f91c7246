use crate::{Clock, Timer};
use std::time::{Duration, Instant};

/// The default blocking [`Timer`]: reads [`Instant::now`] and suspends with
/// [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ThreadTimer;

impl Clock for ThreadTimer {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl Timer for ThreadTimer {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_advances_clock() {
        // Given
        let timer = ThreadTimer;
        let start = timer.now();

        // When
        timer.sleep(Duration::from_millis(5));

        // Then
        assert!(timer.now().duration_since(start) >= Duration::from_millis(5));
    }
}
