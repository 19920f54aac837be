use std::time::Duration;

use capture_logging::capture_debug;
use rand::Rng;

/// Randomized pause between live page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub min: Duration,
    pub max: Duration,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(3_500),
            max: Duration::from_millis(7_000),
        }
    }
}

impl Throttle {
    pub fn disabled() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Uniform in `[min, max]`; `min` when the range is empty.
    pub fn next_delay(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        capture_debug!("Throttling for {:.2}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }
}
