// Simulated work duration

use rand::Rng;
use std::time::Duration;

/// Random delay range for simulated handlers
///
/// `SimulatedDelay::none()` skips the sleep entirely (tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedDelay {
    min_ms: u64,
    max_ms: u64,
}

impl SimulatedDelay {
    pub fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    /// Inclusive range; bounds are swapped if given in reverse
    pub fn between(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn is_none(&self) -> bool {
        self.max_ms == 0
    }

    /// Pick a duration in range
    pub fn sample(&self) -> Duration {
        if self.is_none() {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
