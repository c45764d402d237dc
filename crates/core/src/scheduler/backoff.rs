//! Jittered exponential backoff.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Parameters of the exponential backoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay for attempt 0
    pub base: Duration,
    /// Upper bound before jitter is applied
    pub cap: Duration,
    /// Relative jitter, clamped to `[0, 1]`
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            cap: Duration::from_secs(60),
            jitter: 0.1,
        }
    }
}

impl BackoffConfig {
    /// Delay for the given attempt using the thread-local RNG.
    pub fn delay(&self, attempt: u32) -> Duration {
        exponential_backoff(attempt, self.base, self.cap, self.jitter, &mut rand::thread_rng())
    }
}

/// `min(cap, base * 2^attempt) * (1 + U(-jitter, +jitter))`.
///
/// Never negative; never more than `cap * (1 + jitter)`. Saturates at
/// `Duration::MAX`.
pub fn exponential_backoff<R: Rng + ?Sized>(
    attempt: u32,
    base: Duration,
    cap: Duration,
    jitter: f64,
    rng: &mut R,
) -> Duration {
    let jitter = if jitter.is_finite() {
        jitter.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let factor = 2f64.powi(attempt.min(1023) as i32);
    let raw = (base.as_secs_f64() * factor).min(cap.as_secs_f64());

    let scale = if jitter > 0.0 {
        1.0 + rng.gen_range(-jitter..=jitter)
    } else {
        1.0
    };

    Duration::try_from_secs_f64((raw * scale).max(0.0)).unwrap_or(Duration::MAX)
}
