//! Token bucket pacing for outbound API calls.
//!
//! The Amazon Ads API enforces a strict per-second request quota. Every
//! outbound call acquires a token here before hitting the network; report
//! workers share the same bucket, so the token state sits behind a single
//! async mutex.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Sustained request rate supported by the Amazon Ads API
pub const DEFAULT_MAX_PER_SECOND: u32 = 10;

/// Default number of requests that may be issued instantaneously
pub const DEFAULT_BURST_SIZE: u32 = 3;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Rate limiter with burst support (token bucket algorithm)
#[derive(Debug)]
pub struct TokenBucket {
    max_per_second: f64,
    burst_size: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(max_per_second: u32, burst_size: u32) -> Self {
        let burst_size = burst_size.max(1);
        Self {
            max_per_second: f64::from(max_per_second.max(1)),
            burst_size: f64::from(burst_size),
            state: Mutex::new(BucketState {
                tokens: f64::from(burst_size),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Wait until a token is available, then consume it.
    ///
    /// The mutex is held across the sleep on purpose: waiters queue up and
    /// are released one per refill interval, which keeps the realized rate
    /// below `max_per_second` even with many concurrent callers.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();

        // Refill tokens based on time elapsed, capped at the burst size
        state.tokens = (state.tokens + elapsed * self.max_per_second).min(self.burst_size);
        state.last_refill = now;

        if state.tokens < 1.0 {
            let wait = (1.0 - state.tokens) / self.max_per_second;
            debug!("Rate limit reached, waiting {:.3}s for next token", wait);
            tokio::time::sleep(Duration::from_secs_f64(wait)).await;
            // Re-stamp after sleeping so the waited interval is not credited
            // again on the next acquire
            state.last_refill = Instant::now();
            state.tokens = 1.0;
        }

        state.tokens -= 1.0;
    }
}

impl Default for TokenBucket {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_SECOND, DEFAULT_BURST_SIZE)
    }
}
