// Token bucket rate limiter
//
// Capacity equals the configured requests/second R. One token is added every 1/R
// seconds; a refill that finds the bucket full is dropped. Refill is computed lazily
// from elapsed time on each operation, so the bucket owns no background task and can
// be built outside a runtime.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct BucketState {
    rate: u32,
    tokens: u32,
    last_refill: Instant,
}

impl BucketState {
    fn interval(&self) -> Duration {
        Duration::from_secs(1) / self.rate
    }

    fn refill(&mut self, now: Instant) {
        let interval = self.interval();
        let elapsed = now.saturating_duration_since(self.last_refill);
        let ticks = (elapsed.as_nanos() / interval.as_nanos()) as u64;
        if ticks == 0 {
            return;
        }
        let room = u64::from(self.rate - self.tokens);
        if ticks >= room {
            self.tokens = self.rate;
            self.last_refill = now;
        } else {
            self.tokens += ticks as u32;
            self.last_refill += interval * ticks as u32;
        }
    }
}

/// Owned, injectable token bucket. One per Transport.
#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Start full. A rate of zero is treated as one request per second.
    pub fn new(requests_per_second: u32) -> Self {
        let rate = requests_per_second.max(1);
        Self {
            state: Mutex::new(BucketState {
                rate,
                tokens: rate,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.lock();
                let now = Instant::now();
                state.refill(now);
                if state.tokens > 0 {
                    state.tokens -= 1;
                    return;
                }
                let next = state.last_refill + state.interval();
                next.saturating_duration_since(now)
            };
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    /// Take a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        state.refill(Instant::now());
        if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Return one token, dropped if the bucket is already full.
    pub fn release(&self) {
        let mut state = self.lock();
        if state.tokens < state.rate {
            state.tokens += 1;
        }
    }

    /// Change the refill rate (and with it the capacity).
    pub fn set_rate(&self, requests_per_second: u32) {
        let mut state = self.lock();
        let now = Instant::now();
        state.refill(now);
        state.rate = requests_per_second.max(1);
        state.tokens = state.tokens.min(state.rate);
        state.last_refill = now;
    }

    pub fn rate(&self) -> u32 {
        self.lock().rate
    }

    pub fn available(&self) -> u32 {
        let mut state = self.lock();
        state.refill(Instant::now());
        state.tokens
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BucketState> {
        // The state stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
