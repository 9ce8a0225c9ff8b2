use parking_lot::Mutex;
use std::time::Instant;

use crate::config::BucketConfig;

/// A token bucket with lazy, time-based refill.
///
/// Tokens and the refill timestamp live behind one lock, so the
/// refill-check-decrement sequence in [`Bucket::allow`] is a single critical section.
#[derive(Debug)]
pub struct Bucket {
    state: Mutex<State>,
    capacity: i64,
    rate: f64,
}

#[derive(Debug)]
struct State {
    tokens: i64,
    last_refill: Instant,
}

impl State {
    // Whole tokens earned since `last_refill`, or `None` if no time has passed.
    fn pending(&self, now: Instant, rate: f64) -> Option<i64> {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed.is_zero() {
            return None;
        }
        // `as` saturates for out-of-range floats and maps NaN to zero.
        Some(((elapsed.as_secs_f64() * rate) as i64).max(0))
    }

    fn peek(&self, now: Instant, capacity: i64, rate: f64) -> i64 {
        match self.pending(now, rate) {
            Some(added) if added > 0 => {
                self.tokens.saturating_add(added).min(capacity).max(0)
            }
            _ => self.tokens,
        }
    }

    fn refill(&mut self, now: Instant, capacity: i64, rate: f64) -> i64 {
        if self.pending(now, rate).is_some() {
            self.tokens = self.peek(now, capacity, rate);
            self.last_refill = now;
        }
        self.tokens
    }

    fn take(&mut self, now: Instant, capacity: i64, rate: f64) -> bool {
        let tokens = self.refill(now, capacity, rate);
        if tokens - 1 < 0 {
            return false;
        }
        self.tokens = tokens - 1;
        true
    }
}

impl Default for Bucket {
    fn default() -> Self {
        Self::new(BucketConfig::default())
    }
}

impl Bucket {
    /// Builds a bucket whose refill clock starts now.
    pub fn new(cfg: BucketConfig) -> Self {
        Self::new_at(cfg, Instant::now())
    }

    fn new_at(cfg: BucketConfig, now: Instant) -> Self {
        Self {
            state: Mutex::new(State {
                tokens: cfg.initial_tokens.min(cfg.capacity).max(0),
                last_refill: now,
            }),
            capacity: cfg.capacity,
            rate: cfg.refill_rate,
        }
    }

    /// Consumes one token if available. Returns `false` when the bucket is empty.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    /// Token count including any refill earned so far. Read-only: neither consumes
    /// nor moves the refill clock.
    pub fn tokens(&self) -> i64 {
        self.tokens_at(Instant::now())
    }

    /// Maximum tokens the bucket holds.
    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    /// Tokens added per elapsed second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    fn allow_at(&self, now: Instant) -> bool {
        self.state.lock().take(now, self.capacity, self.rate)
    }

    fn tokens_at(&self, now: Instant) -> i64 {
        self.state.lock().peek(now, self.capacity, self.rate)
    }
}
