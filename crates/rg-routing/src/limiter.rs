//! Token-bucket rate limiter shared by every worker of a batch.
//!
//! The bucket holds up to `calls` tokens and refills continuously at
//! `calls / period`.  A caller that finds the bucket empty *reserves* a
//! future token by driving the balance negative, computes how long until
//! that token exists, releases the mutex, and only then sleeps.  Concurrent
//! callers therefore queue up in reservation order without any of them
//! holding the lock while blocked.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// `calls` provider calls per `period`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RateLimit {
    pub calls: u32,
    pub period: Duration,
}

impl RateLimit {
    pub fn per_minute(calls: u32) -> Self {
        Self { calls, period: Duration::from_secs(60) }
    }

    fn tokens_per_sec(&self) -> f64 {
        self.calls as f64 / self.period.as_secs_f64()
    }
}

impl Default for RateLimit {
    /// OpenRouteService free-tier directions quota.
    fn default() -> Self {
        Self::per_minute(40)
    }
}

struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

pub struct RateLimiter {
    limit: Option<RateLimit>,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// A limiter that starts with a full bucket.  A zero `calls` or zero
    /// `period` disables limiting.
    pub fn new(limit: RateLimit) -> Self {
        let usable = limit.calls > 0 && !limit.period.is_zero();
        Self {
            limit: usable.then_some(limit),
            bucket: Mutex::new(Bucket { tokens: limit.calls as f64, refilled_at: Instant::now() }),
        }
    }

    /// Never waits.
    pub fn unlimited() -> Self {
        Self {
            limit: None,
            bucket: Mutex::new(Bucket { tokens: 0.0, refilled_at: Instant::now() }),
        }
    }

    pub fn limit(&self) -> Option<RateLimit> {
        self.limit
    }

    /// Take one token, sleeping until it is available.
    pub fn acquire(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            log::trace!("rate limiter: waiting {wait:?}");
            std::thread::sleep(wait);
        }
    }

    /// Reserve one token and return how long the caller must wait before
    /// using it.  Does not sleep.
    pub fn reserve(&self) -> Duration {
        let Some(limit) = self.limit else {
            return Duration::ZERO;
        };
        let rate = limit.tokens_per_sec();
        let capacity = limit.calls as f64;

        let mut bucket = self.bucket.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(capacity);
        bucket.refilled_at = now;
        bucket.tokens -= 1.0;

        if bucket.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-bucket.tokens / rate)
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimit::default())
    }
}
