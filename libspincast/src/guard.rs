//! Inbound access control
//!
//! Every request passes one gate before any business logic: a static
//! source-address allowlist, then two rate limiters in order. The global
//! limiter is a continuously refilling token bucket; the submit limiter is
//! a fixed window per minute. Both advance on every accepted request, so
//! the configured ceilings hold regardless of outcome downstream.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::AccessConfig;
use crate::error::AccessError;

pub struct AccessGuard {
    allowed_prefixes: Vec<String>,
    global: Mutex<TokenBucket>,
    submit: Mutex<FixedWindow>,
}

impl AccessGuard {
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            allowed_prefixes: config.allowed_prefixes.clone(),
            global: Mutex::new(TokenBucket::new(config.global_per_second)),
            submit: Mutex::new(FixedWindow::new(
                config.submit_per_minute,
                Duration::from_secs(60),
            )),
        }
    }

    /// Gate a submit request from `addr`.
    ///
    /// # Errors
    ///
    /// `AccessError::Forbidden` when the address matches no allowlist
    /// entry, `AccessError::RateLimited` when either limiter is exhausted.
    /// Every rejection is logged with the offending address.
    pub fn check_submit(&self, addr: &str) -> Result<(), AccessError> {
        self.check_submit_at(addr, Instant::now())
    }

    fn check_submit_at(&self, addr: &str, now: Instant) -> Result<(), AccessError> {
        if !self.is_allowed(addr) {
            tracing::warn!(addr, "rejected request from non-allowlisted address");
            return Err(AccessError::Forbidden {
                addr: addr.to_string(),
            });
        }

        if !self.global.lock().unwrap().try_acquire(now) {
            tracing::warn!(addr, "rejected request: global rate limit exhausted");
            return Err(AccessError::RateLimited { scope: "global" });
        }

        if !self.submit.lock().unwrap().try_acquire(now) {
            tracing::warn!(addr, "rejected request: submit rate limit exhausted");
            return Err(AccessError::RateLimited { scope: "submit" });
        }

        Ok(())
    }

    // Entries match as prefixes; an exact address is its own prefix.
    fn is_allowed(&self, addr: &str) -> bool {
        self.allowed_prefixes
            .iter()
            .any(|prefix| addr.starts_with(prefix.as_str()))
    }
}

/// Continuously refilling bucket. Capacity equals one second of refill, so
/// bursts cannot outrun the steady rate by more than a second's worth.
struct TokenBucket {
    rate_per_sec: f64,
    capacity: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(rate_per_sec: f64) -> Self {
        let capacity = rate_per_sec.max(1.0);
        Self {
            rate_per_sec,
            capacity,
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn try_acquire(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Fixed window counter for the submit endpoint.
struct FixedWindow {
    limit: u32,
    window: Duration,
    count: u32,
    window_start: Instant,
}

impl FixedWindow {
    fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            count: 0,
            window_start: Instant::now(),
        }
    }

    fn try_acquire(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.window_start) >= self.window {
            self.count = 0;
            self.window_start = now;
        }

        if self.count < self.limit {
            self.count += 1;
            true
        } else {
            false
        }
    }
}
