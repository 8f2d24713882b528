//! Sliding-window admission control over attempt timestamps.
//!
//! This is a trailing window, not a token bucket: an attempt is admitted iff
//! fewer than `max_requests` attempts were admitted within the last `window`.

use anyhow::{bail, Result};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Validated rate-limit parameters.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    /// Admissions allowed per window.
    pub max_requests: u32,
    /// Length of the trailing window.
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_millis(60_000),
        }
    }
}

impl RateLimit {
    pub fn new(max_requests: u32, window: Duration) -> Result<Self> {
        if max_requests == 0 {
            bail!("rate limit needs at least 1 request per window");
        }
        if window.is_zero() {
            bail!("rate limit window must be positive");
        }
        Ok(Self {
            max_requests,
            window,
        })
    }

    /// Fixed interval between admission re-polls when the window is full.
    pub fn retry_interval(&self) -> Duration {
        self.window / self.max_requests
    }
}

/// Deque of admission timestamps with eager eviction.
///
/// Instance-local: the log is never shared across limiters, and it
/// accumulates across submissions until `reset` is called.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    limit: RateLimit,
    log: VecDeque<Instant>,
}

impl SlidingWindowLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            log: VecDeque::with_capacity(limit.max_requests as usize),
        }
    }

    /// Evict timestamps that fell out of the trailing window, then admit and
    /// record `now` iff the remaining count is below `max_requests`. A denial
    /// has no effect beyond the eviction.
    pub fn admit(&mut self, now: Instant) -> bool {
        while let Some(&oldest) = self.log.front() {
            if now.duration_since(oldest) >= self.limit.window {
                self.log.pop_front();
            } else {
                break;
            }
        }
        if (self.log.len() as u32) < self.limit.max_requests {
            self.log.push_back(now);
            true
        } else {
            false
        }
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Replace the limit parameters. Previously recorded timestamps are kept
    /// and judged against the new window on the next `admit`.
    pub fn set_limit(&mut self, limit: RateLimit) {
        self.limit = limit;
    }

    /// Number of admissions currently recorded (as of the last `admit`).
    pub fn recorded(&self) -> usize {
        self.log.len()
    }

    /// Forget all recorded admissions.
    pub fn reset(&mut self) {
        self.log.clear();
    }
}
