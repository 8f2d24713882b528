use anyhow::{bail, Result};
use std::time::Duration;

/// Exponential backoff policy with a cap.
///
/// `delay(n)` grows geometrically from `base_delay` and never exceeds
/// `max_delay`. No jitter is applied, so retries from independent processes
/// can synchronize; callers that care must add their own desynchronization.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = exactly one attempt).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any backoff delay.
    pub max_delay: Duration,
    /// Geometric growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Build a validated policy. Rejects `base_delay > max_delay` and
    /// multipliers below 1 (the delay sequence must be non-decreasing).
    pub fn new(
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Result<Self> {
        if base_delay > max_delay {
            bail!(
                "base delay {:?} exceeds max delay {:?}",
                base_delay,
                max_delay
            );
        }
        if !multiplier.is_finite() || multiplier < 1.0 {
            bail!("backoff multiplier must be a finite number >= 1, got {multiplier}");
        }
        Ok(Self {
            max_retries,
            base_delay,
            max_delay,
            multiplier,
        })
    }

    /// Backoff delay before retry number `retry` (1-based):
    /// `min(base_delay * multiplier^(retry - 1), max_delay)`.
    pub fn delay(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw_ms = self.base_delay.as_millis() as f64 * self.multiplier.powi(exp);
        // powi may overflow to infinity for large exponents; min() caps that too.
        let capped_ms = raw_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_retries, 3);
        assert_eq!(p.base_delay, Duration::from_millis(1000));
        assert_eq!(p.max_delay, Duration::from_millis(30_000));
        assert!((p.multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn first_retry_waits_the_base_delay() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay(1), Duration::from_millis(1000));
    }

    #[test]
    fn delays_double_then_cap() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay(2), Duration::from_millis(2000));
        assert_eq!(p.delay(3), Duration::from_millis(4000));
        assert_eq!(p.delay(5), Duration::from_millis(16_000));
        // 1000 * 2^5 = 32000 exceeds the 30s cap.
        assert_eq!(p.delay(6), Duration::from_millis(30_000));
        assert_eq!(p.delay(40), Duration::from_millis(30_000));
    }

    #[test]
    fn delays_never_decrease() {
        let p = RetryPolicy::new(
            10,
            Duration::from_millis(250),
            Duration::from_secs(8),
            1.7,
        )
        .unwrap();
        let mut prev = Duration::ZERO;
        for retry in 1..=12 {
            let d = p.delay(retry);
            assert!(d >= prev, "delay({retry}) = {d:?} dropped below {prev:?}");
            prev = d;
        }
    }

    #[test]
    fn fractional_multiplier() {
        let p = RetryPolicy::new(
            3,
            Duration::from_millis(1000),
            Duration::from_secs(30),
            1.5,
        )
        .unwrap();
        assert_eq!(p.delay(1), Duration::from_millis(1000));
        assert_eq!(p.delay(2), Duration::from_millis(1500));
        assert_eq!(p.delay(3), Duration::from_millis(2250));
    }

    #[test]
    fn multiplier_of_one_keeps_delays_flat() {
        let p = RetryPolicy::new(
            3,
            Duration::from_millis(500),
            Duration::from_secs(30),
            1.0,
        )
        .unwrap();
        assert_eq!(p.delay(1), Duration::from_millis(500));
        assert_eq!(p.delay(7), Duration::from_millis(500));
    }

    #[test]
    fn rejects_base_above_max() {
        let res = RetryPolicy::new(
            3,
            Duration::from_secs(60),
            Duration::from_secs(30),
            2.0,
        );
        assert!(res.is_err());
    }

    #[test]
    fn rejects_bad_multipliers() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(1);
        assert!(RetryPolicy::new(3, base, max, 0.5).is_err());
        assert!(RetryPolicy::new(3, base, max, f64::NAN).is_err());
        assert!(RetryPolicy::new(3, base, max, f64::INFINITY).is_err());
    }

    #[test]
    fn huge_retry_index_stays_capped() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay(u32::MAX), p.max_delay);
    }
}
