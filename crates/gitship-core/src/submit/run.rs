//! Submission orchestrator: drives one batch through admission, delivery
//! attempts and backoff until the endpoint accepts it or the retry budget
//! runs out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::payload::BatchPayload;
use crate::transport::TransportClient;

use super::classify::is_retryable;
use super::limiter::{RateLimit, SlidingWindowLimiter};
use super::policy::RetryPolicy;
use super::result::SubmissionResult;

/// Where the submitter is in the delivery of one batch.
#[derive(Debug, Clone, Copy)]
enum Phase {
    /// Waiting for a rate-limiter slot.
    Admitting,
    /// Slot held; deliver now.
    Attempting,
    /// Transient failure; wait out the backoff, then re-admit.
    RetryWait(Duration),
}

/// Policy-governed batch submission over any [`TransportClient`].
///
/// The admission window is instance-local and persists across `submit`
/// calls, so consecutive batches through one submitter share the rate
/// budget.
pub struct Submitter<C> {
    client: C,
    policy: RetryPolicy,
    limiter: SlidingWindowLimiter,
    cancel: Option<Arc<AtomicBool>>,
}

impl<C> Submitter<C> {
    pub fn new(client: C, policy: RetryPolicy, limit: RateLimit) -> Self {
        Submitter {
            client,
            policy,
            limiter: SlidingWindowLimiter::new(limit),
            cancel: None,
        }
    }

    /// Attach a cancellation flag. Once it reads true, the in-flight
    /// `submit` returns a failure before its next attempt or wait.
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn set_policy(&mut self, policy: RetryPolicy) {
        self.policy = policy;
    }

    /// Swap the admission limit. Previously recorded sends still count
    /// against the new window.
    pub fn set_rate_limit(&mut self, limit: RateLimit) {
        self.limiter.set_limit(limit);
    }

    /// Forget all recorded admissions.
    pub fn reset_rate_window(&mut self) {
        self.limiter.reset();
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|token| token.load(Ordering::Relaxed))
    }
}

impl<C: TransportClient> Submitter<C> {
    /// Deliver one batch.
    ///
    /// Returns success with the 1-based attempt number that landed, or a
    /// failure carrying the terminal error, the exhaustion message wrapping
    /// the last transient error, or the cancellation notice. Never errors:
    /// every outcome is a [`SubmissionResult`].
    ///
    /// Admission waits are not bounded by the retry budget: a saturated
    /// window delays the next attempt for as long as it stays full. The
    /// cancellation token is the way out of that wait.
    pub async fn submit(&mut self, payload: &BatchPayload) -> SubmissionResult {
        if payload.is_empty() {
            return SubmissionResult::failed("invalid batch: no issues to submit", 1);
        }

        let max_attempts = self.policy.max_retries.saturating_add(1);
        let mut attempt: u32 = 0;
        let mut last_error = String::new();
        let mut phase = Phase::Admitting;

        loop {
            if self.cancelled() {
                tracing::info!("submission cancelled after {} attempts", attempt);
                return SubmissionResult::failed("submission cancelled", attempt.max(1));
            }
            match phase {
                Phase::Admitting => {
                    if self.limiter.admit(Instant::now()) {
                        phase = Phase::Attempting;
                    } else {
                        // Denials spend no retry budget; re-poll on a fixed
                        // cadence until a slot opens.
                        let wait = self.limiter.limit().retry_interval();
                        tracing::debug!("rate window full, waiting {:?} for a slot", wait);
                        tokio::time::sleep(wait).await;
                    }
                }
                Phase::Attempting => {
                    attempt += 1;
                    tracing::debug!("delivery attempt {}/{}", attempt, max_attempts);
                    let outcome = self.client.send(payload).await;
                    if outcome.success {
                        tracing::info!(
                            "batch of {} issues accepted on attempt {}",
                            payload.len(),
                            attempt
                        );
                        return SubmissionResult::succeeded(attempt);
                    }
                    let error = outcome
                        .error
                        .unwrap_or_else(|| "delivery failed with no error detail".to_string());
                    if !is_retryable(&error) {
                        tracing::warn!("attempt {} failed terminally: {}", attempt, error);
                        return SubmissionResult::failed(error, attempt);
                    }
                    last_error = error;
                    if attempt >= max_attempts {
                        tracing::warn!("giving up after {} attempts: {}", attempt, last_error);
                        return SubmissionResult::failed(
                            format!("retry budget exhausted; last error: {last_error}"),
                            attempt,
                        );
                    }
                    let delay = self.policy.delay(attempt);
                    tracing::warn!(
                        "attempt {} failed: {}; retrying in {:?}",
                        attempt,
                        last_error,
                        delay
                    );
                    phase = Phase::RetryWait(delay);
                }
                Phase::RetryWait(delay) => {
                    tokio::time::sleep(delay).await;
                    phase = Phase::Admitting;
                }
            }
        }
    }
}
