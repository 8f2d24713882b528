//! Resilient batch submission.
//!
//! This module owns the delivery state machine: sliding-window admission
//! control, transient-vs-terminal error classification, and exponential
//! backoff between attempts. Higher layers hand it a batch payload and a
//! transport and get back one [`SubmissionResult`].

mod classify;
mod limiter;
mod policy;
mod result;
mod run;

pub use classify::is_retryable;
pub use limiter::{RateLimit, SlidingWindowLimiter};
pub use policy::RetryPolicy;
pub use result::SubmissionResult;
pub use run::Submitter;
