//! Bounded retry with doubling backoff.
//!
//! An attempt that fails is first classified as [`FailureType::Transient`]
//! (connect/reset, timeouts, 408/429/5xx) or [`FailureType::Permanent`]
//! (TLS problems, other 4xx). Only transient failures are retried, and only
//! until the policy's attempt budget runs out.
//!
//! ```
//! use sharefetch_core::http::{RetryDecision, RetryPolicy, classify_status};
//!
//! let policy = RetryPolicy::with_retries(2);
//! assert!(matches!(
//!     policy.should_retry(classify_status(503), 1),
//!     RetryDecision::Retry { attempt: 2, .. }
//! ));
//! assert!(matches!(
//!     policy.should_retry(classify_status(404), 1),
//!     RetryDecision::DoNotRetry { .. }
//! ));
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::TransportError;

/// One initial request plus five retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_JITTER: Duration = Duration::from_millis(50);

/// How a failed attempt should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    Transient,
    Permanent,
}

/// Outcome of [`RetryPolicy::should_retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then make attempt number `attempt` (1-based).
    Retry { delay: Duration, attempt: u32 },
    DoNotRetry { reason: String },
}

/// Delay schedule: `base * 2^(n-1)`, capped at `cap`, plus up to `jitter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Backoff {
    base: Duration,
    cap: Duration,
    jitter: Duration,
}

impl Backoff {
    fn delay_before(&self, retry_number: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry_number.saturating_sub(1))
            .unwrap_or(u32::MAX);
        let delay = self.base.saturating_mul(factor).min(self.cap);
        if self.jitter.is_zero() {
            return delay;
        }
        let max_jitter = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..=max_jitter))
    }
}

/// Attempt budget and backoff for retryable requests.
///
/// Defaults: 6 attempts, 100 ms base delay doubling to a 5 s cap, up to
/// 50 ms of jitter. The delays before retries 1-5 are roughly 0.1, 0.2,
/// 0.4, 0.8, and 1.6 seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the initial request and is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff {
                base: base_delay,
                cap: max_delay,
                jitter: DEFAULT_JITTER,
            },
        }
    }

    /// Default backoff with `retries` retries after the initial attempt.
    #[must_use]
    pub fn with_retries(retries: u32) -> Self {
        Self::new(
            retries.saturating_add(1),
            DEFAULT_BASE_DELAY,
            DEFAULT_MAX_DELAY,
        )
    }

    /// Makes delays deterministic.
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.backoff.jitter = Duration::ZERO;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what to do after attempt `attempt` (1-based) failed.
    #[must_use]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure".to_string(),
            };
        }
        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry {
                reason: format!("all {} attempts used", self.max_attempts),
            };
        }

        let delay = self.backoff.delay_before(attempt);
        debug!(attempt, delay_ms = delay.as_millis(), "scheduling retry");
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }
}

/// Classifies the status of a response that did arrive.
#[must_use]
pub fn classify_status(status: u16) -> FailureType {
    match status {
        408 | 429 | 500..=599 => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

/// Classifies a request that produced no response.
///
/// Connect and timeout errors are transient. Other network errors are
/// transient unless they look like TLS or certificate failures, which a
/// retry cannot fix.
#[must_use]
pub fn classify_transport_error(error: &TransportError) -> FailureType {
    match error {
        TransportError::Connect { .. } | TransportError::Timeout { .. } => FailureType::Transient,
        TransportError::Network { source, .. } if looks_like_tls(source) => FailureType::Permanent,
        TransportError::Network { .. } => FailureType::Transient,
        TransportError::ClientBuild { .. } => FailureType::Permanent,
    }
}

fn looks_like_tls(error: &reqwest::Error) -> bool {
    let message = error.to_string().to_lowercase();
    ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|marker| message.contains(marker))
}
