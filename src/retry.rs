//! Retry policy for the request pipeline.
//!
//! The retry behavior is part of the observable client contract, so the
//! status set, method set, and backoff formula are spelled out here rather
//! than delegated to transport-library defaults.

use std::time::Duration;

use reqwest::Method;

/// HTTP statuses treated as transient and eligible for retry.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Methods the client will retry. Covers every verb the client issues.
pub const RETRY_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retries after the initial attempt
    pub max_retries: u32,
    /// Backoff multiplier in seconds
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: 1.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: f64) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Whether another retry is allowed after `retries_so_far` retries.
    pub fn allows(&self, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
    }

    /// Delay before retry `attempt` (1-based): `backoff * 2^(attempt - 1)`
    /// seconds, no jitter.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2f64.powi(attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64((self.backoff * factor).max(0.0))
    }

    /// Check if a response status is retry-eligible.
    pub fn is_transient_status(status: u16) -> bool {
        RETRY_STATUSES.contains(&status)
    }

    /// Check if a transport failure is retry-eligible. Covers failures where
    /// no response was obtained at all: connect errors, timeouts, and
    /// requests that died in flight.
    pub fn is_transient_transport(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request()
    }

    /// Check if a method is in the retryable set.
    pub fn is_retryable_method(method: &Method) -> bool {
        RETRY_METHODS.contains(method)
    }
}
