//! Quota ledger
//!
//! Per-(path, identity) request counters with an atomic increment-and-check.
//! Window and reset policy belong to the ledger implementation.

pub mod in_memory;
pub mod redis;

use std::fmt;

use async_trait::async_trait;
use axum::http::{header, HeaderName, HeaderValue};
use thiserror::Error;
use tokio::time::Instant;

pub use in_memory::InMemoryLedger;
pub use redis::RedisLedger;

/// Counter identity: which route, which caller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuotaKey {
    pub path: String,
    pub identity: String,
}

impl QuotaKey {
    pub fn new(path: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            identity: identity.into(),
        }
    }
}

impl fmt::Display for QuotaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.identity)
    }
}

/// Ledger failures. The gateway treats every one of these as a denial.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger backend error: {0}")]
    Backend(String),

    #[error("ledger call exceeded the request deadline")]
    Timeout,

    #[error("ledger state lock poisoned")]
    Poisoned,
}

impl From<::redis::RedisError> for LedgerError {
    fn from(e: ::redis::RedisError) -> Self {
        LedgerError::Backend(e.to_string())
    }
}

/// Result of one increment-and-check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaOutcome {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Ceiling applied to this caller
    pub limit: i64,
    /// Admissions counted in the current window
    pub current: i64,
    /// Admissions left in the current window
    pub remaining: i64,
    /// Unix timestamp when the current window ends
    pub reset_at: i64,
}

impl QuotaOutcome {
    pub fn admitted(limit: i64, current: i64, reset_at: i64) -> Self {
        Self {
            allowed: true,
            limit,
            current,
            remaining: (limit - current).max(0),
            reset_at,
        }
    }

    pub fn denied(limit: i64, reset_at: i64) -> Self {
        Self {
            allowed: false,
            limit,
            current: limit,
            remaining: 0,
            reset_at,
        }
    }

    /// Rate limit headers for the response
    pub fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![
            (
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(self.limit),
            ),
            (
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from(self.remaining.max(0)),
            ),
            (
                HeaderName::from_static("x-ratelimit-reset"),
                HeaderValue::from(self.reset_at),
            ),
        ];

        if !self.allowed {
            let retry_after = (self.reset_at - chrono::Utc::now().timestamp()).max(1);
            headers.push((header::RETRY_AFTER, HeaderValue::from(retry_after)));
        }

        headers
    }
}

/// Fixed window arithmetic shared by the ledgers
#[derive(Debug, Clone, Copy)]
pub struct FixedWindow {
    seconds: i64,
}

impl FixedWindow {
    pub fn new(seconds: u64) -> Self {
        Self {
            seconds: i64::try_from(seconds).unwrap_or(i64::MAX).max(1),
        }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Index of the window containing `now`
    pub fn index(&self, now: i64) -> i64 {
        now.div_euclid(self.seconds)
    }

    /// End of the window containing `now`
    pub fn reset_at(&self, now: i64) -> i64 {
        (self.index(now) + 1).saturating_mul(self.seconds)
    }
}

/// Counter service enforcing per-key ceilings
///
/// `increment_and_check` must be atomic per key: under any interleaving no
/// more than `ceiling` calls for one key are admitted within a window.
/// Denied calls do not consume quota.
#[async_trait]
pub trait QuotaLedger: Send + Sync {
    async fn increment_and_check(
        &self,
        key: &QuotaKey,
        ceiling: i64,
        deadline: Instant,
    ) -> Result<QuotaOutcome, LedgerError>;

    /// Connectivity check for health endpoints
    async fn ping(&self) -> Result<(), LedgerError>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}
