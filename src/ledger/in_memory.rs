//! In-memory quota ledger
//!
//! Single-process counterpart of the Redis ledger with the same fixed window
//! semantics. Used for local development and tests, where no Redis instance
//! is available.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{FixedWindow, LedgerError, QuotaKey, QuotaLedger, QuotaOutcome};

/// Counter state for one key
struct Counter {
    window_index: i64,
    count: i64,
}

struct LedgerState {
    counters: HashMap<QuotaKey, Counter>,
    swept_window: i64,
}

/// Quota ledger holding counters in process memory
///
/// # Thread Safety
///
/// The whole increment-and-check runs under one mutex, which makes it atomic
/// per key (and across keys).
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    window: FixedWindow,
}

impl InMemoryLedger {
    pub fn new(window_seconds: u64) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                counters: HashMap::new(),
                swept_window: i64::MIN,
            }),
            window: FixedWindow::new(window_seconds),
        }
    }

    /// Increment-and-check as of `now` (unix seconds)
    pub fn increment_at(
        &self,
        key: &QuotaKey,
        ceiling: i64,
        now: i64,
    ) -> Result<QuotaOutcome, LedgerError> {
        let window_index = self.window.index(now);
        let reset_at = self.window.reset_at(now);
        let mut state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;

        // Drop counters from finished windows once per window
        if state.swept_window < window_index {
            state.counters.retain(|_, c| c.window_index >= window_index);
            state.swept_window = window_index;
        }

        let counter = state.counters.entry(key.clone()).or_insert(Counter {
            window_index,
            count: 0,
        });
        if counter.window_index != window_index {
            counter.window_index = window_index;
            counter.count = 0;
        }

        if counter.count >= ceiling {
            return Ok(QuotaOutcome::denied(ceiling, reset_at));
        }

        counter.count += 1;
        Ok(QuotaOutcome::admitted(ceiling, counter.count, reset_at))
    }

    /// Admissions recorded for `key` in the window containing `now`
    pub fn count_at(&self, key: &QuotaKey, now: i64) -> i64 {
        let window_index = self.window.index(now);
        self.state
            .lock()
            .map(|state| {
                state
                    .counters
                    .get(key)
                    .filter(|c| c.window_index == window_index)
                    .map(|c| c.count)
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    /// Admissions recorded for `key` in the current window
    pub fn count(&self, key: &QuotaKey) -> i64 {
        self.count_at(key, chrono::Utc::now().timestamp())
    }
}

#[async_trait]
impl QuotaLedger for InMemoryLedger {
    async fn increment_and_check(
        &self,
        key: &QuotaKey,
        ceiling: i64,
        deadline: Instant,
    ) -> Result<QuotaOutcome, LedgerError> {
        if Instant::now() >= deadline {
            return Err(LedgerError::Timeout);
        }
        self.increment_at(key, ceiling, chrono::Utc::now().timestamp())
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        self.state
            .lock()
            .map(|_| ())
            .map_err(|_| LedgerError::Poisoned)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
