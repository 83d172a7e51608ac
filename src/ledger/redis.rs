//! Redis quota ledger
//!
//! Fixed window counters. Increment, expiry and the over-ceiling rollback run
//! as one server-side script, so every caller observes a distinct
//! post-increment value and a dropped request future can never leave a
//! denied increment behind.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tokio::time::Instant;
use tracing::instrument;

use super::{FixedWindow, LedgerError, QuotaKey, QuotaLedger, QuotaOutcome};

/// Default key namespace
pub const DEFAULT_KEY_PREFIX: &str = "gateway:quota";

/// KEYS[1] counter, ARGV[1] ceiling, ARGV[2] ttl seconds. Returns the new
/// count, or -1 when the ceiling was already reached (count left unchanged).
static INCREMENT_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r"
local count = redis.call('INCR', KEYS[1])
redis.call('EXPIRE', KEYS[1], ARGV[2])
if count > tonumber(ARGV[1]) then
    redis.call('DECR', KEYS[1])
    return -1
end
return count
",
    )
});

/// Quota ledger backed by a shared Redis instance
#[derive(Clone)]
pub struct RedisLedger {
    conn: redis::aio::ConnectionManager,
    window: FixedWindow,
    key_prefix: String,
}

impl RedisLedger {
    pub fn new(conn: redis::aio::ConnectionManager, window_seconds: u64) -> Self {
        Self::with_prefix(conn, window_seconds, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(
        conn: redis::aio::ConnectionManager,
        window_seconds: u64,
        key_prefix: &str,
    ) -> Self {
        Self {
            conn,
            window: FixedWindow::new(window_seconds),
            key_prefix: key_prefix.to_string(),
        }
    }

    async fn incr(&self, key: &QuotaKey, ceiling: i64) -> Result<QuotaOutcome, LedgerError> {
        let mut conn = self.conn.clone();
        let now = chrono::Utc::now().timestamp();
        let window_index = self.window.index(now);
        let reset_at = self.window.reset_at(now);
        let redis_key = quota_key(&self.key_prefix, key, window_index);

        let count: i64 = INCREMENT_SCRIPT
            .key(&redis_key)
            .arg(ceiling)
            .arg(self.window.seconds().saturating_mul(2)) // Keep for 2 windows
            .invoke_async(&mut conn)
            .await?;

        if count < 0 {
            return Ok(QuotaOutcome::denied(ceiling, reset_at));
        }

        Ok(QuotaOutcome::admitted(ceiling, count, reset_at))
    }
}

/// Redis key for one (path, identity) counter in one window
fn quota_key(prefix: &str, key: &QuotaKey, window_index: i64) -> String {
    format!("{}:{}:{}:{}", prefix, key.path, key.identity, window_index)
}

#[async_trait]
impl QuotaLedger for RedisLedger {
    #[instrument(skip(self, deadline), fields(key = %key))]
    async fn increment_and_check(
        &self,
        key: &QuotaKey,
        ceiling: i64,
        deadline: Instant,
    ) -> Result<QuotaOutcome, LedgerError> {
        tokio::time::timeout_at(deadline, self.incr(key, ceiling))
            .await
            .map_err(|_| LedgerError::Timeout)?
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
