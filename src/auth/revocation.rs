//! Token revocation
//!
//! Revoked tokens are stored by digest, never in the clear, and only until
//! the token would have expired anyway.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Default key namespace
pub const DEFAULT_KEY_PREFIX: &str = "gateway:revoked";

/// Why a token was revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    Logout,
    SecurityConcern,
    PasswordChange,
}

impl RevocationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RevocationReason::Logout => "logout",
            RevocationReason::SecurityConcern => "security_concern",
            RevocationReason::PasswordChange => "password_change",
        }
    }
}

/// Revocation store failures. Validation treats these as revoked.
#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("revocation backend error: {0}")]
    Backend(String),

    #[error("revocation state lock poisoned")]
    Poisoned,
}

impl From<redis::RedisError> for RevocationError {
    fn from(e: redis::RedisError) -> Self {
        RevocationError::Backend(e.to_string())
    }
}

/// Store of revoked token digests
#[async_trait]
pub trait RevocationList: Send + Sync {
    /// Whether the token with this digest was revoked and has not yet expired
    async fn is_revoked(&self, digest: &str) -> Result<bool, RevocationError>;

    /// Revoke the token with this digest until `expires_at` (unix seconds)
    async fn revoke(
        &self,
        digest: &str,
        reason: RevocationReason,
        expires_at: i64,
    ) -> Result<(), RevocationError>;

    /// Connectivity check for health endpoints
    async fn ping(&self) -> Result<(), RevocationError>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}

/// Revocation list held in process memory
///
/// Maps digest to the unix time the revoked token expires.
#[derive(Default)]
pub struct InMemoryRevocationList {
    entries: Mutex<HashMap<String, i64>>,
}

impl InMemoryRevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revocation check as of `now` (unix seconds); drops expired entries
    pub fn is_revoked_at(&self, digest: &str, now: i64) -> Result<bool, RevocationError> {
        let mut entries = self.entries.lock().map_err(|_| RevocationError::Poisoned)?;
        entries.retain(|_, expires_at| *expires_at > now);
        Ok(entries.contains_key(digest))
    }
}

#[async_trait]
impl RevocationList for InMemoryRevocationList {
    async fn is_revoked(&self, digest: &str) -> Result<bool, RevocationError> {
        self.is_revoked_at(digest, chrono::Utc::now().timestamp())
    }

    async fn revoke(
        &self,
        digest: &str,
        reason: RevocationReason,
        expires_at: i64,
    ) -> Result<(), RevocationError> {
        let mut entries = self.entries.lock().map_err(|_| RevocationError::Poisoned)?;
        entries.insert(digest.to_string(), expires_at);
        info!(reason = reason.as_str(), expires_at, "Token revoked");
        Ok(())
    }

    async fn ping(&self) -> Result<(), RevocationError> {
        self.entries
            .lock()
            .map(|_| ())
            .map_err(|_| RevocationError::Poisoned)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Revocation list shared through Redis; entries expire with their token
#[derive(Clone)]
pub struct RedisRevocationList {
    conn: redis::aio::ConnectionManager,
    key_prefix: String,
}

impl RedisRevocationList {
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(conn: redis::aio::ConnectionManager, key_prefix: &str) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.to_string(),
        }
    }

    fn key(&self, digest: &str) -> String {
        format!("{}:{}", self.key_prefix, digest)
    }
}

#[async_trait]
impl RevocationList for RedisRevocationList {
    async fn is_revoked(&self, digest: &str) -> Result<bool, RevocationError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(self.key(digest)).await?;
        Ok(exists)
    }

    async fn revoke(
        &self,
        digest: &str,
        reason: RevocationReason,
        expires_at: i64,
    ) -> Result<(), RevocationError> {
        let ttl = expires_at - chrono::Utc::now().timestamp();
        if ttl <= 0 {
            // Already expired; decoding rejects it anyway
            return Ok(());
        }

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.key(digest), reason.as_str(), ttl as u64)
            .await?;
        info!(reason = reason.as_str(), expires_at, "Token revoked");
        Ok(())
    }

    async fn ping(&self) -> Result<(), RevocationError> {
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
