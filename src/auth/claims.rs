//! Identity claims carried by signed tokens

use serde::{Deserialize, Serialize};

/// Decoded, verified attributes of an identity token
///
/// Only ever produced by a [`TokenAuthority`](super::TokenAuthority). The
/// email on the wire is advisory; this one is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
    pub email: String,
    pub verified: bool,
    /// Expiry, unix seconds
    pub exp: i64,
    /// Issued at, unix seconds
    #[serde(default)]
    pub iat: i64,
}

impl IdentityClaim {
    /// Build a claim valid for `ttl_seconds` starting now
    pub fn new(email: impl Into<String>, verified: bool, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            email: email.into(),
            verified,
            exp: now + ttl_seconds,
            iat: now,
        }
    }
}
