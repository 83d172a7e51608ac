//! Revocation list doubles

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ishkul_gateway::auth::{RevocationError, RevocationList, RevocationReason};

/// Revocation list whose backend is unreachable
#[derive(Default)]
pub struct FailingRevocationList {
    lookups: AtomicUsize,
}

impl FailingRevocationList {
    /// Number of `is_revoked` calls received
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RevocationList for FailingRevocationList {
    async fn is_revoked(&self, _digest: &str) -> Result<bool, RevocationError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Err(RevocationError::Backend("connection refused".to_string()))
    }

    async fn revoke(
        &self,
        _digest: &str,
        _reason: RevocationReason,
        _expires_at: i64,
    ) -> Result<(), RevocationError> {
        Err(RevocationError::Backend("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), RevocationError> {
        Err(RevocationError::Backend("connection refused".to_string()))
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_list_counts_lookups() {
        let list = FailingRevocationList::default();

        assert!(list.is_revoked("abc").await.is_err());
        assert!(list.ping().await.is_err());
        assert_eq!(list.lookups(), 1);
    }
}
