//! Credential validator
//!
//! Answers "does this token prove this email?" and fails closed on anything
//! it cannot verify, including a revocation list it cannot reach.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{
    claims::IdentityClaim,
    revocation::RevocationList,
    token::{token_digest, token_fingerprint, TokenAuthority},
};

/// Check of an (email, token) pair against the token authority and the
/// revocation list
#[derive(Clone)]
pub struct CredentialValidator {
    authority: Arc<dyn TokenAuthority>,
    revocations: Arc<dyn RevocationList>,
    require_verified: bool,
}

impl CredentialValidator {
    pub fn new(
        authority: Arc<dyn TokenAuthority>,
        revocations: Arc<dyn RevocationList>,
        require_verified: bool,
    ) -> Self {
        Self {
            authority,
            revocations,
            require_verified,
        }
    }

    /// The authority used to decode tokens
    pub fn authority(&self) -> &Arc<dyn TokenAuthority> {
        &self.authority
    }

    /// Where revoked tokens are recorded
    pub fn revocations(&self) -> &Arc<dyn RevocationList> {
        &self.revocations
    }

    /// Validate the pair, returning the decoded claim on success
    ///
    /// Returns `None` when the token does not decode, is expired, carries a
    /// different email, (if required) belongs to an unverified account, or
    /// is revoked. A failing revocation lookup also yields `None`.
    pub async fn authenticate(&self, email: &str, token: &str) -> Option<IdentityClaim> {
        if email.is_empty() || token.is_empty() {
            return None;
        }

        let claim = match self.authority.decode(token) {
            Ok(claim) => claim,
            Err(e) => {
                debug!(error = %e, "Credential rejected");
                return None;
            }
        };

        if claim.email != email {
            debug!(claimed = %email, "Token and email mismatched");
            return None;
        }

        if self.require_verified && !claim.verified {
            debug!(email = %claim.email, "Unverified account rejected");
            return None;
        }

        match self.revocations.is_revoked(&token_digest(token)).await {
            Ok(false) => Some(claim),
            Ok(true) => {
                debug!(
                    email = %claim.email,
                    token_fingerprint = %token_fingerprint(token),
                    "Revoked token rejected"
                );
                None
            }
            Err(e) => {
                warn!(
                    backend = self.revocations.backend(),
                    error = %e,
                    "Revocation lookup failed, rejecting credential"
                );
                None
            }
        }
    }

    /// Boolean form of [`authenticate`](Self::authenticate)
    pub async fn validate(&self, email: &str, token: &str) -> bool {
        self.authenticate(email, token).await.is_some()
    }
}
