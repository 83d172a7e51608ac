//! Gateway pipeline
//!
//! Runs one request through the ordered checks:
//!
//! ```text
//! Received → CredentialChecked → [PolicyChecked] → QuotaChecked → Forwarded
//! ```
//!
//! Any stage may end the run with a [`GatewayError`]. Nothing is mutated
//! before the quota stage, so a rejected request never touches the ledger
//! unless it got that far, and touches it at most once.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::{
    auth::{token_digest, AdminRegistry, CredentialValidator, IdentityClaim},
    error::GatewayError,
    gateway::envelope::RequestEnvelope,
    ledger::{QuotaKey, QuotaLedger, QuotaOutcome},
};

/// Which checks a route requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    /// Any caller with valid credentials
    Authenticated,
    /// Verified callers listed in the admin registry
    AdminOnly,
}

impl RouteGuard {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteGuard::Authenticated => "authenticated",
            RouteGuard::AdminOnly => "admin",
        }
    }
}

/// Pipeline progress, for logs and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    CredentialChecked,
    PolicyChecked,
    QuotaChecked,
    Forwarded,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::CredentialChecked => "credential_checked",
            PipelineStage::PolicyChecked => "policy_checked",
            PipelineStage::QuotaChecked => "quota_checked",
            PipelineStage::Forwarded => "forwarded",
        }
    }
}

/// Per-window request ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaCeilings {
    pub default: i64,
    pub admin: i64,
}

impl Default for QuotaCeilings {
    fn default() -> Self {
        Self {
            default: 100,
            admin: 100_000,
        }
    }
}

/// A request that passed every stage
#[derive(Debug, Clone)]
pub struct Admission {
    pub claim: IdentityClaim,
    pub is_admin: bool,
    pub quota: QuotaOutcome,
    /// Digest of the presented token, for revocation
    pub token_digest: String,
}

/// Composes validator, admin registry and ledger into the request gate
///
/// Holds no mutable state of its own; share it behind an `Arc`.
pub struct GatewayPipeline {
    validator: CredentialValidator,
    admins: Arc<AdminRegistry>,
    ledger: Arc<dyn QuotaLedger>,
    ceilings: QuotaCeilings,
    ledger_timeout: Duration,
}

impl GatewayPipeline {
    pub fn new(
        validator: CredentialValidator,
        admins: Arc<AdminRegistry>,
        ledger: Arc<dyn QuotaLedger>,
        ceilings: QuotaCeilings,
        ledger_timeout: Duration,
    ) -> Self {
        Self {
            validator,
            admins,
            ledger,
            ceilings,
            ledger_timeout,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn QuotaLedger> {
        &self.ledger
    }

    pub fn admins(&self) -> &AdminRegistry {
        &self.admins
    }

    pub fn validator(&self) -> &CredentialValidator {
        &self.validator
    }

    pub fn ceilings(&self) -> QuotaCeilings {
        self.ceilings
    }

    /// Deadline for a request starting now
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.ledger_timeout
    }

    /// Ceiling applied to `email`
    pub fn ceiling_for(&self, email: &str) -> i64 {
        if self.admins.is_admin(email) {
            self.ceilings.admin
        } else {
            self.ceilings.default
        }
    }

    /// Run every stage for `envelope`; `Ok` means forward to the handler
    pub async fn run(
        &self,
        envelope: &RequestEnvelope,
        guard: RouteGuard,
        deadline: Instant,
    ) -> Result<Admission, GatewayError> {
        debug!(stage = PipelineStage::Received.as_str(), ?envelope);

        let claim = tokio::time::timeout_at(
            deadline,
            self.validator.authenticate(&envelope.email, &envelope.token),
        )
        .await
        .map_err(|_| {
            warn!("Credential check timed out");
            GatewayError::InvalidCredential
        })?
        .ok_or(GatewayError::InvalidCredential)?;
        debug!(stage = PipelineStage::CredentialChecked.as_str(), email = %claim.email);

        if guard == RouteGuard::AdminOnly {
            self.check_admin(&claim)?;
            debug!(stage = PipelineStage::PolicyChecked.as_str(), email = %claim.email);
        }

        let quota = self.check_quota(&envelope.path, &claim.email, deadline).await?;
        debug!(
            stage = PipelineStage::QuotaChecked.as_str(),
            current = quota.current,
            limit = quota.limit
        );

        Ok(Admission {
            is_admin: self.admins.is_admin(&claim.email),
            token_digest: token_digest(&envelope.token),
            claim,
            quota,
        })
    }

    /// Admin policy: the decoded claim, never the wire email, decides
    fn check_admin(&self, claim: &IdentityClaim) -> Result<(), GatewayError> {
        if !claim.verified {
            return Err(GatewayError::Unverified);
        }
        if !self.admins.is_admin(&claim.email) {
            return Err(GatewayError::NotAuthorized);
        }
        Ok(())
    }

    async fn check_quota(
        &self,
        path: &str,
        email: &str,
        deadline: Instant,
    ) -> Result<QuotaOutcome, GatewayError> {
        let key = QuotaKey::new(path, email);
        let ceiling = self.ceiling_for(email);

        let outcome = tokio::time::timeout_at(
            deadline,
            self.ledger.increment_and_check(&key, ceiling, deadline),
        )
        .await;

        match outcome {
            Ok(Ok(outcome)) if outcome.allowed => Ok(outcome),
            Ok(Ok(outcome)) => Err(GatewayError::QuotaExceeded(outcome)),
            Ok(Err(e)) => {
                error!(key = %key, backend = self.ledger.backend(), error = %e, "Quota ledger call failed");
                Err(GatewayError::LedgerUnavailable(e.to_string()))
            }
            Err(_) => {
                error!(key = %key, backend = self.ledger.backend(), "Quota ledger call timed out");
                Err(GatewayError::LedgerUnavailable(
                    "deadline elapsed".to_string(),
                ))
            }
        }
    }
}
