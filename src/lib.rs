//! Ishkul gateway - authenticated, rate-limited request gateway
//!
//! This library provides the middleware chain every guarded API request
//! passes through: credential validation, admin policy and per-user quota
//! enforcement, in that order, failing closed at every step.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod routes;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::info;

pub use crate::auth::{
    AdminRegistry, CredentialValidator, InMemoryRevocationList, JwtAuthority, RedisRevocationList,
    RevocationList, TokenAuthority,
};
pub use crate::config::{Config, LedgerBackend};
pub use crate::gateway::{Gate, GatewayPipeline, QuotaCeilings, RouteGuard};
pub use crate::ledger::{InMemoryLedger, QuotaLedger, RedisLedger};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Signs and verifies identity tokens
    pub authority: Arc<dyn TokenAuthority>,
    /// Credential, admin and quota checks
    pub pipeline: Arc<GatewayPipeline>,
}

impl AppState {
    /// Create a new application state
    pub async fn new(config: Config) -> Result<Self> {
        let authority: Arc<dyn TokenAuthority> =
            Arc::new(JwtAuthority::new(&config.jwt_secret, config.token_ttl_hours));

        let (ledger, revocations): (Arc<dyn QuotaLedger>, Arc<dyn RevocationList>) =
            match config.ledger_backend {
                LedgerBackend::Redis => {
                    // One Redis connection shared by quota counters and revocations
                    let redis_client = redis::Client::open(config.redis_url.as_str())?;
                    let conn = redis::aio::ConnectionManager::new(redis_client).await?;
                    (
                        Arc::new(RedisLedger::new(conn.clone(), config.quota_window_seconds)),
                        Arc::new(RedisRevocationList::new(conn)),
                    )
                }
                LedgerBackend::Memory => (
                    Arc::new(InMemoryLedger::new(config.quota_window_seconds)),
                    Arc::new(InMemoryRevocationList::new()),
                ),
            };
        info!(
            ledger = ledger.backend(),
            revocations = revocations.backend(),
            "Quota ledger and revocation list initialized"
        );

        Ok(Self::from_parts(config, authority, ledger, revocations))
    }

    /// Assemble state from already-built collaborators
    ///
    /// Used by `new` and by tests that substitute the authority, ledger or
    /// revocation list.
    pub fn from_parts(
        config: Config,
        authority: Arc<dyn TokenAuthority>,
        ledger: Arc<dyn QuotaLedger>,
        revocations: Arc<dyn RevocationList>,
    ) -> Self {
        let validator = CredentialValidator::new(
            authority.clone(),
            revocations,
            config.require_verified_account,
        );
        let admins = Arc::new(AdminRegistry::from_emails(config.admin_emails.iter().cloned()));
        let ceilings = QuotaCeilings {
            default: config.default_quota_ceiling,
            admin: config.admin_quota_ceiling,
        };

        let pipeline = Arc::new(GatewayPipeline::new(
            validator,
            admins,
            ledger,
            ceilings,
            Duration::from_millis(config.ledger_timeout_ms),
        ));

        Self {
            config,
            start_time: Instant::now(),
            authority,
            pipeline,
        }
    }

    /// Middleware state for routes with the given guard
    pub fn gate(&self, guard: RouteGuard) -> Gate {
        Gate::new(self.pipeline.clone(), guard, self.config.max_body_bytes)
    }
}
