//! Configuration management for the gateway
//!
//! Configuration is loaded from environment variables.

use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;

/// Longest accepted quota window: one year
pub const MAX_QUOTA_WINDOW_SECONDS: u64 = 366 * 24 * 3600;

/// Admin granted elevated quota when `ADMIN_EMAILS` is not set
pub const DEFAULT_ADMIN_EMAIL: &str = "mesbah.tanvir.cs@gmail.com";

/// Which quota ledger implementation to run with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
    Redis,
    Memory,
}

impl FromStr for LedgerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => bail!("Unknown LEDGER_BACKEND '{}'", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Redis connection URL
    pub redis_url: String,
    /// Quota ledger backend
    pub ledger_backend: LedgerBackend,

    /// HS256 secret used to sign and verify identity tokens
    pub jwt_secret: String,
    /// Lifetime of issued tokens (in hours)
    pub token_ttl_hours: u64,
    /// Reject unverified accounts at the credential stage
    pub require_verified_account: bool,

    /// Emails granted admin privileges
    pub admin_emails: Vec<String>,

    /// Ceiling for regular users per path per window
    pub default_quota_ceiling: i64,
    /// Ceiling for admins per path per window
    pub admin_quota_ceiling: i64,
    /// Quota window size (in seconds)
    pub quota_window_seconds: u64,
    /// Upper bound on a single ledger call (in milliseconds)
    pub ledger_timeout_ms: u64,

    /// Largest request body the gateway will buffer
    pub max_body_bytes: usize,

    /// Enable debug endpoints (development only)
    pub debug_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let admin_emails = lookup("ADMIN_EMAILS")
            .map(|raw| parse_email_list(&raw))
            .unwrap_or_else(|| vec![DEFAULT_ADMIN_EMAIL.to_string()]);

        let config = Self {
            host: var("GATEWAY_HOST", "0.0.0.0"),
            port: var("GATEWAY_PORT", "8080")
                .parse()
                .context("Invalid GATEWAY_PORT")?,

            redis_url: var("REDIS_URL", "redis://localhost:6379"),
            ledger_backend: var("LEDGER_BACKEND", "redis").parse()?,

            jwt_secret: lookup("JWT_SECRET").context("JWT_SECRET must be set")?,
            token_ttl_hours: var("TOKEN_TTL_HOURS", "24")
                .parse()
                .context("Invalid TOKEN_TTL_HOURS")?,
            require_verified_account: parse_flag(&var("REQUIRE_VERIFIED_ACCOUNT", "true")),

            admin_emails,

            default_quota_ceiling: var("DEFAULT_QUOTA_CEILING", "100")
                .parse()
                .context("Invalid DEFAULT_QUOTA_CEILING")?,
            admin_quota_ceiling: var("ADMIN_QUOTA_CEILING", "100000")
                .parse()
                .context("Invalid ADMIN_QUOTA_CEILING")?,
            quota_window_seconds: var("QUOTA_WINDOW_SECONDS", "86400")
                .parse()
                .context("Invalid QUOTA_WINDOW_SECONDS")?,
            ledger_timeout_ms: var("LEDGER_TIMEOUT_MS", "2000")
                .parse()
                .context("Invalid LEDGER_TIMEOUT_MS")?,

            max_body_bytes: var("MAX_BODY_BYTES", "10485760")
                .parse()
                .context("Invalid MAX_BODY_BYTES")?,

            debug_enabled: parse_flag(&var("GATEWAY_DEBUG", "false")),
        };

        if config.jwt_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if config.quota_window_seconds == 0 {
            bail!("QUOTA_WINDOW_SECONDS must be greater than zero");
        }
        if config.quota_window_seconds > MAX_QUOTA_WINDOW_SECONDS {
            bail!(
                "QUOTA_WINDOW_SECONDS must not exceed {}",
                MAX_QUOTA_WINDOW_SECONDS
            );
        }
        if config.default_quota_ceiling < 0 || config.admin_quota_ceiling < 0 {
            bail!("Quota ceilings must not be negative");
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1" | "yes")
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect()
}
