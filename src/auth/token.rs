//! Token authority
//!
//! Signs and verifies HS256 identity tokens. Signature and expiry checks are
//! the authority's job; callers only see a claim or a [`DecodeError`].

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use super::claims::IdentityClaim;

/// Why a token could not be turned into a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed token")]
    Malformed,

    #[error("token expired")]
    Expired,

    #[error("token signature is not trusted")]
    Untrusted,
}

/// Failure to sign a token
#[derive(Debug, Error)]
#[error("failed to issue token: {0}")]
pub struct IssueError(String);

/// Issues and decodes signed identity tokens
pub trait TokenAuthority: Send + Sync {
    /// Verify signature and expiry, then return the embedded claim
    fn decode(&self, token: &str) -> Result<IdentityClaim, DecodeError>;

    /// Sign a fresh token for `email`
    fn issue(&self, email: &str, verified: bool) -> Result<String, IssueError>;
}

/// HS256 JWT authority backed by a shared secret
pub struct JwtAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl JwtAuthority {
    /// Create an authority signing with `secret`, issuing tokens valid for `ttl_hours`
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_seconds: (ttl_hours as i64).saturating_mul(3600),
        }
    }

    /// Sign an arbitrary claim
    pub fn sign(&self, claim: &IdentityClaim) -> Result<String, IssueError> {
        encode(&Header::new(Algorithm::HS256), claim, &self.encoding_key)
            .map_err(|e| IssueError(e.to_string()))
    }
}

impl TokenAuthority for JwtAuthority {
    fn decode(&self, token: &str) -> Result<IdentityClaim, DecodeError> {
        if token.is_empty() {
            return Err(DecodeError::Malformed);
        }

        decode::<IdentityClaim>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let err = match e.kind() {
                    ErrorKind::ExpiredSignature => DecodeError::Expired,
                    ErrorKind::InvalidSignature
                    | ErrorKind::InvalidAlgorithm
                    | ErrorKind::ImmatureSignature => DecodeError::Untrusted,
                    _ => DecodeError::Malformed,
                };
                debug!(
                    token_fingerprint = %token_fingerprint(token),
                    reason = %e,
                    "Token rejected"
                );
                err
            })
    }

    fn issue(&self, email: &str, verified: bool) -> Result<String, IssueError> {
        self.sign(&IdentityClaim::new(email, verified, self.ttl_seconds))
    }
}

/// Hex SHA-256 of a token; the key under which revocations are stored
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stable, non-reversible token identifier for logs
pub fn token_fingerprint(token: &str) -> String {
    let mut digest = token_digest(token);
    digest.truncate(16);
    digest
}
