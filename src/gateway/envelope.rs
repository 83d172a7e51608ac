//! Request envelope
//!
//! Typed view of the credential fields of a request body, parsed before any
//! security decision is made.

use std::fmt;

use serde::Deserialize;

use crate::{auth::token::token_fingerprint, error::GatewayError};

#[derive(Deserialize)]
struct EnvelopeBody {
    email: String,
    token: String,
}

/// Credentials and target of one inbound request
///
/// `email` is advisory until checked against the decoded token.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub email: String,
    pub token: String,
    pub path: String,
}

impl RequestEnvelope {
    /// Parse the JSON body of a request to `path`
    ///
    /// Fields other than `email` and `token` are ignored here; they stay in
    /// the body for the handler.
    pub fn parse(path: &str, body: &[u8]) -> Result<Self, GatewayError> {
        if body.is_empty() {
            return Err(GatewayError::MalformedRequest(
                "request body is empty".to_string(),
            ));
        }

        let parsed: EnvelopeBody = serde_json::from_slice(body)
            .map_err(|e| GatewayError::MalformedRequest(e.to_string()))?;

        if parsed.email.trim().is_empty() {
            return Err(GatewayError::MalformedRequest("email is empty".to_string()));
        }
        if parsed.token.is_empty() {
            return Err(GatewayError::MalformedRequest("token is empty".to_string()));
        }

        Ok(Self {
            email: parsed.email,
            token: parsed.token,
            path: path.to_string(),
        })
    }
}

impl fmt::Debug for RequestEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEnvelope")
            .field("email", &self.email)
            .field("token", &token_fingerprint(&self.token))
            .field("path", &self.path)
            .finish()
    }
}
