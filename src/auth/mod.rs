//! Identity module
//!
//! Token decoding, revocation, credential validation and the admin registry.

pub mod admin;
pub mod claims;
pub mod revocation;
pub mod token;
pub mod validator;

pub use admin::AdminRegistry;
pub use claims::IdentityClaim;
pub use revocation::{
    InMemoryRevocationList, RedisRevocationList, RevocationError, RevocationList, RevocationReason,
};
pub use token::{token_digest, DecodeError, IssueError, JwtAuthority, TokenAuthority};
pub use validator::CredentialValidator;
