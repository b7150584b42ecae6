use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::UserId;

/// Durable record of an issued token.
///
/// Looked up by `token_hash`, the digest of the signed value. The signed value
/// itself is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub user_id: UserId,
    pub email: String,
    pub role: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IssuedToken {
    /// First eight characters of the hash, safe to log.
    pub fn hash_prefix(&self) -> &str {
        &self.token_hash[..8.min(self.token_hash.len())]
    }
}

/// Token handed back to the caller of a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub signed_value: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity extracted from a validated token.
///
/// Carries no secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: UserId,
    pub email: String,
    pub role: String,
}
