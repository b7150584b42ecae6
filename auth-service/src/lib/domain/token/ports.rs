use async_trait::async_trait;

use crate::domain::token::errors::StoreError;
use crate::domain::token::errors::TokenError;
use crate::domain::token::models::IssuedCredential;
use crate::domain::token::models::IssuedToken;
use crate::domain::token::models::VerifiedIdentity;
use crate::domain::user::models::UserId;

/// Port for token lifecycle operations.
#[async_trait]
pub trait TokenServicePort: Send + Sync + 'static {
    /// Issue a token for a user, superseding every token previously issued to them.
    ///
    /// # Returns
    /// Signed token and its expiration instant
    ///
    /// # Errors
    /// * `Configuration` - Signing secret missing
    /// * `StoreTimeout` - A store call exceeded its deadline
    /// * `Persistence` - Store failure; if raised after the prior tokens were
    ///   deleted the user is left with no live token
    async fn issue(
        &self,
        user_id: UserId,
        email: &str,
        role: &str,
    ) -> Result<IssuedCredential, TokenError>;

    /// Validate a signed token against its signature and the persisted record.
    ///
    /// # Errors
    /// * `Configuration` - Signing secret missing
    /// * `InvalidToken` - Signature, framing or claims rejected
    /// * `TokenExpired` - Expiry has passed
    /// * `TokenNotFound` - Never issued, superseded or revoked
    /// * `TokenInconsistent` - Persisted record diverges from the signed claims
    /// * `StoreTimeout` / `Persistence` - Store failure
    async fn validate(&self, signed_value: &str) -> Result<VerifiedIdentity, TokenError>;

    /// Delete every token issued to a user.
    ///
    /// # Errors
    /// * `StoreTimeout` / `Persistence` - Store failure
    async fn revoke(&self, user_id: UserId) -> Result<(), TokenError>;

    /// Revoke the tokens of whichever user holds this signed value.
    ///
    /// # Errors
    /// * `TokenNotFound` - No persisted record for this value
    /// * `StoreTimeout` / `Persistence` - Store failure
    async fn revoke_token(&self, signed_value: &str) -> Result<(), TokenError>;
}

/// Persistence operations for issued tokens.
///
/// Lookups return `Ok(None)` for absent records; `Err` is reserved for store failures.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist a new token record.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn insert_token(&self, token: &IssuedToken) -> Result<(), StoreError>;

    /// Delete every token record of a user.
    ///
    /// # Returns
    /// Number of deleted records
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn delete_tokens_by_user(&self, user_id: UserId) -> Result<u64, StoreError>;

    /// Retrieve a token record by the digest of its signed value.
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn find_token_by_hash(&self, token_hash: &str)
        -> Result<Option<IssuedToken>, StoreError>;
}
