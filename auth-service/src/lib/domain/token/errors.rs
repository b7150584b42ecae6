use auth::BearerError;
use auth::JwtError;
use thiserror::Error;

/// Failure reported by a credential store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Error for token issuance, validation and revocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Signing secret is not configured")]
    Configuration,

    #[error("Authorization header not provided")]
    MissingHeader,

    #[error("Invalid Authorization header format. Expected: Bearer <token>")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(JwtError),

    #[error("Failed to sign token: {0}")]
    Signing(JwtError),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token not found or revoked")]
    TokenNotFound,

    #[error("Persisted token does not match its claims")]
    TokenInconsistent,

    #[error("Credential store timed out during {0}")]
    StoreTimeout(&'static str),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl TokenError {
    /// Whether the failure comes from infrastructure rather than the presented credential.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            TokenError::Configuration
                | TokenError::Signing(_)
                | TokenError::StoreTimeout(_)
                | TokenError::Persistence(_)
        )
    }
}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MissingSecret => TokenError::Configuration,
            other => TokenError::InvalidToken(other),
        }
    }
}

impl From<BearerError> for TokenError {
    fn from(err: BearerError) -> Self {
        match err {
            BearerError::MissingHeader => TokenError::MissingHeader,
            BearerError::MalformedHeader => TokenError::MalformedHeader,
        }
    }
}
