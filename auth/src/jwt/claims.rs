use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried inside an access token.
///
/// Identity fields (`user_id`, `email`, `role`, `expiry`) sit next to the
/// RFC 7519 registered claims. `sub` mirrors the email and `exp` mirrors `expiry`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: i64,
    pub email: String,
    pub role: String,

    /// Expiration instant (RFC 3339)
    pub expiry: DateTime<Utc>,

    /// Subject
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Token identifier, distinguishes tokens issued within the same second
    #[serde(default)]
    pub jti: String,
}

impl TokenClaims {
    /// Create claims for a user, valid from `issued_at` until `expires_at`.
    ///
    /// Issuer and audience start empty; set them with the builder methods.
    pub fn for_user(
        user_id: i64,
        email: impl ToString,
        role: impl ToString,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let email = email.to_string();

        Self {
            user_id,
            sub: email.clone(),
            email,
            role: role.to_string(),
            expiry: expires_at,
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            iss: String::new(),
            aud: String::new(),
            jti: String::new(),
        }
    }

    /// Set issuer.
    pub fn with_issuer(mut self, iss: impl ToString) -> Self {
        self.iss = iss.to_string();
        self
    }

    /// Set audience.
    pub fn with_audience(mut self, aud: impl ToString) -> Self {
        self.aud = aud.to_string();
        self
    }

    /// Set token identifier.
    pub fn with_token_id(mut self, jti: impl ToString) -> Self {
        self.jti = jti.to_string();
        self
    }

    /// Check if the token is expired at `now`.
    ///
    /// The expiry instant itself is still valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry
    }

    /// Check if the token is used before its `nbf` claim.
    pub fn is_premature(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() < self.nbf
    }
}
