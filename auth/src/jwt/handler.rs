use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::JwtError;

/// JWT token handler for encoding and decoding tokens.
///
/// Signs with a single symmetric secret and accepts exactly one algorithm (HS256).
/// Tokens declaring any other algorithm in their header are rejected.
///
/// The secret is checked on every call rather than at construction, so a handler
/// built from incomplete configuration fails each operation with `MissingSecret`.
/// Clock-based claims (`exp`, `nbf`) are left to the caller.
#[derive(Clone)]
pub struct JwtHandler {
    secret: Vec<u8>,
    algorithm: Algorithm,
    issuer: Option<String>,
    audience: Option<String>,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            algorithm: Algorithm::HS256,
            issuer: None,
            audience: None,
        }
    }

    /// Require decoded tokens to carry this `iss` claim.
    pub fn with_issuer(mut self, issuer: impl ToString) -> Self {
        self.issuer = Some(issuer.to_string());
        self
    }

    /// Require decoded tokens to carry this `aud` claim.
    pub fn with_audience(mut self, audience: impl ToString) -> Self {
        self.audience = Some(audience.to_string());
        self
    }

    /// Encode and sign claims.
    ///
    /// # Errors
    /// * `MissingSecret` - No signing secret configured
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        self.ensure_secret()?;
        let header = Header::new(self.algorithm);

        encode(&header, claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify the signature and decode claims.
    ///
    /// # Errors
    /// * `MissingSecret` - No signing secret configured
    /// * `InvalidSignature` - Bad MAC or algorithm other than HS256
    /// * `MalformedToken` - Token framing, base64 or JSON is invalid
    /// * `InvalidClaims` - Issuer, audience or a required claim is wrong
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        self.ensure_secret()?;

        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<T>(token, &DecodingKey::from_secret(&self.secret), &validation)?;

        Ok(token_data.claims)
    }

    fn ensure_secret(&self) -> Result<(), JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }
        Ok(())
    }
}
