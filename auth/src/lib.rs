//! Authentication primitives library
//!
//! Provides the stateless building blocks of bearer-token authentication:
//! - Password hashing and verification (Argon2id, configurable cost)
//! - Signed token encoding and verification (JWT, HS256 only)
//! - One-way token digests for indexing persisted tokens
//! - `Authorization: Bearer` header parsing
//!
//! Persistence, revocation and expiry policy belong to the service using these.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other", &hash));
//! ```
//!
//! ## JWT Tokens
//! ```
//! use auth::{JwtHandler, TokenClaims};
//! use chrono::{Duration, Utc};
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!");
//! let now = Utc::now();
//! let claims = TokenClaims::for_user(1, "a@example.com", "user", now, now + Duration::hours(1));
//! let token = handler.encode(&claims).unwrap();
//! let decoded: TokenClaims = handler.decode(&token).unwrap();
//! assert_eq!(decoded.user_id, 1);
//! ```
//!
//! ## Bearer Header
//! ```
//! use auth::extract_bearer_token;
//!
//! assert_eq!(extract_bearer_token(Some("Bearer abc")), Ok("abc"));
//! assert!(extract_bearer_token(Some("Token abc")).is_err());
//! ```

pub mod bearer;
pub mod digest;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use bearer::extract_bearer_token;
pub use bearer::BearerError;
pub use digest::digest_token;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenClaims;
pub use password::PasswordCost;
pub use password::PasswordError;
pub use password::PasswordHasher;
