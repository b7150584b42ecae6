use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::token::models::IssuedCredential;
use crate::user::errors::EmailError;
use crate::user::errors::RoleError;

/// User aggregate entity.
///
/// Represents a registered user. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub uuid: Uuid,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User to be persisted, before the store assigns its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub uuid: Uuid,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Assign the store-generated identifier.
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            uuid: self.uuid,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Authorization role carried in tokens.
///
/// 1-32 characters, alphanumeric, underscore and hyphen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role(String);

impl Role {
    const MAX_LENGTH: usize = 32;
    pub const DEFAULT: &'static str = "user";

    /// Create a new valid role.
    ///
    /// # Errors
    /// * `Empty` - Role is empty
    /// * `TooLong` - Role longer than 32 characters
    /// * `InvalidCharacters` - Contains characters other than alphanumeric, _ and -
    pub fn new(role: String) -> Result<Self, RoleError> {
        if role.is_empty() {
            return Err(RoleError::Empty);
        }
        if role.len() > Self::MAX_LENGTH {
            return Err(RoleError::TooLong {
                max: Self::MAX_LENGTH,
                actual: role.len(),
            });
        }
        if !role
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(RoleError::InvalidCharacters);
        }
        Ok(Self(role))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Role {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Command to register a new user with domain types
#[derive(Debug)]
pub struct RegisterUserCommand {
    pub email: EmailAddress,
    pub password: String,
    pub role: Role,
}

impl RegisterUserCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `password` - Plain text password (will be hashed by service)
    /// * `role` - Validated role
    pub fn new(email: EmailAddress, password: String, role: Role) -> Self {
        Self {
            email,
            password,
            role,
        }
    }
}

/// Login attempt as received.
///
/// The email is deliberately not validated so malformed and unknown
/// addresses fail the same way.
#[derive(Debug)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

/// Successful login: the user and the freshly issued credential.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub credential: IssuedCredential,
}
