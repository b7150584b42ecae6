use async_trait::async_trait;

use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::Session;
use crate::domain::user::models::User;
use crate::user::errors::UserError;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a new user with a hashed password.
    ///
    /// # Arguments
    /// * `command` - Validated command containing email, password and role
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `EmptyPassword` - Password is empty
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `StoreTimeout` - The user store missed its deadline
    /// * `DatabaseError` - Database operation failed
    async fn register_user(&self, command: RegisterUserCommand) -> Result<User, UserError>;

    /// Check credentials and issue a token superseding any previous one.
    ///
    /// # Returns
    /// The user and the issued credential
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password
    /// * `Token` - Issuance failed
    /// * `StoreTimeout` - The user store missed its deadline
    /// * `DatabaseError` - Database operation failed
    async fn authenticate_user(&self, command: LoginCommand) -> Result<Session, UserError>;

    /// Revoke the token presented on the current request.
    ///
    /// # Arguments
    /// * `signed_value` - Signed token taken from the bearer header
    ///
    /// # Errors
    /// * `Token` - The token is not stored or revocation failed
    async fn logout(&self, signed_value: &str) -> Result<(), UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Returns
    /// Created user entity with its store-assigned identifier
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// Retrieve user by email address.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
}
