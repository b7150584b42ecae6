use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use auth::PasswordHasher;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::token::ports::TokenServicePort;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::Session;
use crate::domain::user::models::User;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR, TS>
where
    UR: UserRepository,
    TS: TokenServicePort,
{
    repository: Arc<UR>,
    token_service: Arc<TS>,
    password_hasher: PasswordHasher,
    store_timeout: StdDuration,
    /// Verified against on unknown emails so both login failures cost the same
    dummy_hash: String,
}

impl<UR, TS> UserService<UR, TS>
where
    UR: UserRepository,
    TS: TokenServicePort,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `token_service` - Token issuance and revocation
    /// * `password_hasher` - Password hasher with the configured cost
    /// * `store_timeout` - Deadline for every repository call
    ///
    /// # Errors
    /// * `Password` - The hasher could not produce the placeholder hash
    pub fn new(
        repository: Arc<UR>,
        token_service: Arc<TS>,
        password_hasher: PasswordHasher,
        store_timeout: StdDuration,
    ) -> Result<Self, UserError> {
        let dummy_hash = password_hasher.hash(&Uuid::new_v4().to_string())?;

        Ok(Self {
            repository,
            token_service,
            password_hasher,
            store_timeout,
            dummy_hash,
        })
    }

    async fn hash_password(&self, password: String) -> Result<String, UserError> {
        let hasher = self.password_hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| UserError::Unknown(format!("Password hashing task failed: {}", e)))?
            .map_err(UserError::from)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, UserError> {
        let hasher = self.password_hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| UserError::Unknown(format!("Password verification task failed: {}", e)))
    }

    /// Run a repository call under the configured deadline.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, UserError>
    where
        F: Future<Output = Result<T, UserError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "User repository operation timed out"
                );
                Err(UserError::StoreTimeout(operation))
            }
        }
    }
}

#[async_trait]
impl<UR, TS> UserServicePort for UserService<UR, TS>
where
    UR: UserRepository,
    TS: TokenServicePort,
{
    async fn register_user(&self, command: RegisterUserCommand) -> Result<User, UserError> {
        if command.password.is_empty() {
            return Err(UserError::EmptyPassword);
        }

        let password_hash = self.hash_password(command.password).await?;

        let user = NewUser {
            uuid: Uuid::new_v4(),
            email: command.email,
            password_hash,
            role: command.role,
            created_at: Utc::now(),
        };

        let created_user = self
            .bounded("create_user", self.repository.create(user))
            .await?;
        tracing::info!(user_id = %created_user.id, role = %created_user.role, "User registered");

        Ok(created_user)
    }

    async fn authenticate_user(&self, command: LoginCommand) -> Result<Session, UserError> {
        let user = self
            .bounded(
                "find_user_by_email",
                self.repository.find_by_email(&command.email),
            )
            .await?;

        let Some(user) = user else {
            self.verify_password(command.password, self.dummy_hash.clone())
                .await?;
            tracing::info!("Login rejected: unknown email");
            return Err(UserError::InvalidCredentials);
        };

        if !self
            .verify_password(command.password, user.password_hash.clone())
            .await?
        {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(UserError::InvalidCredentials);
        }

        let credential = self
            .token_service
            .issue(user.id, user.email.as_str(), user.role.as_str())
            .await?;

        Ok(Session { user, credential })
    }

    async fn logout(&self, signed_value: &str) -> Result<(), UserError> {
        self.token_service.revoke_token(signed_value).await?;
        Ok(())
    }
}
