use std::collections::HashMap;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::token::errors::StoreError;
use crate::domain::token::models::IssuedToken;
use crate::domain::token::ports::CredentialStore;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local token records, keyed by token hash.
///
/// Enforces the same uniqueness as the `tokens` table: one row per hash and
/// one row per user.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tokens: RwLock<HashMap<String, IssuedToken>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held for a user.
    pub async fn count_for_user(&self, user_id: UserId) -> usize {
        self.tokens
            .read()
            .await
            .values()
            .filter(|token| token.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert_token(&self, token: &IssuedToken) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(&token.token_hash) {
            return Err(StoreError::Database(
                "duplicate key value violates unique constraint \"tokens_token_hash_key\""
                    .to_string(),
            ));
        }
        if tokens.values().any(|t| t.user_id == token.user_id) {
            return Err(StoreError::Database(
                "duplicate key value violates unique constraint \"tokens_user_id_key\""
                    .to_string(),
            ));
        }

        tokens.insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn delete_tokens_by_user(&self, user_id: UserId) -> Result<u64, StoreError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| token.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }

    async fn find_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<IssuedToken>, StoreError> {
        Ok(self.tokens.read().await.get(token_hash).cloned())
    }
}

/// Process-local users, keyed by email.
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if users.contains_key(user.email.as_str()) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }

        let id = UserId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let user = user.into_user(id);
        users.insert(user.email.as_str().to_string(), user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self.users.read().await.get(email).cloned())
    }
}
