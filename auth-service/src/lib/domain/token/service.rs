use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use auth::digest_token;
use auth::JwtError;
use auth::JwtHandler;
use auth::TokenClaims;
use chrono::DateTime;
use chrono::Duration;
use chrono::SubsecRound;
use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::domain::token::errors::StoreError;
use crate::domain::token::errors::TokenError;
use crate::domain::token::models::IssuedCredential;
use crate::domain::token::models::IssuedToken;
use crate::domain::token::models::VerifiedIdentity;
use crate::domain::token::ports::CredentialStore;
use crate::domain::token::ports::TokenServicePort;
use crate::domain::user::models::UserId;

/// Issuance and validation parameters.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub token_duration: Duration,
    pub store_timeout: StdDuration,
    pub issuer: String,
    pub audience: String,
}

/// Domain service implementation for token operations.
///
/// A token is valid only while its signature verifies AND its record is present,
/// unexpired and consistent with the signed claims. Issuing for a user deletes
/// the user's previous records before inserting the new one; the two steps run
/// under a per-user lock so concurrent issuances for one user are serialized.
pub struct TokenService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    codec: JwtHandler,
    settings: TokenSettings,
    user_locks: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

impl<CS> TokenService<CS>
where
    CS: CredentialStore,
{
    /// Create a new token service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Token persistence implementation
    /// * `secret` - HMAC signing secret; may be empty, in which case every
    ///   issuance and validation fails with `Configuration`
    /// * `settings` - Lifetime, store timeout, issuer and audience
    pub fn new(store: Arc<CS>, secret: &str, settings: TokenSettings) -> Self {
        let codec = JwtHandler::new(secret)
            .with_issuer(&settings.issuer)
            .with_audience(&settings.audience);

        Self {
            store,
            codec,
            settings,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a token as of `now`.
    pub async fn issue_at(
        &self,
        user_id: UserId,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredential, TokenError> {
        // Whole seconds so signed and persisted expiry compare exactly
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at + self.settings.token_duration;

        let claims = TokenClaims::for_user(user_id.0, email, role, issued_at, expires_at)
            .with_issuer(&self.settings.issuer)
            .with_audience(&self.settings.audience)
            .with_token_id(Uuid::new_v4());

        let signed_value = self.codec.encode(&claims).map_err(|e| match e {
            JwtError::MissingSecret => TokenError::Configuration,
            other => TokenError::Signing(other),
        })?;

        let record = IssuedToken {
            user_id,
            email: email.to_string(),
            role: role.to_string(),
            token_hash: digest_token(&signed_value),
            expires_at,
            issued_at,
            updated_at: issued_at,
        };

        let lock = self.user_lock(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.supersede(&record).await
        };
        self.release_user_lock(user_id, lock);
        result?;

        tracing::info!(
            user_id = %user_id,
            token_hash = record.hash_prefix(),
            expires_at = %expires_at,
            "Token issued"
        );

        Ok(IssuedCredential {
            signed_value,
            expires_at,
        })
    }

    /// Validate a token as of `now`.
    pub async fn validate_at(
        &self,
        signed_value: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedIdentity, TokenError> {
        let claims: TokenClaims = self.codec.decode(signed_value).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected by codec");
            TokenError::from(e)
        })?;

        if claims.is_premature(now) {
            return Err(TokenError::InvalidToken(JwtError::InvalidClaims(
                "token used before its not-before time".to_string(),
            )));
        }

        // Clock check first: catches staleness even when a delete lags behind
        if claims.is_expired(now) {
            tracing::info!(user_id = claims.user_id, "Token expired");
            return Err(TokenError::TokenExpired);
        }

        let token_hash = digest_token(signed_value);
        let record = self
            .bounded("find_token_by_hash", self.store.find_token_by_hash(&token_hash))
            .await?
            .ok_or(TokenError::TokenNotFound)?;

        if record.user_id.0 != claims.user_id
            || record.email != claims.email
            || record.role != claims.role
            || record.expires_at != claims.expiry
            || now > record.expires_at
        {
            tracing::error!(
                user_id = claims.user_id,
                token_hash = record.hash_prefix(),
                "Persisted token inconsistent with signed claims"
            );
            return Err(TokenError::TokenInconsistent);
        }

        Ok(VerifiedIdentity {
            user_id: record.user_id,
            email: claims.email,
            role: claims.role,
        })
    }

    /// Delete the user's tokens, then insert the new record.
    async fn supersede(&self, record: &IssuedToken) -> Result<(), TokenError> {
        let superseded = self
            .bounded(
                "delete_tokens_by_user",
                self.store.delete_tokens_by_user(record.user_id),
            )
            .await?;

        if let Err(e) = self
            .bounded("insert_token", self.store.insert_token(record))
            .await
        {
            tracing::error!(
                user_id = %record.user_id,
                superseded,
                error = %e,
                "Prior tokens revoked but new token was not persisted"
            );
            return Err(e);
        }

        if superseded > 0 {
            tracing::debug!(user_id = %record.user_id, superseded, "Superseded prior tokens");
        }

        Ok(())
    }

    async fn revoke_locked(&self, user_id: UserId) -> Result<u64, TokenError> {
        let lock = self.user_lock(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.bounded("delete_tokens_by_user", self.store.delete_tokens_by_user(user_id))
                .await
        };
        self.release_user_lock(user_id, lock);
        result
    }

    /// Run a store call under the configured deadline.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, TokenError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.settings.store_timeout, call).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!(operation, error = %e, "Credential store operation failed");
                TokenError::from(e)
            }),
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.settings.store_timeout.as_millis() as u64,
                    "Credential store operation timed out"
                );
                Err(TokenError::StoreTimeout(operation))
            }
        }
    }

    fn user_lock(&self, user_id: UserId) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user_id).or_default())
    }

    /// Drop the table entry once nobody else holds or waits on it.
    fn release_user_lock(&self, user_id: UserId, lock: Arc<AsyncMutex<()>>) {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // One reference in the table, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&user_id);
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl<CS> TokenServicePort for TokenService<CS>
where
    CS: CredentialStore,
{
    async fn issue(
        &self,
        user_id: UserId,
        email: &str,
        role: &str,
    ) -> Result<IssuedCredential, TokenError> {
        self.issue_at(user_id, email, role, Utc::now()).await
    }

    async fn validate(&self, signed_value: &str) -> Result<VerifiedIdentity, TokenError> {
        self.validate_at(signed_value, Utc::now()).await
    }

    async fn revoke(&self, user_id: UserId) -> Result<(), TokenError> {
        let revoked = self.revoke_locked(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "Tokens revoked");
        Ok(())
    }

    async fn revoke_token(&self, signed_value: &str) -> Result<(), TokenError> {
        let token_hash = digest_token(signed_value);
        let record = self
            .bounded("find_token_by_hash", self.store.find_token_by_hash(&token_hash))
            .await?
            .ok_or(TokenError::TokenNotFound)?;

        self.revoke(record.user_id).await
    }
}

/// Extract the bearer token from a raw `Authorization` header value.
///
/// # Errors
/// * `MissingHeader` - Header absent or empty
/// * `MalformedHeader` - Not exactly `Bearer <token>`
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, TokenError> {
    auth::extract_bearer_token(header).map_err(TokenError::from)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::outbound::repositories::memory::InMemoryCredentialStore;

    const SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn insert_token(&self, token: &IssuedToken) -> Result<(), StoreError>;
            async fn delete_tokens_by_user(&self, user_id: UserId) -> Result<u64, StoreError>;
            async fn find_token_by_hash(&self, token_hash: &str) -> Result<Option<IssuedToken>, StoreError>;
        }
    }

    /// Store whose every call outlives any reasonable deadline.
    struct StalledCredentialStore;

    #[async_trait]
    impl CredentialStore for StalledCredentialStore {
        async fn insert_token(&self, _token: &IssuedToken) -> Result<(), StoreError> {
            tokio::time::sleep(StdDuration::from_secs(5)).await;
            Ok(())
        }

        async fn delete_tokens_by_user(&self, _user_id: UserId) -> Result<u64, StoreError> {
            tokio::time::sleep(StdDuration::from_secs(5)).await;
            Ok(0)
        }

        async fn find_token_by_hash(
            &self,
            _token_hash: &str,
        ) -> Result<Option<IssuedToken>, StoreError> {
            tokio::time::sleep(StdDuration::from_secs(5)).await;
            Ok(None)
        }
    }

    fn settings() -> TokenSettings {
        TokenSettings {
            token_duration: Duration::hours(1),
            store_timeout: StdDuration::from_millis(100),
            issuer: "test-issuer".to_string(),
            audience: "test-audience".to_string(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 9, 30, 0).unwrap()
    }

    fn in_memory_service() -> (TokenService<InMemoryCredentialStore>, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let service = TokenService::new(Arc::clone(&store), SECRET, settings());
        (service, store)
    }

    #[tokio::test]
    async fn test_issue_then_validate_round_trip() {
        let (service, _) = in_memory_service();

        for (id, email, role) in [
            (1, "a@example.com", "user"),
            (2, "b@example.com", "admin"),
            (i64::MAX, "c@example.com", "auditor"),
        ] {
            let credential = service
                .issue_at(UserId(id), email, role, t0())
                .await
                .expect("issue failed");

            let identity = service
                .validate_at(&credential.signed_value, t0())
                .await
                .expect("validate failed");

            assert_eq!(
                identity,
                VerifiedIdentity {
                    user_id: UserId(id),
                    email: email.to_string(),
                    role: role.to_string(),
                }
            );
            assert_eq!(credential.expires_at, t0() + Duration::hours(1));
        }
    }

    #[tokio::test]
    async fn test_scenario_supersede_then_expire() {
        let (service, store) = in_memory_service();
        let user_id = UserId(1);

        let first = service
            .issue_at(user_id, "a@example.com", "user", t0())
            .await
            .unwrap();
        let identity = service.validate_at(&first.signed_value, t0()).await.unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email, "a@example.com");
        assert_eq!(identity.role, "user");

        let later = t0() + Duration::seconds(5);
        let second = service
            .issue_at(user_id, "a@example.com", "user", later)
            .await
            .unwrap();
        assert_ne!(first.signed_value, second.signed_value);

        assert_eq!(
            service.validate_at(&first.signed_value, later).await,
            Err(TokenError::TokenNotFound)
        );
        assert!(service.validate_at(&second.signed_value, later).await.is_ok());
        assert_eq!(store.count_for_user(user_id).await, 1);

        let past_expiry = later + Duration::hours(1) + Duration::seconds(1);
        assert_eq!(
            service.validate_at(&second.signed_value, past_expiry).await,
            Err(TokenError::TokenExpired)
        );
    }

    #[tokio::test]
    async fn test_valid_until_expiry_instant() {
        let (service, _) = in_memory_service();

        let credential = service
            .issue_at(UserId(3), "a@example.com", "user", t0())
            .await
            .unwrap();

        assert!(service
            .validate_at(&credential.signed_value, credential.expires_at)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_expired_token_checked_before_store() {
        let mut store = MockTestCredentialStore::new();
        store.expect_delete_tokens_by_user().returning(|_| Ok(0));
        store.expect_insert_token().returning(|_| Ok(()));
        store.expect_find_token_by_hash().times(0);

        let service = TokenService::new(Arc::new(store), SECRET, settings());
        let credential = service
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await
            .unwrap();

        let result = service
            .validate_at(&credential.signed_value, t0() + Duration::hours(2))
            .await;
        assert_eq!(result, Err(TokenError::TokenExpired));
    }

    #[tokio::test]
    async fn test_premature_token_rejected() {
        let (service, _) = in_memory_service();

        let credential = service
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await
            .unwrap();

        let result = service
            .validate_at(&credential.signed_value, t0() - Duration::minutes(1))
            .await;
        assert!(matches!(
            result,
            Err(TokenError::InvalidToken(JwtError::InvalidClaims(_)))
        ));
    }

    #[tokio::test]
    async fn test_tampered_signature_never_validates() {
        let (service, _) = in_memory_service();

        let credential = service
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await
            .unwrap();
        let token = credential.signed_value;
        let signature_start = token.rfind('.').unwrap() + 1;

        for position in signature_start..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[position] = if bytes[position] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            let result = service.validate_at(&tampered, t0()).await;
            assert!(
                matches!(result, Err(TokenError::InvalidToken(_))),
                "tampering at {position} gave {result:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_rejected() {
        let (service, _) = in_memory_service();
        let other = TokenService::new(
            Arc::new(InMemoryCredentialStore::new()),
            "another-secret-key-for-jwt-signing-32-bytes",
            settings(),
        );

        let credential = other
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await
            .unwrap();

        assert_eq!(
            service.validate_at(&credential.signed_value, t0()).await,
            Err(TokenError::InvalidToken(JwtError::InvalidSignature))
        );
    }

    #[tokio::test]
    async fn test_revoke() {
        let (service, store) = in_memory_service();

        let credential = service
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await
            .unwrap();
        let other_user = service
            .issue_at(UserId(2), "b@example.com", "user", t0())
            .await
            .unwrap();

        service.revoke(UserId(1)).await.unwrap();

        assert_eq!(
            service.validate_at(&credential.signed_value, t0()).await,
            Err(TokenError::TokenNotFound)
        );
        assert!(service.validate_at(&other_user.signed_value, t0()).await.is_ok());
        assert_eq!(store.count_for_user(UserId(1)).await, 0);
    }

    #[tokio::test]
    async fn test_revoke_by_token_value() {
        let (service, _) = in_memory_service();

        let credential = service
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await
            .unwrap();

        service.revoke_token(&credential.signed_value).await.unwrap();
        assert_eq!(
            service.validate_at(&credential.signed_value, t0()).await,
            Err(TokenError::TokenNotFound)
        );
        assert_eq!(
            service.revoke_token(&credential.signed_value).await,
            Err(TokenError::TokenNotFound)
        );
    }

    #[tokio::test]
    async fn test_inconsistent_record_rejected() {
        let (service, store) = in_memory_service();

        let credential = service
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await
            .unwrap();

        let token_hash = digest_token(&credential.signed_value);
        let mut doctored = store
            .find_token_by_hash(&token_hash)
            .await
            .unwrap()
            .unwrap();
        doctored.role = "admin".to_string();
        store.delete_tokens_by_user(UserId(1)).await.unwrap();
        store.insert_token(&doctored).await.unwrap();

        assert_eq!(
            service.validate_at(&credential.signed_value, t0()).await,
            Err(TokenError::TokenInconsistent)
        );
    }

    #[tokio::test]
    async fn test_missing_secret_is_configuration_error() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let service = TokenService::new(Arc::clone(&store), "", settings());

        assert_eq!(
            service
                .issue_at(UserId(1), "a@example.com", "user", t0())
                .await,
            Err(TokenError::Configuration)
        );
        assert_eq!(store.count_for_user(UserId(1)).await, 0);

        let (signer, _) = in_memory_service();
        let credential = signer
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await
            .unwrap();
        assert_eq!(
            service.validate_at(&credential.signed_value, t0()).await,
            Err(TokenError::Configuration)
        );
    }

    #[tokio::test]
    async fn test_issue_deletes_before_insert() {
        let mut store = MockTestCredentialStore::new();
        let mut sequence = mockall::Sequence::new();

        store
            .expect_delete_tokens_by_user()
            .with(eq(UserId(42)))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(1));
        store
            .expect_insert_token()
            .withf(|token| {
                token.user_id == UserId(42)
                    && token.email == "a@example.com"
                    && token.role == "user"
                    && token.token_hash.len() == 64
            })
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));

        let service = TokenService::new(Arc::new(store), SECRET, settings());
        let credential = service
            .issue_at(UserId(42), "a@example.com", "user", t0())
            .await
            .unwrap();

        assert_eq!(credential.expires_at, t0() + Duration::hours(1));
        assert_eq!(service.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn test_insert_failure_after_delete_is_reported() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_delete_tokens_by_user()
            .times(1)
            .returning(|_| Ok(1));
        store
            .expect_insert_token()
            .times(1)
            .returning(|_| Err(StoreError::Database("connection reset".to_string())));

        let service = TokenService::new(Arc::new(store), SECRET, settings());
        let result = service
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await;

        assert_eq!(
            result,
            Err(TokenError::Persistence(StoreError::Database(
                "connection reset".to_string()
            )))
        );
        assert_eq!(service.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn test_delete_failure_skips_insert() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_delete_tokens_by_user()
            .times(1)
            .returning(|_| Err(StoreError::Database("down".to_string())));
        store.expect_insert_token().times(0);

        let service = TokenService::new(Arc::new(store), SECRET, settings());
        let result = service
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await;

        assert!(matches!(result, Err(TokenError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_store_lookup_failure_is_not_not_found() {
        let mut store = MockTestCredentialStore::new();
        store.expect_delete_tokens_by_user().returning(|_| Ok(0));
        store.expect_insert_token().returning(|_| Ok(()));
        store
            .expect_find_token_by_hash()
            .times(1)
            .returning(|_| Err(StoreError::Database("down".to_string())));

        let service = TokenService::new(Arc::new(store), SECRET, settings());
        let credential = service
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await
            .unwrap();

        let result = service.validate_at(&credential.signed_value, t0()).await;
        assert!(matches!(result, Err(TokenError::Persistence(_))));
        assert!(result.unwrap_err().is_infrastructure());
    }

    #[tokio::test]
    async fn test_store_timeout() {
        let service = TokenService::new(Arc::new(StalledCredentialStore), SECRET, settings());

        assert_eq!(
            service
                .issue_at(UserId(1), "a@example.com", "user", t0())
                .await,
            Err(TokenError::StoreTimeout("delete_tokens_by_user"))
        );
        assert_eq!(
            service.revoke(UserId(1)).await,
            Err(TokenError::StoreTimeout("delete_tokens_by_user"))
        );

        let (signer, _) = in_memory_service();
        let credential = signer
            .issue_at(UserId(1), "a@example.com", "user", t0())
            .await
            .unwrap();
        assert_eq!(
            service.validate_at(&credential.signed_value, t0()).await,
            Err(TokenError::StoreTimeout("find_token_by_hash"))
        );
    }

    #[tokio::test]
    async fn test_concurrent_issuance_leaves_single_live_token() {
        let (service, store) = in_memory_service();
        let service = Arc::new(service);
        let user_id = UserId(7);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .issue_at(user_id, "a@example.com", "user", t0() + Duration::seconds(i))
                        .await
                })
            })
            .collect();

        let mut credentials = Vec::new();
        for handle in handles {
            credentials.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(store.count_for_user(user_id).await, 1);

        let now = t0() + Duration::seconds(30);
        let mut live = 0;
        for credential in &credentials {
            if service.validate_at(&credential.signed_value, now).await.is_ok() {
                live += 1;
            }
        }
        assert_eq!(live, 1);
        assert_eq!(service.tracked_locks(), 0);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer_token(None), Err(TokenError::MissingHeader));
        assert_eq!(extract_bearer_token(Some("")), Err(TokenError::MissingHeader));
        assert_eq!(
            extract_bearer_token(Some("Token abc")),
            Err(TokenError::MalformedHeader)
        );
        assert_eq!(
            extract_bearer_token(Some("Bearer")),
            Err(TokenError::MalformedHeader)
        );
    }
}
