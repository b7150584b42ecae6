use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::token::errors::StoreError;
use crate::domain::token::models::IssuedToken;
use crate::domain::token::ports::CredentialStore;
use crate::domain::user::models::UserId;

/// Token records in Postgres.
///
/// The `tokens` table holds at most one row per user (`tokens_user_id_key`),
/// so two processes racing on the same user cannot both keep a live token.
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    user_id: i64,
    email: String,
    role: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
    issued_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TokenRow> for IssuedToken {
    fn from(row: TokenRow) -> Self {
        IssuedToken {
            user_id: UserId(row.user_id),
            email: row.email,
            role: row.role,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            issued_at: row.issued_at,
            updated_at: row.updated_at,
        }
    }
}

fn database_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn insert_token(&self, token: &IssuedToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (user_id, email, role, token_hash, expires_at, issued_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(token.user_id.0)
        .bind(&token.email)
        .bind(&token.role)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.issued_at)
        .bind(token.updated_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn delete_tokens_by_user(&self, user_id: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn find_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<IssuedToken>, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT user_id, email, role, token_hash, expires_at, issued_at, updated_at
            FROM tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.map(IssuedToken::from))
    }
}
