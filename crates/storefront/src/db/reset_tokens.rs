//! Password reset token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use fitroom_core::{ResetTokenId, UserId};

use super::{RepositoryError, ResetTokenStore};
use crate::models::ResetToken;

#[derive(sqlx::FromRow)]
struct ResetTokenRow {
    id: i32,
    user_id: i32,
    token_hash: String,
    expires_at: DateTime<Utc>,
}

impl From<ResetTokenRow> for ResetToken {
    fn from(row: ResetTokenRow) -> Self {
        Self {
            id: ResetTokenId::new(row.id),
            user_id: UserId::new(row.user_id),
            token_hash: row.token_hash,
            expires_at: row.expires_at,
        }
    }
}

/// `PostgreSQL` reset token store.
pub struct PgResetTokenStore {
    pool: PgPool,
}

impl PgResetTokenStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenStore for PgResetTokenStore {
    async fn replace_for_user(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ResetToken, RepositoryError> {
        // The UNIQUE(user_id) constraint keeps one token per user even when
        // requests race.
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r"
            INSERT INTO storefront.password_reset_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at,
                created_at = now()
            RETURNING id, user_id, token_hash, expires_at
            ",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_live(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, RepositoryError> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r"
            SELECT id, user_id, token_hash, expires_at
            FROM storefront.password_reset_tokens
            WHERE token_hash = $1 AND expires_at > $2
            ",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn consume(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, RepositoryError> {
        // A replaced row keeps its id, so the claim matches on the hash.
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r"
            DELETE FROM storefront.password_reset_tokens
            WHERE token_hash = $1 AND expires_at > $2
            RETURNING id, user_id, token_hash, expires_at
            ",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.password_reset_tokens WHERE expires_at <= $1")
                .bind(now)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
