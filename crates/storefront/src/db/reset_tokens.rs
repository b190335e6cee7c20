//! Password reset token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dealshop_core::{PasswordResetToken, ResetTokenId, UserId};

use super::{PgStore, RepositoryError, conflict_on_unique};

#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the token string collides.
    async fn create_reset_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<PasswordResetToken, RepositoryError>;

    async fn find_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, RepositoryError>;

    /// Delete every token belonging to `user_id`.
    async fn delete_reset_tokens(&self, user_id: UserId) -> Result<u64, RepositoryError>;

    /// Delete tokens of any user created strictly before `cutoff`.
    async fn delete_reset_tokens_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ResetTokenRow {
    id: ResetTokenId,
    user_id: UserId,
    token: String,
    created_at: DateTime<Utc>,
}

impl From<ResetTokenRow> for PasswordResetToken {
    fn from(row: ResetTokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            token: row.token,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ResetTokenRepository for PgStore {
    async fn create_reset_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<PasswordResetToken, RepositoryError> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r"
            INSERT INTO storefront.password_reset_token (user_id, token)
            VALUES ($1, $2)
            RETURNING id, user_id, token, created_at
            ",
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "reset token"))?;

        Ok(row.into())
    }

    async fn find_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, RepositoryError> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r"
            SELECT id, user_id, token, created_at
            FROM storefront.password_reset_token
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PasswordResetToken::from))
    }

    async fn delete_reset_tokens(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.password_reset_token WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_reset_tokens_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.password_reset_token WHERE created_at < $1")
                .bind(cutoff)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
