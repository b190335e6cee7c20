//! Favorite repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dealshop_core::{Favorite, FavoriteId, ProductId, UserId};

use super::{PgStore, RepositoryError};

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Return the existing favorite for `(user, product)` or create it.
    ///
    /// The flag is `true` only when a new row was inserted. Calling this twice
    /// yields the same favorite id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or product doesn't exist.
    async fn find_or_insert_favorite(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(Favorite, bool), RepositoryError>;

    /// Returns `false` if there was nothing to remove.
    async fn remove_favorite(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError>;

    /// A user's favorites, most recent first.
    async fn list_favorites(&self, user_id: UserId) -> Result<Vec<Favorite>, RepositoryError>;

    async fn count_favorites(&self, user_id: UserId) -> Result<i64, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    id: FavoriteId,
    user_id: UserId,
    product_id: ProductId,
    created_at: DateTime<Utc>,
}

impl From<FavoriteRow> for Favorite {
    fn from(row: FavoriteRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl FavoriteRepository for PgStore {
    async fn find_or_insert_favorite(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(Favorite, bool), RepositoryError> {
        let inserted = sqlx::query_as::<_, FavoriteRow>(
            r"
            INSERT INTO storefront.favorite (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            RETURNING id, user_id, product_id, created_at
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        if let Some(row) = inserted {
            return Ok((row.into(), true));
        }

        let existing = sqlx::query_as::<_, FavoriteRow>(
            r"
            SELECT id, user_id, product_id, created_at
            FROM storefront.favorite
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok((existing.into(), false))
    }

    async fn remove_favorite(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.favorite WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_favorites(&self, user_id: UserId) -> Result<Vec<Favorite>, RepositoryError> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            r"
            SELECT id, user_id, product_id, created_at
            FROM storefront.favorite
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Favorite::from).collect())
    }

    async fn count_favorites(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.favorite WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
