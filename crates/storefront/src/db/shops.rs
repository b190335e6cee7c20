//! Shop repository.

use async_trait::async_trait;

use dealshop_core::{Email, ShopCategoryId, ShopId, UserId};

use super::{PgStore, RepositoryError, conflict_on_unique, corrupt};
use crate::models::{NewShop, Shop};

#[async_trait]
pub trait ShopRepository: Send + Sync {
    /// Insert a shop under an already-resolved slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken,
    /// `RepositoryError::NotFound` if the owner or category doesn't exist.
    async fn insert_shop(&self, new: &NewShop, slug: &str) -> Result<Shop, RepositoryError>;

    async fn get_shop(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ShopRow {
    id: ShopId,
    owner_id: UserId,
    category_id: Option<ShopCategoryId>,
    name: String,
    slug: String,
    description: String,
    city: String,
    email: Option<String>,
    active: bool,
}

impl TryFrom<ShopRow> for Shop {
    type Error = RepositoryError;

    fn try_from(row: ShopRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| corrupt("shop email", e))?;
        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            category_id: row.category_id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            city: row.city,
            email,
            active: row.active,
        })
    }
}

const SHOP_COLUMNS: &str =
    "id, owner_id, category_id, name, slug, description, city, email, active";

#[async_trait]
impl ShopRepository for PgStore {
    async fn insert_shop(&self, new: &NewShop, slug: &str) -> Result<Shop, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            r"
            INSERT INTO storefront.shop
                (owner_id, category_id, name, slug, description, city, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SHOP_COLUMNS}
            "
        ))
        .bind(new.owner_id)
        .bind(new.category_id)
        .bind(&new.name)
        .bind(slug)
        .bind(&new.description)
        .bind(&new.city)
        .bind(new.email.as_ref().map(Email::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            conflict_on_unique(e, "shop slug")
        })?;

        Shop::try_from(row)
    }

    async fn get_shop(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError> {
        sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM storefront.shop WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Shop::try_from)
        .transpose()
    }
}
