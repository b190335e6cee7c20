//! Product repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use dealshop_core::{NewProduct, Price, Product, ProductCategoryId, ProductId, ShopId};

use super::{PgStore, RepositoryError, conflict_on_unique};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product under an already-resolved slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken,
    /// `RepositoryError::NotFound` if the shop or category doesn't exist.
    async fn insert_product(
        &self,
        new: &NewProduct,
        slug: &str,
    ) -> Result<Product, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError>;

    /// Active products flagged as super deals, newest first.
    async fn list_super_deals(&self, limit: i64) -> Result<Vec<Product>, RepositoryError>;

    /// Products by id, in the order given. Unknown ids are skipped.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;
}

/// Product columns as stored; shared with the cart line join.
#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub category_id: Option<ProductCategoryId>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub base_price: Price,
    pub promotional_price: Price,
    pub promotion_start: Option<NaiveDate>,
    pub promotion_end: Option<NaiveDate>,
    pub stock: i32,
    pub super_deal: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            shop_id: row.shop_id,
            category_id: row.category_id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            base_price: row.base_price,
            promotional_price: row.promotional_price,
            promotion_start: row.promotion_start,
            promotion_end: row.promotion_end,
            stock: row.stock,
            super_deal: row.super_deal,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

pub(super) const PRODUCT_COLUMNS: &str = "p.id, p.shop_id, p.category_id, p.name, p.slug, p.description, \
     p.base_price, p.promotional_price, p.promotion_start, p.promotion_end, \
     p.stock, p.super_deal, p.active, p.created_at";

#[async_trait]
impl ProductRepository for PgStore {
    async fn insert_product(
        &self,
        new: &NewProduct,
        slug: &str,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO storefront.product AS p
                (shop_id, category_id, name, slug, description, base_price,
                 promotional_price, promotion_start, promotion_end, stock, super_deal)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(new.shop_id)
        .bind(new.category_id)
        .bind(&new.name)
        .bind(slug)
        .bind(&new.description)
        .bind(new.base_price)
        .bind(new.promotional_price)
        .bind(new.promotion_start)
        .bind(new.promotion_end)
        .bind(new.stock)
        .bind(new.super_deal)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            conflict_on_unique(e, "product slug")
        })?;

        Ok(row.into())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn list_super_deals(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM storefront.product p
            WHERE p.super_deal AND p.active
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw: Vec<i64> = ids.iter().map(ProductId::as_i64).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM storefront.product p
            JOIN UNNEST($1::BIGINT[]) WITH ORDINALITY AS wanted(id, pos) ON wanted.id = p.id
            ORDER BY wanted.pos
            "
        ))
        .bind(raw)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}
