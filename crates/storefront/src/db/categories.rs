//! Shop and product category repository.

use async_trait::async_trait;

use dealshop_core::{
    NewProductCategory, NewShopCategory, Product, ProductCategory, ProductCategoryId,
    ShopCategory, ShopCategoryId,
};

use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::{PgStore, RepositoryError, conflict_on_unique};

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    async fn create_shop_category(
        &self,
        new: &NewShopCategory,
    ) -> Result<ShopCategory, RepositoryError>;

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the shop category doesn't exist,
    /// `RepositoryError::Conflict` if it already has a category with this name.
    async fn create_product_category(
        &self,
        new: &NewProductCategory,
    ) -> Result<ProductCategory, RepositoryError>;

    /// Active shop categories by name.
    async fn list_shop_categories(&self) -> Result<Vec<ShopCategory>, RepositoryError>;

    /// Active product categories under `shop_category_id`, by name.
    async fn list_product_categories(
        &self,
        shop_category_id: ShopCategoryId,
    ) -> Result<Vec<ProductCategory>, RepositoryError>;

    /// Active products in a category, newest first.
    async fn list_products_in_category(
        &self,
        category_id: ProductCategoryId,
    ) -> Result<Vec<Product>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct ShopCategoryRow {
    id: ShopCategoryId,
    name: String,
    description: String,
    active: bool,
}

impl From<ShopCategoryRow> for ShopCategory {
    fn from(row: ShopCategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            active: row.active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductCategoryRow {
    id: ProductCategoryId,
    shop_category_id: ShopCategoryId,
    name: String,
    description: String,
    active: bool,
}

impl From<ProductCategoryRow> for ProductCategory {
    fn from(row: ProductCategoryRow) -> Self {
        Self {
            id: row.id,
            shop_category_id: row.shop_category_id,
            name: row.name,
            description: row.description,
            active: row.active,
        }
    }
}

#[async_trait]
impl CategoryRepository for PgStore {
    async fn create_shop_category(
        &self,
        new: &NewShopCategory,
    ) -> Result<ShopCategory, RepositoryError> {
        let row = sqlx::query_as::<_, ShopCategoryRow>(
            r"
            INSERT INTO storefront.shop_category (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, active
            ",
        )
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "shop category"))?;

        Ok(row.into())
    }

    async fn create_product_category(
        &self,
        new: &NewProductCategory,
    ) -> Result<ProductCategory, RepositoryError> {
        let row = sqlx::query_as::<_, ProductCategoryRow>(
            r"
            INSERT INTO storefront.product_category (shop_category_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, shop_category_id, name, description, active
            ",
        )
        .bind(new.shop_category_id)
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            conflict_on_unique(e, "product category")
        })?;

        Ok(row.into())
    }

    async fn list_shop_categories(&self) -> Result<Vec<ShopCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShopCategoryRow>(
            r"
            SELECT id, name, description, active
            FROM storefront.shop_category
            WHERE active
            ORDER BY name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ShopCategory::from).collect())
    }

    async fn list_product_categories(
        &self,
        shop_category_id: ShopCategoryId,
    ) -> Result<Vec<ProductCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductCategoryRow>(
            r"
            SELECT id, shop_category_id, name, description, active
            FROM storefront.product_category
            WHERE shop_category_id = $1 AND active
            ORDER BY name
            ",
        )
        .bind(shop_category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductCategory::from).collect())
    }

    async fn list_products_in_category(
        &self,
        category_id: ProductCategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM storefront.product p
            WHERE p.category_id = $1 AND p.active
            ORDER BY p.created_at DESC, p.id DESC
            "
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
