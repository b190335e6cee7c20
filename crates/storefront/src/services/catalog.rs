//! Catalog service: shops, products and their categories.

use chrono::Utc;

use dealshop_core::slug::resolve_slug;
use dealshop_core::{
    NewProduct, NewProductCategory, NewShopCategory, Product, ProductCategory,
    ProductCategoryId, ShopCategory, ShopCategoryId,
};

use crate::db::{RepositoryError, Store};
use crate::models::{NewShop, Shop};

/// Number of super deals shown on the home page.
pub const HOME_SUPER_DEALS: i64 = 12;

pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Create a shop. A blank or missing slug is derived from the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an explicit slug is already taken.
    pub async fn create_shop(&self, new: &NewShop) -> Result<Shop, RepositoryError> {
        let slug = resolve_slug(new.slug.as_deref(), &new.name, Utc::now());
        let shop = self.store.insert_shop(new, &slug).await?;
        tracing::info!(shop_id = %shop.id, slug = %shop.slug, "shop created");
        Ok(shop)
    }

    /// Create a product. A blank or missing slug is derived from the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an explicit slug is already taken,
    /// `RepositoryError::NotFound` if the shop doesn't exist.
    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let slug = resolve_slug(new.slug.as_deref(), &new.name, Utc::now());
        let product = self.store.insert_product(new, &slug).await?;
        tracing::info!(product_id = %product.id, slug = %product.slug, "product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create_shop_category(
        &self,
        new: &NewShopCategory,
    ) -> Result<ShopCategory, RepositoryError> {
        let category = self.store.create_shop_category(new).await?;
        tracing::info!(shop_category_id = %category.id, name = %category.name, "shop category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the parent shop category doesn't
    /// exist, `RepositoryError::Conflict` if it already holds this name.
    pub async fn create_product_category(
        &self,
        new: &NewProductCategory,
    ) -> Result<ProductCategory, RepositoryError> {
        let category = self.store.create_product_category(new).await?;
        tracing::info!(
            product_category_id = %category.id,
            shop_category_id = %category.shop_category_id,
            name = %category.name,
            "product category created"
        );
        Ok(category)
    }

    pub async fn shop_categories(&self) -> Result<Vec<ShopCategory>, RepositoryError> {
        self.store.list_shop_categories().await
    }

    pub async fn product_categories(
        &self,
        shop_category_id: ShopCategoryId,
    ) -> Result<Vec<ProductCategory>, RepositoryError> {
        self.store.list_product_categories(shop_category_id).await
    }

    /// Active products filed under `category_id`, newest first.
    pub async fn products_in_category(
        &self,
        category_id: ProductCategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.store.list_products_in_category(category_id).await
    }

    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        self.store.find_product_by_slug(slug).await
    }

    /// Active products flagged as super deals, newest first.
    pub async fn super_deals(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        self.store.list_super_deals(limit).await
    }
}

#[cfg(test)]
mod tests {
    use dealshop_core::{Email, Price};

    use super::*;
    use crate::db::{MemoryStore, UserRepository};
    use crate::models::NewUser;

    async fn shop(store: &MemoryStore) -> Shop {
        let owner = store
            .create_user(
                &NewUser {
                    username: "owner".to_owned(),
                    email: Email::parse("owner@example.com").unwrap(),
                    first_name: String::new(),
                    last_name: String::new(),
                },
                "hash",
            )
            .await
            .unwrap();
        CatalogService::new(store)
            .create_shop(&NewShop {
                owner_id: owner.id,
                category_id: None,
                name: "Maquis Chez Tantie".to_owned(),
                slug: None,
                description: String::new(),
                city: "Abidjan".to_owned(),
                email: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_generated_slugs_are_unique() {
        let store = MemoryStore::new();
        let shop = shop(&store).await;
        assert!(shop.slug.starts_with("maquis-chez-tantie-"));

        let catalog = CatalogService::new(&store);
        let new = NewProduct::new(shop.id, "Garba Spécial", Price::new(1500));
        let first = catalog.create_product(&new).await.unwrap();
        let second = catalog.create_product(&new).await.unwrap();

        assert!(first.slug.starts_with("garba-special-"));
        assert_ne!(first.slug, second.slug);
    }

    #[tokio::test]
    async fn test_supplied_slug_is_kept() {
        let store = MemoryStore::new();
        let shop = shop(&store).await;
        let catalog = CatalogService::new(&store);

        let mut new = NewProduct::new(shop.id, "Alloco", Price::new(1000));
        new.slug = Some("alloco-maison".to_owned());
        let product = catalog.create_product(&new).await.unwrap();
        assert_eq!(product.slug, "alloco-maison");

        let found = catalog.product_by_slug("alloco-maison").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(product.id));

        let duplicate = catalog.create_product(&new).await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_product_category_requires_existing_parent() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let orphan = catalog
            .create_product_category(&NewProductCategory {
                shop_category_id: ShopCategoryId::new(404),
                name: "Grillades".to_owned(),
                description: String::new(),
            })
            .await;
        assert!(matches!(orphan, Err(RepositoryError::NotFound)));

        let shop = shop(&store).await;
        let unknown = catalog
            .create_product(
                &NewProduct::new(shop.id, "Brochettes", Price::new(2000))
                    .with_category(ProductCategoryId::new(404)),
            )
            .await;
        assert!(matches!(unknown, Err(RepositoryError::NotFound)));
    }
}
