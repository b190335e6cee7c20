//! Favorite service.

use dealshop_core::{Favorite, Product, ProductId, UserId};

use crate::db::{RepositoryError, Store};

pub struct FavoriteService<'a> {
    store: &'a dyn Store,
}

impl<'a> FavoriteService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Bookmark a product. Adding the same product twice returns the existing
    /// favorite with `false`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(Favorite, bool), RepositoryError> {
        let (favorite, created) = self
            .store
            .find_or_insert_favorite(user_id, product_id)
            .await?;
        if created {
            tracing::debug!(user_id = %user_id, product_id = %product_id, "favorite added");
        }
        Ok((favorite, created))
    }

    /// Returns `false` if the product wasn't a favorite.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<bool, RepositoryError> {
        self.store.remove_favorite(user_id, product_id).await
    }

    /// The user's favorite products, most recently added first.
    pub async fn list_products(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let favorites = self.store.list_favorites(user_id).await?;
        let ids: Vec<ProductId> = favorites.iter().map(|f| f.product_id).collect();
        self.store.get_products(&ids).await
    }

    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        self.store.count_favorites(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use dealshop_core::{Email, NewProduct, Price};

    use super::*;
    use crate::db::{MemoryStore, UserRepository};
    use crate::models::{NewShop, NewUser};
    use crate::services::CatalogService;

    #[tokio::test]
    async fn test_add_twice_keeps_one_favorite() {
        let store = MemoryStore::new();
        let user = store
            .create_user(
                &NewUser {
                    username: "testuser".to_owned(),
                    email: Email::parse("test@example.com").unwrap(),
                    first_name: String::new(),
                    last_name: String::new(),
                },
                "hash",
            )
            .await
            .unwrap();
        let catalog = CatalogService::new(&store);
        let shop = catalog
            .create_shop(&NewShop {
                owner_id: user.id,
                category_id: None,
                name: "Boutique".to_owned(),
                slug: None,
                description: String::new(),
                city: "Abidjan".to_owned(),
                email: None,
            })
            .await
            .unwrap();
        let product = catalog
            .create_product(&NewProduct::new(shop.id, "Kedjenou", Price::new(5000)))
            .await
            .unwrap();

        let favorites = FavoriteService::new(&store);
        let (first, created) = favorites.add(user.id, product.id).await.unwrap();
        assert!(created);
        let (second, created) = favorites.add(user.id, product.id).await.unwrap();
        assert!(!created);

        assert_eq!(first.id, second.id);
        assert_eq!(favorites.count(user.id).await.unwrap(), 1);

        let products = favorites.list_products(user.id).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, product.id);

        assert!(favorites.remove(user.id, product.id).await.unwrap());
        assert!(!favorites.remove(user.id, product.id).await.unwrap());
    }
}
