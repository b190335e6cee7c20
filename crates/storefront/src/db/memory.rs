//! In-process store.
//!
//! Backs the app when `STOREFRONT_STORE=memory` and in tests. Enforces the
//! same uniqueness and foreign-key rules as the `PostgreSQL` schema so that
//! services behave identically on both backends.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use dealshop_core::{
    Cart, CartId, CartLine, CartLineId, Coupon, CouponId, CustomerId, Email, Favorite,
    FavoriteId, NewProduct, NewProductCategory, NewShopCategory, Order, OrderId,
    PasswordResetToken, PaymentStatus, Product, ProductCategory, ProductCategoryId, ProductId,
    ResetTokenId, ShopCategory, ShopCategoryId, ShopId, UserId,
};

use super::{
    CartRepository, CategoryRepository, CouponRepository, CustomerRepository, FavoriteRepository, NewCoupon,
    NewOrder, OrderRepository, ProductRepository, RepositoryError, ResetTokenRepository,
    ShopRepository, UserRepository,
};
use crate::models::{Customer, NewCustomer, NewShop, NewUser, Shop, User};

#[derive(Debug, Clone, Copy)]
struct CartRecord {
    customer_id: CustomerId,
    coupon_id: Option<CouponId>,
    active: bool,
}

#[derive(Debug, Clone, Copy)]
struct LineRecord {
    cart_id: CartId,
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<UserId, User>,
    passwords: HashMap<UserId, String>,
    customers: BTreeMap<CustomerId, Customer>,
    shop_categories: BTreeMap<ShopCategoryId, ShopCategory>,
    product_categories: BTreeMap<ProductCategoryId, ProductCategory>,
    shops: BTreeMap<ShopId, Shop>,
    products: BTreeMap<ProductId, Product>,
    coupons: BTreeMap<CouponId, Coupon>,
    carts: BTreeMap<CartId, CartRecord>,
    lines: BTreeMap<CartLineId, LineRecord>,
    favorites: BTreeMap<FavoriteId, Favorite>,
    orders: BTreeMap<OrderId, Order>,
    reset_tokens: BTreeMap<ResetTokenId, PasswordResetToken>,
}

impl Tables {
    /// One sequence shared by every table; ids stay unique across entities.
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn load_cart(&self, id: CartId) -> Option<Cart> {
        let record = self.carts.get(&id)?;
        let lines = self
            .lines
            .iter()
            .filter(|(_, line)| line.cart_id == id)
            .filter_map(|(line_id, line)| {
                let product = self.products.get(&line.product_id)?.clone();
                Some(CartLine {
                    id: *line_id,
                    cart_id: id,
                    product,
                    quantity: line.quantity,
                })
            })
            .collect();
        let coupon = record
            .coupon_id
            .and_then(|coupon_id| self.coupons.get(&coupon_id).cloned());

        Some(Cart {
            id,
            customer_id: record.customer_id,
            coupon,
            lines,
            active: record.active,
        })
    }
}

/// Thread-safe in-memory implementation of every repository trait.
///
/// Cloning shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reset token with an explicit creation time.
    ///
    /// Lets callers exercise expiry without waiting an hour.
    pub async fn insert_reset_token_at(
        &self,
        user_id: UserId,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> PasswordResetToken {
        let mut tables = self.tables.write().await;
        let reset = PasswordResetToken {
            id: ResetTokenId::new(tables.next_id()),
            user_id,
            token: token.to_owned(),
            created_at,
        };
        tables.reset_tokens.insert(reset.id, reset.clone());
        reset
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(
        &self,
        new: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Err(RepositoryError::Conflict(
                "username or email already exists".to_owned(),
            ));
        }

        let user = User {
            id: UserId::new(tables.next_id()),
            username: new.username.clone(),
            email: new.email.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        tables.passwords.insert(user.id, password_hash.to_owned());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        Ok(self.tables.read().await.passwords.get(&id).cloned())
    }

    async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        tables.passwords.insert(id, password_hash.to_owned());
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn create_customer(
        &self,
        user_id: UserId,
        new: &NewCustomer,
    ) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.customers.values().any(|c| c.user_id == user_id) {
            return Err(RepositoryError::Conflict(
                "customer profile already exists".to_owned(),
            ));
        }

        let customer = Customer {
            id: CustomerId::new(tables.next_id()),
            user_id,
            address: new.address.clone(),
            phone_primary: new.phone_primary.clone(),
            phone_secondary: new.phone_secondary.clone(),
            city: new.city.clone(),
            country: new.country.clone(),
            active: true,
        };
        tables.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn find_customer_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }
}

#[async_trait]
impl ShopRepository for MemoryStore {
    async fn insert_shop(&self, new: &NewShop, slug: &str) -> Result<Shop, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&new.owner_id)
            || new
                .category_id
                .is_some_and(|id| !tables.shop_categories.contains_key(&id))
        {
            return Err(RepositoryError::NotFound);
        }
        if tables.shops.values().any(|s| s.slug == slug) {
            return Err(RepositoryError::Conflict("shop slug already exists".to_owned()));
        }

        let shop = Shop {
            id: ShopId::new(tables.next_id()),
            owner_id: new.owner_id,
            category_id: new.category_id,
            name: new.name.clone(),
            slug: slug.to_owned(),
            description: new.description.clone(),
            city: new.city.clone(),
            email: new.email.clone(),
            active: true,
        };
        tables.shops.insert(shop.id, shop.clone());
        Ok(shop)
    }

    async fn get_shop(&self, id: ShopId) -> Result<Option<Shop>, RepositoryError> {
        Ok(self.tables.read().await.shops.get(&id).cloned())
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn create_shop_category(
        &self,
        new: &NewShopCategory,
    ) -> Result<ShopCategory, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.shop_categories.values().any(|c| c.name == new.name) {
            return Err(RepositoryError::Conflict(
                "shop category already exists".to_owned(),
            ));
        }

        let category = ShopCategory {
            id: ShopCategoryId::new(tables.next_id()),
            name: new.name.clone(),
            description: new.description.clone(),
            active: true,
        };
        tables.shop_categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn create_product_category(
        &self,
        new: &NewProductCategory,
    ) -> Result<ProductCategory, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.shop_categories.contains_key(&new.shop_category_id) {
            return Err(RepositoryError::NotFound);
        }
        if tables
            .product_categories
            .values()
            .any(|c| c.shop_category_id == new.shop_category_id && c.name == new.name)
        {
            return Err(RepositoryError::Conflict(
                "product category already exists".to_owned(),
            ));
        }

        let category = ProductCategory {
            id: ProductCategoryId::new(tables.next_id()),
            shop_category_id: new.shop_category_id,
            name: new.name.clone(),
            description: new.description.clone(),
            active: true,
        };
        tables.product_categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_shop_categories(&self) -> Result<Vec<ShopCategory>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<ShopCategory> = tables
            .shop_categories
            .values()
            .filter(|c| c.active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_product_categories(
        &self,
        shop_category_id: ShopCategoryId,
    ) -> Result<Vec<ProductCategory>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<ProductCategory> = tables
            .product_categories
            .values()
            .filter(|c| c.shop_category_id == shop_category_id && c.active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_products_in_category(
        &self,
        category_id: ProductCategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| p.category_id == Some(category_id) && p.active)
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(products)
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn insert_product(
        &self,
        new: &NewProduct,
        slug: &str,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.shops.contains_key(&new.shop_id)
            || new
                .category_id
                .is_some_and(|id| !tables.product_categories.contains_key(&id))
        {
            return Err(RepositoryError::NotFound);
        }
        if tables.products.values().any(|p| p.slug == slug) {
            return Err(RepositoryError::Conflict(
                "product slug already exists".to_owned(),
            ));
        }

        let product = Product {
            id: ProductId::new(tables.next_id()),
            shop_id: new.shop_id,
            category_id: new.category_id,
            name: new.name.clone(),
            slug: slug.to_owned(),
            description: new.description.clone(),
            base_price: new.base_price,
            promotional_price: new.promotional_price,
            promotion_start: new.promotion_start,
            promotion_end: new.promotion_end,
            stock: new.stock,
            super_deal: new.super_deal,
            active: true,
            created_at: Utc::now(),
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.products.values().find(|p| p.slug == slug).cloned())
    }

    async fn list_super_deals(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut deals: Vec<Product> = tables
            .products
            .values()
            .filter(|p| p.super_deal && p.active)
            .cloned()
            .collect();
        deals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        deals.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(deals)
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl CouponRepository for MemoryStore {
    async fn create_coupon(&self, new: &NewCoupon) -> Result<Coupon, RepositoryError> {
        let mut tables = self.tables.write().await;
        let code = Coupon::normalize_code(&new.code);
        if tables.coupons.values().any(|c| c.code == code) {
            return Err(RepositoryError::Conflict(
                "coupon code already exists".to_owned(),
            ));
        }

        let mut eligible_products: Vec<ProductId> = new
            .eligible_products
            .iter()
            .copied()
            .filter(|id| tables.products.contains_key(id))
            .collect();
        eligible_products.sort_unstable();
        eligible_products.dedup();

        let coupon = Coupon {
            id: CouponId::new(tables.next_id()),
            code,
            label: new.label.clone(),
            discount_ratio: new.discount_ratio,
            expiry_date: new.expiry_date,
            is_active: new.is_active,
            max_uses: new.max_uses,
            eligible_products,
        };
        tables.coupons.insert(coupon.id, coupon.clone());
        Ok(coupon)
    }

    async fn get_coupon(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        Ok(self.tables.read().await.coupons.get(&id).cloned())
    }

    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.coupons.values().find(|c| c.code == code).cloned())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_active_cart(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<Cart>, RepositoryError> {
        let tables = self.tables.read().await;
        let id = tables
            .carts
            .iter()
            .rev()
            .find(|(_, cart)| cart.customer_id == customer_id && cart.active)
            .map(|(id, _)| *id);
        Ok(id.and_then(|id| tables.load_cart(id)))
    }

    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.tables.read().await.load_cart(id))
    }

    async fn create_cart(&self, customer_id: CustomerId) -> Result<Cart, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&customer_id) {
            return Err(RepositoryError::NotFound);
        }
        let id = CartId::new(tables.next_id());
        tables.carts.insert(
            id,
            CartRecord {
                customer_id,
                coupon_id: None,
                active: true,
            },
        );
        Ok(Cart::new(id, customer_id))
    }

    async fn add_line(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.carts.contains_key(&cart_id) || !tables.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }

        if let Some(line) = tables
            .lines
            .values_mut()
            .find(|l| l.cart_id == cart_id && l.product_id == product_id)
        {
            line.quantity = line
                .quantity
                .saturating_add(quantity)
                .min(CartLine::MAX_QUANTITY);
            return Ok(());
        }

        let id = CartLineId::new(tables.next_id());
        tables.lines.insert(
            id,
            LineRecord {
                cart_id,
                product_id,
                quantity,
            },
        );
        Ok(())
    }

    async fn remove_line(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let belongs = tables
            .lines
            .get(&line_id)
            .is_some_and(|line| line.cart_id == cart_id);
        if belongs {
            tables.lines.remove(&line_id);
        }
        Ok(belongs)
    }

    async fn set_cart_coupon(
        &self,
        cart_id: CartId,
        coupon_id: Option<CouponId>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(id) = coupon_id
            && !tables.coupons.contains_key(&id)
        {
            return Err(RepositoryError::NotFound);
        }
        let cart = tables
            .carts
            .get_mut(&cart_id)
            .ok_or(RepositoryError::NotFound)?;
        cart.coupon_id = coupon_id;
        Ok(())
    }

    async fn deactivate_cart(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let cart = tables
            .carts
            .get_mut(&cart_id)
            .ok_or(RepositoryError::NotFound)?;
        cart.active = false;
        Ok(())
    }
}

#[async_trait]
impl FavoriteRepository for MemoryStore {
    async fn find_or_insert_favorite(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(Favorite, bool), RepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .favorites
            .values()
            .find(|f| f.user_id == user_id && f.product_id == product_id)
        {
            return Ok((existing.clone(), false));
        }
        if !tables.users.contains_key(&user_id) || !tables.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }

        let favorite = Favorite {
            id: FavoriteId::new(tables.next_id()),
            user_id,
            product_id,
            created_at: Utc::now(),
        };
        tables.favorites.insert(favorite.id, favorite.clone());
        Ok((favorite, true))
    }

    async fn remove_favorite(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let id = tables
            .favorites
            .values()
            .find(|f| f.user_id == user_id && f.product_id == product_id)
            .map(|f| f.id);
        Ok(id.is_some_and(|id| tables.favorites.remove(&id).is_some()))
    }

    async fn list_favorites(&self, user_id: UserId) -> Result<Vec<Favorite>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .favorites
            .values()
            .rev()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_favorites(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        let count = tables
            .favorites
            .values()
            .filter(|f| f.user_id == user_id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create_order(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&new.customer_id)
            || !tables.carts.contains_key(&new.cart_id)
        {
            return Err(RepositoryError::NotFound);
        }
        if tables
            .orders
            .values()
            .any(|o| o.transaction_id.as_deref() == Some(new.transaction_id.as_str()))
        {
            return Err(RepositoryError::Conflict(
                "transaction id already exists".to_owned(),
            ));
        }

        let order = Order {
            id: OrderId::new(tables.next_id()),
            customer_id: new.customer_id,
            cart_id: new.cart_id,
            total: new.total,
            currency: new.currency,
            transaction_id: Some(new.transaction_id.clone()),
            payment_token: new.payment_token.clone(),
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn find_order_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .find(|o| o.transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    async fn set_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = tables.orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        order.payment_status = status;
        Ok(())
    }

    async fn list_orders(&self, customer_id: CustomerId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .rev()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ResetTokenRepository for MemoryStore {
    async fn create_reset_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<PasswordResetToken, RepositoryError> {
        {
            let tables = self.tables.read().await;
            if !tables.users.contains_key(&user_id) {
                return Err(RepositoryError::NotFound);
            }
            if tables.reset_tokens.values().any(|t| t.token == token) {
                return Err(RepositoryError::Conflict(
                    "reset token already exists".to_owned(),
                ));
            }
        }
        Ok(self.insert_reset_token_at(user_id, token, Utc::now()).await)
    }

    async fn find_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reset_tokens
            .values()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn delete_reset_tokens(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.reset_tokens.len();
        tables.reset_tokens.retain(|_, t| t.user_id != user_id);
        Ok(u64::try_from(before - tables.reset_tokens.len()).unwrap_or(0))
    }

    async fn delete_reset_tokens_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.reset_tokens.len();
        tables.reset_tokens.retain(|_, t| t.created_at >= cutoff);
        Ok(u64::try_from(before - tables.reset_tokens.len()).unwrap_or(0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use dealshop_core::{DiscountRatio, Price};

    use super::*;

    async fn seeded() -> (MemoryStore, User, Product) {
        let store = MemoryStore::new();
        let user = store
            .create_user(
                &NewUser {
                    username: "testuser".to_owned(),
                    email: Email::parse("test@example.com").unwrap(),
                    first_name: "Jean".to_owned(),
                    last_name: "Dupont".to_owned(),
                },
                "hash",
            )
            .await
            .unwrap();
        let shop = store
            .insert_shop(
                &NewShop {
                    owner_id: user.id,
                    category_id: None,
                    name: "Restaurant le Delice".to_owned(),
                    slug: None,
                    description: String::new(),
                    city: "Abidjan".to_owned(),
                    email: None,
                },
                "restaurant-le-delice",
            )
            .await
            .unwrap();
        let product = store
            .insert_product(
                &NewProduct::new(shop.id, "Attiéké Poisson", Price::new(5000)),
                "attieke-poisson",
            )
            .await
            .unwrap();
        (store, user, product)
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (store, _, _) = seeded().await;
        let result = store
            .create_user(
                &NewUser {
                    username: "testuser".to_owned(),
                    email: Email::parse("other@example.com").unwrap(),
                    first_name: String::new(),
                    last_name: String::new(),
                },
                "hash",
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_or_insert_favorite_is_idempotent() {
        let (store, user, product) = seeded().await;
        let (first, created) = store
            .find_or_insert_favorite(user.id, product.id)
            .await
            .unwrap();
        assert!(created);
        let (second, created) = store
            .find_or_insert_favorite(user.id, product.id)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(store.count_favorites(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_line_merges_quantity() {
        let (store, user, product) = seeded().await;
        let customer = store
            .create_customer(user.id, &NewCustomer::default())
            .await
            .unwrap();
        let cart = store.create_cart(customer.id).await.unwrap();
        store.add_line(cart.id, product.id, 1).await.unwrap();
        store.add_line(cart.id, product.id, 2).await.unwrap();

        let cart = store.find_active_cart(customer.id).await.unwrap().unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_cart_loads_coupon() {
        let (store, user, product) = seeded().await;
        let customer = store
            .create_customer(user.id, &NewCustomer::default())
            .await
            .unwrap();
        let cart = store.create_cart(customer.id).await.unwrap();
        let coupon = store
            .create_coupon(&NewCoupon {
                code: "noel2024".to_owned(),
                label: "Noel".to_owned(),
                discount_ratio: DiscountRatio::from_percent(15).unwrap(),
                expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                is_active: true,
                max_uses: 100,
                eligible_products: vec![product.id],
            })
            .await
            .unwrap();
        assert_eq!(coupon.code, "NOEL2024");

        store.set_cart_coupon(cart.id, Some(coupon.id)).await.unwrap();
        let cart = store.get_cart(cart.id).await.unwrap().unwrap();
        assert_eq!(cart.coupon.map(|c| c.id), Some(coupon.id));
    }

    #[tokio::test]
    async fn test_delete_reset_tokens_only_for_user() {
        let (store, user, _) = seeded().await;
        store.create_reset_token(user.id, "abc").await.unwrap();
        store
            .insert_reset_token_at(UserId::new(999), "other", Utc::now())
            .await;
        assert_eq!(store.delete_reset_tokens(user.id).await.unwrap(), 1);
        assert!(store.find_reset_token("abc").await.unwrap().is_none());
        assert!(store.find_reset_token("other").await.unwrap().is_some());
    }
}
