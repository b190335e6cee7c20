//! Cart service.
//!
//! Every signed-in user shops through a customer profile; one is created
//! with empty delivery details the first time the user touches a cart.

use chrono::NaiveDate;
use thiserror::Error;

use dealshop_core::{
    Cart, CartLine, CartLineId, Coupon, CustomerId, Price, ProductId, UserId, check_empty,
};

use crate::db::{RepositoryError, Store};
use crate::models::{Customer, NewCustomer};

/// Largest quantity accepted in one add. Merged lines are capped at the same value.
pub const MAX_QUANTITY: u32 = CartLine::MAX_QUANTITY;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("product not found")]
    ProductNotFound,

    #[error("line not found in cart")]
    LineNotFound,

    #[error("quantity must be between 1 and {MAX_QUANTITY}")]
    InvalidQuantity,

    #[error("unknown coupon code")]
    CouponNotFound,

    /// Inactive or past its expiry date.
    #[error("coupon {0} can no longer be used")]
    CouponNotRedeemable(String),

    #[error("cart is empty")]
    EmptyCart,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One cart line as shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub line_id: CartLineId,
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub unit_price: Price,
    pub base_price: Price,
    pub on_promotion: bool,
    pub quantity: u32,
    pub total: Price,
}

/// A priced cart for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<SummaryLine>,
    pub total: Price,
    pub total_with_coupon: Price,
    pub has_lines: bool,
    pub coupon: Option<Coupon>,
}

impl CartSummary {
    /// Price `cart` with the promotions running on `today`.
    #[must_use]
    pub fn of(cart: &Cart, today: NaiveDate) -> Self {
        let lines = cart
            .lines
            .iter()
            .map(|line| SummaryLine {
                line_id: line.id,
                product_id: line.product.id,
                name: line.product.name.clone(),
                slug: line.product.slug.clone(),
                unit_price: line.product.effective_unit_price(today),
                base_price: line.product.base_price,
                on_promotion: line.product.is_promotion_active(today),
                quantity: line.quantity,
                total: line.total(today),
            })
            .collect();

        Self {
            lines,
            total: cart.total(today),
            total_with_coupon: cart.total_with_coupon(today),
            has_lines: check_empty(cart),
            coupon: cart.coupon.clone(),
        }
    }

    /// Amount the coupon takes off.
    #[must_use]
    pub fn discount(&self) -> Price {
        self.total - self.total_with_coupon
    }
}

pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's customer profile, created on first use.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failures.
    pub async fn customer_for_user(&self, user_id: UserId) -> Result<Customer, CartError> {
        if let Some(customer) = self.store.find_customer_by_user(user_id).await? {
            return Ok(customer);
        }

        match self
            .store
            .create_customer(user_id, &NewCustomer::default())
            .await
        {
            Ok(customer) => {
                tracing::info!(user_id = %user_id, customer_id = %customer.id, "customer profile created");
                Ok(customer)
            }
            // Lost a race with a concurrent request; the other one created it.
            Err(RepositoryError::Conflict(_)) => self
                .store
                .find_customer_by_user(user_id)
                .await?
                .ok_or(CartError::Repository(RepositoryError::NotFound)),
            Err(e) => Err(e.into()),
        }
    }

    /// The customer's active cart, created if there is none.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failures.
    pub async fn active_cart(&self, customer_id: CustomerId) -> Result<Cart, CartError> {
        if let Some(cart) = self.store.find_active_cart(customer_id).await? {
            return Ok(cart);
        }
        Ok(self.store.create_cart(customer_id).await?)
    }

    /// Shortcut for the signed-in user's active cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failures.
    pub async fn cart_for_user(&self, user_id: UserId) -> Result<Cart, CartError> {
        let customer = self.customer_for_user(user_id).await?;
        self.active_cart(customer.id).await
    }

    /// Add a product to the user's cart. Adding a product that is already in
    /// the cart increases that line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for zero or oversized quantities,
    /// `CartError::ProductNotFound` if the product doesn't exist or is inactive.
    #[tracing::instrument(skip(self))]
    pub async fn add_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity == 0 || quantity > MAX_QUANTITY {
            return Err(CartError::InvalidQuantity);
        }

        let product = self
            .store
            .get_product(product_id)
            .await?
            .filter(|p| p.active)
            .ok_or(CartError::ProductNotFound)?;

        let cart = self.cart_for_user(user_id).await?;
        self.store
            .add_line(cart.id, product.id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ProductNotFound,
                other => other.into(),
            })?;

        self.reload(cart).await
    }

    /// Remove one line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the line isn't in the user's cart.
    pub async fn remove_line(&self, user_id: UserId, line_id: CartLineId) -> Result<Cart, CartError> {
        let cart = self.cart_for_user(user_id).await?;
        if !self.store.remove_line(cart.id, line_id).await? {
            return Err(CartError::LineNotFound);
        }
        self.reload(cart).await
    }

    /// Attach a coupon by code. Codes are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CouponNotFound` for unknown codes and
    /// `CartError::CouponNotRedeemable` for inactive or expired ones.
    #[tracing::instrument(skip(self))]
    pub async fn apply_coupon(
        &self,
        user_id: UserId,
        code: &str,
        today: NaiveDate,
    ) -> Result<Cart, CartError> {
        let code = Coupon::normalize_code(code);
        let coupon = self
            .store
            .find_coupon_by_code(&code)
            .await?
            .ok_or(CartError::CouponNotFound)?;

        if !coupon.is_redeemable(today) {
            return Err(CartError::CouponNotRedeemable(coupon.code));
        }

        let cart = self.cart_for_user(user_id).await?;
        self.store.set_cart_coupon(cart.id, Some(coupon.id)).await?;
        self.reload(cart).await
    }

    /// Detach the coupon from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failures.
    pub async fn clear_coupon(&self, user_id: UserId) -> Result<Cart, CartError> {
        let cart = self.cart_for_user(user_id).await?;
        self.store.set_cart_coupon(cart.id, None).await?;
        self.reload(cart).await
    }

    async fn reload(&self, cart: Cart) -> Result<Cart, CartError> {
        Ok(self
            .store
            .get_cart(cart.id)
            .await?
            .ok_or(RepositoryError::NotFound)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use dealshop_core::{DiscountRatio, Email, NewProduct};

    use super::*;
    use crate::db::{CouponRepository, MemoryStore, NewCoupon, UserRepository};
    use crate::models::{NewShop, NewUser, User};
    use crate::services::CatalogService;

    struct Fixture {
        store: MemoryStore,
        user: User,
        product_id: ProductId,
        today: NaiveDate,
    }

    async fn fixture() -> Fixture {
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
        let catalog = CatalogService::new(&store);
        let shop = catalog
            .create_shop(&NewShop {
                owner_id: user.id,
                category_id: None,
                name: "Restaurant le Delice".to_owned(),
                slug: None,
                description: String::new(),
                city: "Abidjan".to_owned(),
                email: None,
            })
            .await
            .unwrap();
        let today = Utc::now().date_naive();
        let product = catalog
            .create_product(
                &NewProduct::new(shop.id, "Attiéké Poisson", Price::new(6000)).with_promotion(
                    Price::new(4500),
                    today - Duration::days(1),
                    today + Duration::days(30),
                ),
            )
            .await
            .unwrap();

        Fixture {
            store,
            user,
            product_id: product.id,
            today,
        }
    }

    async fn coupon(store: &MemoryStore, code: &str, active: bool, expiry: NaiveDate) {
        store
            .create_coupon(&NewCoupon {
                code: code.to_owned(),
                label: "Promo".to_owned(),
                discount_ratio: DiscountRatio::from_percent(15).unwrap(),
                expiry_date: expiry,
                is_active: active,
                max_uses: 100,
                eligible_products: Vec::new(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_product_merges_lines() {
        let f = fixture().await;
        let carts = CartService::new(&f.store);

        carts.add_product(f.user.id, f.product_id, 1).await.unwrap();
        let cart = carts.add_product(f.user.id, f.product_id, 2).await.unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 3);

        let summary = CartSummary::of(&cart, f.today);
        assert!(summary.has_lines);
        assert_eq!(summary.total, Price::new(13500));
        assert!(summary.lines[0].on_promotion);
    }

    #[tokio::test]
    async fn test_merged_quantity_capped() {
        let f = fixture().await;
        let carts = CartService::new(&f.store);

        carts.add_product(f.user.id, f.product_id, 60).await.unwrap();
        let cart = carts.add_product(f.user.id, f.product_id, 60).await.unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, MAX_QUANTITY);
    }

    #[tokio::test]
    async fn test_add_zero_quantity_rejected() {
        let f = fixture().await;
        let result = CartService::new(&f.store)
            .add_product(f.user.id, f.product_id, 0)
            .await;
        assert!(matches!(result, Err(CartError::InvalidQuantity)));
    }

    #[tokio::test]
    async fn test_apply_coupon_discounts_total() {
        let f = fixture().await;
        coupon(&f.store, "NOEL2024", true, f.today + Duration::days(30)).await;
        let carts = CartService::new(&f.store);

        carts.add_product(f.user.id, f.product_id, 2).await.unwrap();
        let cart = carts.apply_coupon(f.user.id, "noel2024", f.today).await.unwrap();

        let summary = CartSummary::of(&cart, f.today);
        assert_eq!(summary.total, Price::new(9000));
        assert_eq!(summary.total_with_coupon, Price::new(7650));
        assert_eq!(summary.discount(), Price::new(1350));
    }

    #[tokio::test]
    async fn test_expired_coupon_rejected() {
        let f = fixture().await;
        coupon(&f.store, "OLD", true, f.today - Duration::days(1)).await;

        let result = CartService::new(&f.store)
            .apply_coupon(f.user.id, "OLD", f.today)
            .await;
        assert!(matches!(result, Err(CartError::CouponNotRedeemable(_))));
    }

    #[tokio::test]
    async fn test_unknown_coupon_rejected() {
        let f = fixture().await;
        let result = CartService::new(&f.store)
            .apply_coupon(f.user.id, "NOPE", f.today)
            .await;
        assert!(matches!(result, Err(CartError::CouponNotFound)));
    }

    #[tokio::test]
    async fn test_remove_line() {
        let f = fixture().await;
        let carts = CartService::new(&f.store);
        let cart = carts.add_product(f.user.id, f.product_id, 1).await.unwrap();

        let cart = carts.remove_line(f.user.id, cart.lines[0].id).await.unwrap();
        assert!(!CartSummary::of(&cart, f.today).has_lines);

        let again = carts.remove_line(f.user.id, CartLineId::new(9999)).await;
        assert!(matches!(again, Err(CartError::LineNotFound)));
    }

    #[tokio::test]
    async fn test_customer_profile_created_once() {
        let f = fixture().await;
        let carts = CartService::new(&f.store);

        let first = carts.customer_for_user(f.user.id).await.unwrap();
        let second = carts.customer_for_user(f.user.id).await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
