//! Checkout: turn a cart into an order and hand the customer to the gateway.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use dealshop_core::{CurrencyCode, Order, PaymentStatus, UserId, check_empty};

use super::cart::{CartError, CartService};
use super::payment::{GatewayStatus, PaymentError, PaymentGateway, PaymentRequest};
use crate::db::{NewOrder, RepositoryError, Store};

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("order not found")]
    OrderNotFound,

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("payment gateway error: {0}")]
    Payment(#[from] PaymentError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A created order and where to send the customer to pay for it.
#[derive(Debug, Clone)]
pub struct CheckoutStarted {
    pub order: Order,
    pub payment_url: String,
}

pub struct CheckoutService<'a> {
    store: &'a dyn Store,
    gateway: &'a dyn PaymentGateway,
    currency: CurrencyCode,
    /// Public base URL used to build return and notify URLs.
    base_url: &'a str,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        gateway: &'a dyn PaymentGateway,
        currency: CurrencyCode,
        base_url: &'a str,
    ) -> Self {
        Self {
            store,
            gateway,
            currency,
            base_url,
        }
    }

    /// Open a payment for the user's cart and record the order.
    ///
    /// The order amount is the cart total after promotions and coupon, as
    /// priced on `today`. The order is only written once the gateway has
    /// issued a payment link, so a failed call leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines, and
    /// `CheckoutError::Payment` unchanged if the gateway fails.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, user_id: UserId, today: NaiveDate) -> Result<CheckoutStarted, CheckoutError> {
        let cart = CartService::new(self.store).cart_for_user(user_id).await?;
        if !check_empty(&cart) {
            return Err(CheckoutError::EmptyCart);
        }

        let total = cart.total_with_coupon(today);
        let transaction_id = new_transaction_id();

        let request = PaymentRequest {
            transaction_id: transaction_id.clone(),
            amount: total,
            currency: self.currency,
            description: format!("Panier {}", cart.id),
            return_url: format!(
                "{}/payment/return?transaction_id={}",
                self.base_url,
                urlencoding::encode(&transaction_id)
            ),
            notify_url: format!("{}/payment/notify", self.base_url),
        };

        let link = self.gateway.generate_payment_url(&request).await?;

        let order = self
            .store
            .create_order(&NewOrder {
                customer_id: cart.customer_id,
                cart_id: cart.id,
                total,
                currency: self.currency,
                transaction_id: transaction_id.clone(),
                payment_token: Some(link.payment_token),
            })
            .await?;

        tracing::info!(order_id = %order.id, cart_id = %cart.id, %transaction_id, amount = %total, "checkout started");

        Ok(CheckoutStarted {
            order,
            payment_url: link.payment_url,
        })
    }

    /// Ask the gateway about a transaction and record the outcome on its order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` for unknown transaction ids and
    /// `CheckoutError::Payment` unchanged if the gateway fails.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_payment(&self, transaction_id: &str) -> Result<Order, CheckoutError> {
        let order = self
            .store
            .find_order_by_transaction(transaction_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound)?;

        if order.is_paid() {
            return Ok(order);
        }

        let verification = self.gateway.verify_payment(transaction_id).await?;

        let status = match verification.status {
            GatewayStatus::Accepted
                if verification.amount == order.total
                    && verification.currency == order.currency =>
            {
                PaymentStatus::Paid
            }
            GatewayStatus::Accepted => {
                tracing::warn!(
                    order_id = %order.id,
                    expected = %order.total,
                    received = %verification.amount,
                    currency = %verification.currency,
                    "payment amount mismatch"
                );
                PaymentStatus::Failed
            }
            GatewayStatus::Pending => PaymentStatus::Pending,
            GatewayStatus::Refused => PaymentStatus::Failed,
        };

        if status != order.payment_status {
            self.store.set_payment_status(order.id, status).await?;
        }

        if status == PaymentStatus::Paid {
            self.store.deactivate_cart(order.cart_id).await?;
        }

        tracing::info!(order_id = %order.id, %status, "payment confirmed");

        Ok(Order {
            payment_status: status,
            ..order
        })
    }
}

/// Merchant-side transaction reference: `TRX` followed by 32 hex digits.
fn new_transaction_id() -> String {
    format!("TRX{}", Uuid::new_v4().simple()).to_uppercase()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use dealshop_core::{Email, NewProduct, Price};

    use super::*;
    use crate::db::{MemoryStore, UserRepository};
    use crate::models::{NewShop, NewUser, User};
    use crate::services::payment::{PaymentLink, PaymentVerification};
    use crate::services::CatalogService;

    /// Gateway that answers every verification with a fixed status and amount.
    struct StubGateway {
        status: GatewayStatus,
        amount: Option<Price>,
        requests: Mutex<Vec<PaymentRequest>>,
    }

    impl StubGateway {
        fn new(status: GatewayStatus, amount: Option<Price>) -> Self {
            Self {
                status,
                amount,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn generate_payment_url(
            &self,
            request: &PaymentRequest,
        ) -> Result<PaymentLink, PaymentError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(PaymentLink {
                payment_url: format!(
                    "https://checkout.cinetpay.com/payment/{}",
                    request.transaction_id
                ),
                payment_token: "TOKEN_ABC123XYZ".to_owned(),
            })
        }

        async fn verify_payment(
            &self,
            transaction_id: &str,
        ) -> Result<PaymentVerification, PaymentError> {
            let requested = self.requests.lock().unwrap()[0].amount;
            Ok(PaymentVerification {
                status: self.status,
                transaction_id: transaction_id.to_owned(),
                amount: self.amount.unwrap_or(requested),
                currency: CurrencyCode::XOF,
            })
        }
    }

    async fn user_with_cart(store: &MemoryStore) -> User {
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
        let catalog = CatalogService::new(store);
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
            .create_product(&NewProduct::new(shop.id, "Foutou", Price::new(5000)))
            .await
            .unwrap();
        CartService::new(store)
            .add_product(user.id, product.id, 2)
            .await
            .unwrap();
        user
    }

    #[tokio::test]
    async fn test_checkout_then_accepted_payment_marks_paid() {
        let store = MemoryStore::new();
        let user = user_with_cart(&store).await;
        let gateway = StubGateway::new(GatewayStatus::Accepted, None);
        let checkout =
            CheckoutService::new(&store, &gateway, CurrencyCode::XOF, "http://localhost:3000");

        let started = checkout.start(user.id, Utc::now().date_naive()).await.unwrap();
        assert_eq!(started.order.total, Price::new(10000));
        assert_eq!(started.order.payment_token.as_deref(), Some("TOKEN_ABC123XYZ"));
        assert!(started.payment_url.contains("cinetpay.com"));

        let transaction_id = started.order.transaction_id.clone().unwrap();
        assert!(transaction_id.starts_with("TRX"));

        let order = checkout.confirm_payment(&transaction_id).await.unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);

        // The paid cart is closed; the next one starts empty.
        let cart = CartService::new(&store).cart_for_user(user.id).await.unwrap();
        assert!(cart.lines.is_empty());
    }

    #[tokio::test]
    async fn test_amount_mismatch_marks_failed() {
        let store = MemoryStore::new();
        let user = user_with_cart(&store).await;
        let gateway = StubGateway::new(GatewayStatus::Accepted, Some(Price::new(100)));
        let checkout =
            CheckoutService::new(&store, &gateway, CurrencyCode::XOF, "http://localhost:3000");

        let started = checkout.start(user.id, Utc::now().date_naive()).await.unwrap();
        let transaction_id = started.order.transaction_id.unwrap();

        let order = checkout.confirm_payment(&transaction_id).await.unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn test_pending_payment_stays_pending() {
        let store = MemoryStore::new();
        let user = user_with_cart(&store).await;
        let gateway = StubGateway::new(GatewayStatus::Pending, None);
        let checkout =
            CheckoutService::new(&store, &gateway, CurrencyCode::XOF, "http://localhost:3000");

        let started = checkout.start(user.id, Utc::now().date_naive()).await.unwrap();
        let order = checkout
            .confirm_payment(started.order.transaction_id.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let store = MemoryStore::new();
        let gateway = StubGateway::new(GatewayStatus::Accepted, None);
        let checkout =
            CheckoutService::new(&store, &gateway, CurrencyCode::XOF, "http://localhost:3000");

        let result = checkout.confirm_payment("TRX_UNKNOWN").await;
        assert!(matches!(result, Err(CheckoutError::OrderNotFound)));
    }
}
