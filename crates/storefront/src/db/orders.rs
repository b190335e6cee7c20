//! Order repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dealshop_core::{CartId, CurrencyCode, CustomerId, Order, OrderId, PaymentStatus, Price};

use super::{PgStore, RepositoryError, conflict_on_unique, corrupt};

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    /// Cart being paid for.
    pub cart_id: CartId,
    pub total: Price,
    pub currency: CurrencyCode,
    /// Merchant-side reference sent to the gateway.
    pub transaction_id: String,
    /// Token the gateway issued with the payment link.
    pub payment_token: Option<String>,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Create a pending order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the transaction id is reused.
    async fn create_order(&self, new: &NewOrder) -> Result<Order, RepositoryError>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    async fn find_order_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Order>, RepositoryError>;

    async fn set_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<(), RepositoryError>;

    /// A customer's orders, newest first.
    async fn list_orders(&self, customer_id: CustomerId) -> Result<Vec<Order>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer_id: CustomerId,
    cart_id: CartId,
    total: Price,
    currency: String,
    transaction_id: Option<String>,
    payment_token: Option<String>,
    payment_status: PaymentStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let currency = row
            .currency
            .parse::<CurrencyCode>()
            .map_err(|e| corrupt("currency", e))?;
        Ok(Self {
            id: row.id,
            customer_id: row.customer_id,
            cart_id: row.cart_id,
            total: row.total,
            currency,
            transaction_id: row.transaction_id,
            payment_token: row.payment_token,
            payment_status: row.payment_status,
            created_at: row.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, cart_id, total, currency, transaction_id, \
     payment_token, payment_status, created_at";

#[async_trait]
impl OrderRepository for PgStore {
    async fn create_order(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO storefront."order"
                (customer_id, cart_id, total, currency, transaction_id, payment_token)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(new.customer_id)
        .bind(new.cart_id)
        .bind(new.total)
        .bind(new.currency.as_str())
        .bind(&new.transaction_id)
        .bind(new.payment_token.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "transaction id"))
        .and_then(Order::try_from)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM storefront."order" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Order::try_from)
        .transpose()
    }

    async fn find_order_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM storefront."order" WHERE transaction_id = $1"#
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Order::try_from)
        .transpose()
    }

    async fn set_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query(r#"UPDATE storefront."order" SET payment_status = $1 WHERE id = $2"#)
                .bind(status)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_orders(&self, customer_id: CustomerId) -> Result<Vec<Order>, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM storefront."order"
            WHERE customer_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect()
    }
}
