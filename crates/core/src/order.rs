//! Orders and their payment state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CartId, CurrencyCode, CustomerId, OrderId, PaymentStatus, Price};

/// An order created at checkout.
///
/// `cart_id` is the cart that was checked out; paying the order closes that
/// cart and no other. Orders created by checkout carry the gateway's
/// `transaction_id` and `payment_token` from the start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub cart_id: CartId,
    pub total: Price,
    pub currency: CurrencyCode,
    pub transaction_id: Option<String>,
    pub payment_token: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}
