//! Payment gateway abstraction.
//!
//! Checkout talks to a [`PaymentGateway`]; production uses
//! [`CinetPayClient`], tests inject their own implementation.

mod cinetpay;

pub use cinetpay::CinetPayClient;

use async_trait::async_trait;
use thiserror::Error;

use dealshop_core::{CurrencyCode, Price};

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway answered with an error code.
    #[error("API error: {code} - {message}")]
    Api { code: String, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// What the customer is asked to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Merchant-side reference, unique per order.
    pub transaction_id: String,
    pub amount: Price,
    pub currency: CurrencyCode,
    pub description: String,
    /// Where the gateway sends the customer back.
    pub return_url: String,
    /// Where the gateway posts status notifications.
    pub notify_url: String,
}

/// Checkout page issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLink {
    pub payment_url: String,
    /// Gateway-side token for this payment attempt.
    pub payment_token: String,
}

/// Gateway-side state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Accepted,
    Refused,
    /// Customer hasn't finished paying yet.
    Pending,
}

impl GatewayStatus {
    /// Map a gateway status string. Unknown values count as pending.
    #[must_use]
    pub fn from_gateway(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "ACCEPTED" | "SUCCESS" => Self::Accepted,
            "REFUSED" | "FAILED" | "CANCELED" | "CANCELLED" => Self::Refused,
            _ => Self::Pending,
        }
    }
}

/// Result of checking a transaction with the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentVerification {
    pub status: GatewayStatus,
    pub transaction_id: String,
    pub amount: Price,
    pub currency: CurrencyCode,
}

/// A payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a payment and return the page the customer should be sent to.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if the gateway is unreachable or refuses the request.
    async fn generate_payment_url(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentLink, PaymentError>;

    /// Ask the gateway what happened to a transaction.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if the gateway is unreachable or doesn't know the
    /// transaction.
    async fn verify_payment(
        &self,
        transaction_id: &str,
    ) -> Result<PaymentVerification, PaymentError>;
}
