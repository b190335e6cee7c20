//! Customer profiles.

use dealshop_core::{CustomerId, UserId};

/// Delivery profile attached to a user. Carts and orders belong to a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: CustomerId,
    /// One customer per user.
    pub user_id: UserId,
    pub address: String,
    pub phone_primary: String,
    pub phone_secondary: Option<String>,
    pub city: String,
    pub country: String,
    pub active: bool,
}

/// Input for creating a customer profile.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub address: String,
    pub phone_primary: String,
    pub phone_secondary: Option<String>,
    pub city: String,
    pub country: String,
}
