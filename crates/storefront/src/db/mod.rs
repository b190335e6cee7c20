//! Persistence for the storefront.
//!
//! # Database: `dealshop`
//!
//! ## Tables (schema `storefront`)
//!
//! - `user` - Accounts (username and email are both unique)
//! - `user_password` - Argon2 password hashes
//! - `customer` - Delivery profile, one per user
//! - `shop_category`, `product_category` - Shop kinds and the product kinds under them
//! - `shop` - Vendors
//! - `product` - Catalog with optional promotion window
//! - `coupon`, `coupon_product` - Discount codes and their eligible products
//! - `cart`, `cart_line` - Shopping carts
//! - `favorite` - Unique per (user, product)
//! - `order` - Orders and payment references
//! - `password_reset_token`
//!
//! Sessions live in `tower_sessions.session`, managed by tower-sessions.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p dealshop-cli -- migrate
//! ```
//!
//! # Backends
//!
//! Handlers never see a concrete backend. They hold a [`DynStore`], which is
//! either a [`PgStore`] or a [`MemoryStore`].

pub mod carts;
pub mod categories;
pub mod coupons;
pub mod customers;
pub mod favorites;
pub mod memory;
pub mod orders;
pub mod products;
pub mod reset_tokens;
pub mod shops;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use coupons::{CouponRepository, NewCoupon};
pub use customers::CustomerRepository;
pub use favorites::FavoriteRepository;
pub use memory::MemoryStore;
pub use orders::{NewOrder, OrderRepository};
pub use products::ProductRepository;
pub use reset_tokens::ResetTokenRepository;
pub use shops::ShopRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Every repository the storefront needs, behind one object.
pub trait Store:
    UserRepository
    + CustomerRepository
    + ShopRepository
    + CategoryRepository
    + ProductRepository
    + CouponRepository
    + CartRepository
    + FavoriteRepository
    + OrderRepository
    + ResetTokenRepository
    + Send
    + Sync
{
}

impl<T> Store for T where
    T: UserRepository
        + CustomerRepository
        + ShopRepository
        + CategoryRepository
        + ProductRepository
        + CouponRepository
        + CartRepository
        + FavoriteRepository
        + OrderRepository
        + ResetTokenRepository
        + Send
        + Sync
{
}

/// Shared handle to the active store.
pub type DynStore = Arc<dyn Store>;

/// `PostgreSQL`-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool (used for sessions and readiness checks).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

pub(crate) fn corrupt(what: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("invalid {what} in database: {e}"))
}
