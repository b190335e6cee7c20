//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login and password reset
//! - `catalog` - Shops, products and super deals
//! - `cart` - Carts, lines and coupons
//! - `favorites` - Product bookmarks
//! - `checkout` - Orders and payment confirmation
//! - `payment` - Payment gateway (CinetPay)
//! - `email` - Transactional email (password reset)
//!
//! Services borrow the store for the duration of a request; construct them
//! from [`crate::state::AppState`] in handlers.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod favorites;
pub mod payment;

pub use auth::{AuthError, AuthService, Registration};
pub use cart::{CartError, CartService, CartSummary};
pub use catalog::CatalogService;
pub use checkout::{CheckoutError, CheckoutService, CheckoutStarted};
pub use email::{EmailError, EmailService};
pub use favorites::FavoriteService;
pub use payment::{
    CinetPayClient, GatewayStatus, PaymentError, PaymentGateway, PaymentLink, PaymentRequest,
    PaymentVerification,
};
