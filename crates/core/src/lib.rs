//! Dealshop Core - Domain types and pricing rules.
//!
//! This crate provides the types shared by every Dealshop component:
//! - `storefront` - Public-facing shop (catalog, cart, checkout, accounts)
//! - `cli` - Command-line tools for migrations and demo data
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Every rule that decides what a customer pays lives
//! here so it can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, discount ratios, emails and statuses
//! - [`catalog`] - Products and promotion-aware pricing
//! - [`cart`] - Cart lines and cart totals
//! - [`category`] - Shop and product categories
//! - [`coupon`] - Percentage coupons
//! - [`favorite`] - User bookmarks
//! - [`order`] - Orders and their payment references
//! - [`reset_token`] - Password reset token validity
//! - [`slug`] - URL slug generation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod category;
pub mod coupon;
pub mod favorite;
pub mod order;
pub mod reset_token;
pub mod slug;
pub mod types;

pub use cart::{Cart, CartLine, cart_total, check_empty, line_total, total_with_coupon};
pub use catalog::{NewProduct, Product, effective_unit_price};
pub use category::{NewProductCategory, NewShopCategory, ProductCategory, ShopCategory};
pub use coupon::Coupon;
pub use favorite::Favorite;
pub use order::Order;
pub use reset_token::PasswordResetToken;
pub use types::*;
