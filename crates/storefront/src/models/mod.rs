//! Account-side domain models for the storefront.
//!
//! Pricing types (products, carts, coupons, orders) live in `dealshop-core`;
//! this module holds the people and vendors that own them.

pub mod customer;
pub mod session;
pub mod shop;
pub mod user;

pub use customer::{Customer, NewCustomer};
pub use session::CurrentUser;
pub use shop::{NewShop, Shop};
pub use user::{NewUser, User};
