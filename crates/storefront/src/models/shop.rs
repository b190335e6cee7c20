//! Vendor shops.

use dealshop_core::{Email, ShopCategoryId, ShopId, UserId};

/// A vendor that owns products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shop {
    pub id: ShopId,
    pub owner_id: UserId,
    pub category_id: Option<ShopCategoryId>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub city: String,
    pub email: Option<Email>,
    pub active: bool,
}

/// Input for creating a shop. `slug` follows the same rules as product slugs.
#[derive(Debug, Clone)]
pub struct NewShop {
    pub owner_id: UserId,
    pub category_id: Option<ShopCategoryId>,
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub city: String,
    pub email: Option<Email>,
}
