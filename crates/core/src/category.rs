//! Shop and product categories.
//!
//! Shop categories group vendors ("Restaurants"); each product category
//! belongs to exactly one shop category ("Plats Principaux" under
//! "Restaurants").

use serde::{Deserialize, Serialize};

use crate::types::{ProductCategoryId, ShopCategoryId};

/// A kind of shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopCategory {
    pub id: ShopCategoryId,
    pub name: String,
    pub description: String,
    pub active: bool,
}

/// A kind of product, nested under a shop category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: ProductCategoryId,
    pub shop_category_id: ShopCategoryId,
    pub name: String,
    pub description: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShopCategory {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductCategory {
    pub shop_category_id: ShopCategoryId,
    pub name: String,
    pub description: String,
}
