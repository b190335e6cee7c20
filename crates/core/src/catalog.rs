//! Products and promotion-aware pricing.
//!
//! A product has a base price and, optionally, a promotional price valid over
//! an inclusive date window. Pricing never fails: a promotion that is
//! missing a date, has a zero price, has expired or has not started yet simply
//! leaves the base price in effect.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductCategoryId, ProductId, ShopId};

/// A product sold by a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub category_id: Option<ProductCategoryId>,
    pub name: String,
    /// Unique URL handle.
    pub slug: String,
    pub description: String,
    pub base_price: Price,
    /// Zero means "no promotion".
    pub promotional_price: Price,
    pub promotion_start: Option<NaiveDate>,
    pub promotion_end: Option<NaiveDate>,
    /// Units available.
    pub stock: i32,
    /// Featured on the home page.
    pub super_deal: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether the promotional price applies on `today`.
    ///
    /// True only when both window dates are set, `today` falls inside
    /// `[promotion_start, promotion_end]` and the promotional price is nonzero.
    #[must_use]
    pub fn is_promotion_active(&self, today: NaiveDate) -> bool {
        if self.promotional_price.is_zero() {
            return false;
        }
        match (self.promotion_start, self.promotion_end) {
            (Some(start), Some(end)) => start <= today && today <= end,
            _ => false,
        }
    }

    /// The unit price a customer pays on `today`.
    #[must_use]
    pub fn effective_unit_price(&self, today: NaiveDate) -> Price {
        if self.is_promotion_active(today) {
            self.promotional_price
        } else {
            self.base_price
        }
    }
}

/// The unit price of `product` on `today`. See [`Product::effective_unit_price`].
#[must_use]
pub fn effective_unit_price(product: &Product, today: NaiveDate) -> Price {
    product.effective_unit_price(today)
}

/// Input for creating a product.
///
/// `slug` is optional; when absent one is derived from the name at creation
/// time (see [`crate::slug::unique_slug`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub shop_id: ShopId,
    pub category_id: Option<ProductCategoryId>,
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub base_price: Price,
    pub promotional_price: Price,
    pub promotion_start: Option<NaiveDate>,
    pub promotion_end: Option<NaiveDate>,
    pub stock: i32,
    pub super_deal: bool,
}

impl NewProduct {
    /// A product with only a name and a base price, no promotion.
    #[must_use]
    pub fn new(shop_id: ShopId, name: impl Into<String>, base_price: Price) -> Self {
        Self {
            shop_id,
            category_id: None,
            name: name.into(),
            slug: None,
            description: String::new(),
            base_price,
            promotional_price: Price::ZERO,
            promotion_start: None,
            promotion_end: None,
            stock: 0,
            super_deal: false,
        }
    }

    /// Attach a promotional price valid from `start` to `end` inclusive.
    #[must_use]
    pub const fn with_promotion(mut self, price: Price, start: NaiveDate, end: NaiveDate) -> Self {
        self.promotional_price = price;
        self.promotion_start = Some(start);
        self.promotion_end = Some(end);
        self
    }

    #[must_use]
    pub const fn with_category(mut self, category_id: ProductCategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::Product;
    use crate::types::{Price, ProductId, ShopId};

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    pub fn product(id: i64, base: i64, promo: i64, window: Option<(NaiveDate, NaiveDate)>) -> Product {
        Product {
            id: ProductId::new(id),
            shop_id: ShopId::new(1),
            category_id: None,
            name: format!("Produit {id}"),
            slug: format!("produit-{id}"),
            description: String::new(),
            base_price: Price::new(base),
            promotional_price: Price::new(promo),
            promotion_start: window.map(|(start, _)| start),
            promotion_end: window.map(|(_, end)| end),
            stock: 100,
            super_deal: false,
            active: true,
            created_at: Utc.timestamp_opt(0, 0).single().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;

    use super::test_support::{day, product};
    use super::*;

    #[test]
    fn test_no_promotion_uses_base_price() {
        let today = day(2026, 3, 10);
        let p = product(1, 5000, 0, None);
        assert!(!p.is_promotion_active(today));
        assert_eq!(p.effective_unit_price(today), Price::new(5000));
    }

    #[test]
    fn test_active_promotion_uses_promotional_price() {
        let today = day(2026, 3, 10);
        let window = (today - Days::new(1), today + Days::new(30));
        let p = product(2, 6000, 4500, Some(window));
        assert!(p.is_promotion_active(today));
        assert_eq!(effective_unit_price(&p, today), Price::new(4500));
    }

    #[test]
    fn test_expired_promotion_falls_back() {
        let today = day(2026, 3, 10);
        let window = (today - Days::new(60), today - Days::new(1));
        let p = product(3, 4000, 3000, Some(window));
        assert!(!p.is_promotion_active(today));
        assert_eq!(p.effective_unit_price(today), Price::new(4000));
    }

    #[test]
    fn test_future_promotion_falls_back() {
        let today = day(2026, 3, 10);
        let window = (today + Days::new(1), today + Days::new(31));
        let p = product(4, 10_000, 7000, Some(window));
        assert!(!p.is_promotion_active(today));
        assert_eq!(p.effective_unit_price(today), Price::new(10_000));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let start = day(2026, 3, 1);
        let end = day(2026, 3, 31);
        let p = product(5, 15_000, 10_000, Some((start, end)));
        assert_eq!(p.effective_unit_price(start), Price::new(10_000));
        assert_eq!(p.effective_unit_price(end), Price::new(10_000));
        assert_eq!(p.effective_unit_price(day(2026, 2, 28)), Price::new(15_000));
        assert_eq!(p.effective_unit_price(day(2026, 4, 1)), Price::new(15_000));
    }

    #[test]
    fn test_zero_promotional_price_is_not_a_promotion() {
        let today = day(2026, 3, 10);
        let p = product(6, 5000, 0, Some((today, today)));
        assert!(!p.is_promotion_active(today));
        assert_eq!(p.effective_unit_price(today), Price::new(5000));
    }

    #[test]
    fn test_half_open_window_is_not_a_promotion() {
        let today = day(2026, 3, 10);
        let mut p = product(7, 5000, 4000, Some((today, today)));
        p.promotion_end = None;
        assert!(!p.is_promotion_active(today));
        p.promotion_end = Some(today);
        p.promotion_start = None;
        assert!(!p.is_promotion_active(today));
    }

    #[test]
    fn test_new_product_builder() {
        let start = day(2026, 1, 1);
        let end = day(2026, 1, 31);
        let draft = NewProduct::new(ShopId::new(3), "Placali Sauce", Price::new(6000))
            .with_promotion(Price::new(4500), start, end);
        assert_eq!(draft.slug, None);
        assert_eq!(draft.promotion_start, Some(start));
        assert_eq!(draft.promotional_price, Price::new(4500));
    }
}
