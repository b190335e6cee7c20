//! Discount coupons.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{CouponId, DiscountRatio, ProductId};

/// A coupon code that takes a fraction off a cart total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Code customers type in, e.g. `NOEL2024`. Unique.
    pub code: String,
    pub label: String,
    pub discount_ratio: DiscountRatio,
    pub expiry_date: NaiveDate,
    pub is_active: bool,
    pub max_uses: u32,
    /// Products the coupon is meant for. Informational only; cart totals
    /// apply the discount to the whole cart.
    pub eligible_products: Vec<ProductId>,
}

impl Coupon {
    /// Whether a customer may attach this coupon to a cart on `today`.
    ///
    /// The expiry date itself is still a valid day.
    #[must_use]
    pub fn is_redeemable(&self, today: NaiveDate) -> bool {
        self.is_active && today <= self.expiry_date
    }

    /// Whether `product` is listed as eligible.
    #[must_use]
    pub fn is_eligible(&self, product: ProductId) -> bool {
        self.eligible_products.contains(&product)
    }

    /// Normalize a user-typed code for lookup.
    #[must_use]
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Days;

    use super::*;

    fn noel(today: NaiveDate) -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: "NOEL2024".to_owned(),
            label: "Noel".to_owned(),
            discount_ratio: DiscountRatio::from_percent(15).unwrap(),
            expiry_date: today + Days::new(30),
            is_active: true,
            max_uses: 100,
            eligible_products: vec![ProductId::new(1)],
        }
    }

    #[test]
    fn test_redeemable_until_expiry_inclusive() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        let coupon = noel(today);
        assert!(coupon.is_redeemable(today));
        assert!(coupon.is_redeemable(coupon.expiry_date));
        assert!(!coupon.is_redeemable(coupon.expiry_date + Days::new(1)));
    }

    #[test]
    fn test_inactive_coupon_not_redeemable() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        let mut coupon = noel(today);
        coupon.is_active = false;
        assert!(!coupon.is_redeemable(today));
    }

    #[test]
    fn test_eligibility() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        let coupon = noel(today);
        assert!(coupon.is_eligible(ProductId::new(1)));
        assert!(!coupon.is_eligible(ProductId::new(2)));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(Coupon::normalize_code("  noel2024 "), "NOEL2024");
    }
}
