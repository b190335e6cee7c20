//! Shopping carts and their totals.
//!
//! Totals are always computed for a given day, since the unit price of a
//! product depends on whether its promotion is running.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::coupon::Coupon;
use crate::types::{CartId, CartLineId, CustomerId, Price};

/// One product in a cart with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub product: Product,
    /// Between 1 and [`CartLine::MAX_QUANTITY`].
    pub quantity: u32,
}

impl CartLine {
    /// Largest quantity a single line may hold.
    pub const MAX_QUANTITY: u32 = 99;

    /// Effective unit price on `today` times quantity.
    #[must_use]
    pub fn total(&self, today: NaiveDate) -> Price {
        self.product.effective_unit_price(today) * self.quantity
    }
}

/// A customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub customer_id: CustomerId,
    pub coupon: Option<Coupon>,
    pub lines: Vec<CartLine>,
    /// False once the cart has been checked out.
    pub active: bool,
}

impl Cart {
    /// An empty, active cart.
    #[must_use]
    pub const fn new(id: CartId, customer_id: CustomerId) -> Self {
        Self {
            id,
            customer_id,
            coupon: None,
            lines: Vec::new(),
            active: true,
        }
    }

    /// Sum of line totals on `today`.
    #[must_use]
    pub fn total(&self, today: NaiveDate) -> Price {
        cart_total(self, today)
    }

    /// Total after the attached coupon, if any.
    #[must_use]
    pub fn total_with_coupon(&self, today: NaiveDate) -> Price {
        total_with_coupon(self, today)
    }

    /// See [`check_empty`]. Note the inverted name.
    #[must_use]
    pub fn check_empty(&self) -> bool {
        check_empty(self)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

/// Total of a single line. See [`CartLine::total`].
#[must_use]
pub fn line_total(line: &CartLine, today: NaiveDate) -> Price {
    line.total(today)
}

/// Sum of all line totals; zero for an empty cart.
#[must_use]
pub fn cart_total(cart: &Cart, today: NaiveDate) -> Price {
    cart.lines.iter().map(|line| line.total(today)).sum()
}

/// `floor(total * (1 - ratio))` when a coupon is attached, the plain total otherwise.
///
/// Only the ratio is consulted. Expiry, activity and product eligibility are
/// checked when the coupon is attached, not here.
#[must_use]
pub fn total_with_coupon(cart: &Cart, today: NaiveDate) -> Price {
    let total = cart_total(cart, today);
    match &cart.coupon {
        Some(coupon) => coupon.discount_ratio.apply(total),
        None => total,
    }
}

/// Returns `true` when the cart has **at least one** line.
///
/// Despite the name this answers "does the cart have content?". Templates and
/// existing callers depend on this meaning; use [`Cart::is_empty`] for the
/// natural reading.
#[must_use]
pub fn check_empty(cart: &Cart) -> bool {
    !cart.lines.is_empty()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Days;

    use super::*;
    use crate::catalog::test_support::{day, product};
    use crate::types::{CouponId, DiscountRatio, ProductId};

    fn today() -> NaiveDate {
        day(2026, 6, 15)
    }

    fn without_promotion() -> Product {
        product(1, 5000, 0, None)
    }

    fn with_active_promotion() -> Product {
        let t = today();
        product(2, 6000, 4500, Some((t - Days::new(1), t + Days::new(30))))
    }

    fn with_expired_promotion() -> Product {
        let t = today();
        product(3, 4000, 3000, Some((t - Days::new(60), t - Days::new(1))))
    }

    fn cart_with(lines: &[(Product, u32)]) -> Cart {
        let mut cart = Cart::new(CartId::new(1), CustomerId::new(1));
        for (i, (product, quantity)) in lines.iter().enumerate() {
            cart.lines.push(CartLine {
                id: CartLineId::new(i64::try_from(i).unwrap() + 1),
                cart_id: cart.id,
                product: product.clone(),
                quantity: *quantity,
            });
        }
        cart
    }

    fn coupon(percent: u32) -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: "NOEL2024".to_owned(),
            label: "Noel".to_owned(),
            discount_ratio: DiscountRatio::from_percent(percent).unwrap(),
            expiry_date: today() + Days::new(30),
            is_active: true,
            max_uses: 100,
            eligible_products: vec![ProductId::new(1)],
        }
    }

    #[test]
    fn test_line_total_uses_promotional_price() {
        let cart = cart_with(&[(with_active_promotion(), 3)]);
        assert_eq!(line_total(&cart.lines[0], today()), Price::new(13_500));
    }

    #[test]
    fn test_line_total_expired_promotion() {
        let cart = cart_with(&[(with_expired_promotion(), 5)]);
        assert_eq!(cart.lines[0].total(today()), Price::new(20_000));
    }

    #[test]
    fn test_cart_total_mixed_lines() {
        let cart = cart_with(&[(without_promotion(), 1), (with_active_promotion(), 1)]);
        assert_eq!(cart.total(today()), Price::new(9500));
    }

    #[test]
    fn test_cart_total_scales_with_quantity() {
        let cart = cart_with(&[(without_promotion(), 2)]);
        assert_eq!(cart_total(&cart, today()), Price::new(10_000));
        let cart = cart_with(&[(without_promotion(), 3)]);
        assert_eq!(cart_total(&cart, today()), Price::new(15_000));
    }

    #[test]
    fn test_empty_cart_totals_zero() {
        let cart = cart_with(&[]);
        assert_eq!(cart.total(today()), Price::ZERO);
        assert_eq!(cart.total_with_coupon(today()), Price::ZERO);
    }

    #[test]
    fn test_total_with_coupon() {
        let mut cart = cart_with(&[(without_promotion(), 2)]);
        cart.coupon = Some(coupon(15));
        assert_eq!(total_with_coupon(&cart, today()), Price::new(8500));
    }

    #[test]
    fn test_total_with_coupon_floors_remaining_amount() {
        let mut cart = cart_with(&[(product(4, 9999, 0, None), 1)]);
        cart.coupon = Some(coupon(15));
        assert_eq!(cart.total_with_coupon(today()), Price::new(8499));
    }

    #[test]
    fn test_total_without_coupon_is_plain_total() {
        let cart = cart_with(&[(without_promotion(), 3)]);
        assert_eq!(cart.total_with_coupon(today()), Price::new(15_000));
    }

    #[test]
    fn test_coupon_applies_to_whole_cart_regardless_of_eligibility() {
        // 5000 + 4500 = 9500, 20% off is 1900.
        let mut cart = cart_with(&[(without_promotion(), 1), (with_active_promotion(), 1)]);
        cart.coupon = Some(coupon(20));
        assert_eq!(cart.total_with_coupon(today()), Price::new(7600));
    }

    #[test]
    fn test_coupon_ignores_expiry() {
        let mut expired = coupon(10);
        expired.expiry_date = today() - Days::new(1);
        expired.is_active = false;
        let mut cart = cart_with(&[(without_promotion(), 2)]);
        cart.coupon = Some(expired);
        assert_eq!(cart.total_with_coupon(today()), Price::new(9000));
    }

    #[test]
    fn test_check_empty_is_true_when_cart_has_lines() {
        let empty = cart_with(&[]);
        assert!(!check_empty(&empty));
        assert!(empty.is_empty());

        let filled = cart_with(&[(without_promotion(), 2)]);
        assert!(filled.check_empty());
        assert!(!filled.is_empty());
        assert_eq!(filled.item_count(), 2);
    }
}
