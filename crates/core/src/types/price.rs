//! Money types: integer prices, currencies and coupon discount ratios.
//!
//! Prices are whole amounts in the currency's minor unit. The default
//! currency (XOF) has no subunit, so `Price::new(5000)` is 5000 francs.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Sub};
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price in the minor currency unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(0);

    /// Create a price from an amount in the minor unit.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// The amount in the minor unit.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    /// Whether this price is zero.
    ///
    /// A zero promotional price means "no promotion".
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

/// Unit price times quantity.
impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * i64::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// ISO 4217 currency codes accepted by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// West African CFA franc.
    #[default]
    XOF,
    /// Central African CFA franc.
    XAF,
    EUR,
    USD,
}

impl CurrencyCode {
    /// The ISO 4217 code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::XOF => "XOF",
            Self::XAF => "XAF",
            Self::EUR => "EUR",
            Self::USD => "USD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "XOF" => Ok(Self::XOF),
            "XAF" => Ok(Self::XAF),
            "EUR" => Ok(Self::EUR),
            "USD" => Ok(Self::USD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

/// Errors that can occur when constructing a [`DiscountRatio`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountRatioError {
    /// The ratio is negative or not strictly below one.
    #[error("discount ratio must be in [0, 1), got {0}")]
    OutOfRange(Decimal),
}

/// The fraction of a cart total a coupon takes off, in `[0, 1)`.
///
/// Stored as a decimal so that `0.15 * 10000` is exactly `1500`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DiscountRatio(Decimal);

impl DiscountRatio {
    /// Create a ratio from a decimal fraction.
    ///
    /// # Errors
    ///
    /// Returns `DiscountRatioError::OutOfRange` unless `0 <= ratio < 1`.
    pub fn new(ratio: Decimal) -> Result<Self, DiscountRatioError> {
        if ratio < Decimal::ZERO || ratio >= Decimal::ONE {
            return Err(DiscountRatioError::OutOfRange(ratio));
        }
        Ok(Self(ratio.normalize()))
    }

    /// Create a ratio from a whole percentage (`15` → `0.15`).
    ///
    /// # Errors
    ///
    /// Returns `DiscountRatioError::OutOfRange` for 100 or more.
    pub fn from_percent(percent: u32) -> Result<Self, DiscountRatioError> {
        Self::new(Decimal::new(i64::from(percent), 2))
    }

    /// The ratio as a decimal fraction.
    #[must_use]
    pub const fn as_decimal(self) -> Decimal {
        self.0
    }

    /// The discounted total: `floor(total * (1 - ratio))`.
    #[must_use]
    pub fn apply(self, total: Price) -> Price {
        let remaining = (Decimal::from(total.amount()) * (Decimal::ONE - self.0)).floor();
        Price::new(remaining.to_i64().unwrap_or_default())
    }
}

impl TryFrom<Decimal> for DiscountRatio {
    type Error = DiscountRatioError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountRatio> for Decimal {
    fn from(ratio: DiscountRatio) -> Self {
        ratio.0
    }
}

impl fmt::Display for DiscountRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}
