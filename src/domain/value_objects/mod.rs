//! Value objects shared by the storefront documents

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("SKU must not be empty")]
    EmptySku,
    #[error("SKU must be at most 50 characters")]
    SkuTooLong,
    #[error("slug must contain at least one letter or digit")]
    EmptySlug,
    #[error("coupon code must be 3 to 30 letters, digits, '-' or '_'")]
    InvalidCouponCode,
    #[error("rating must be between 1 and 5")]
    RatingOutOfRange,
    #[error("percentage must be between 0 and 100")]
    PercentageOutOfRange,
    #[error("amount must not be negative")]
    NegativeAmount,
    #[error("quantity must be between 1 and {MAX_LINE_QUANTITY}")]
    QuantityOutOfRange,
}

/// SKU (Stock Keeping Unit), stored uppercased
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(ValueError::EmptySku); }
        if value.chars().count() > 50 { return Err(ValueError::SkuTooLong); }
        Ok(Self(value))
    }

    /// Random SKU for products created without one.
    pub fn generate() -> Self { Self(format!("MS-{:08}", rand::random::<u32>() % 100_000_000)) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for Sku {
    type Error = ValueError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self { sku.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// URL slug: lowercase ASCII words joined by '-'
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Slugify arbitrary text. Non-alphanumeric runs collapse into a single '-'.
    pub fn new(text: &str) -> Result<Self, ValueError> {
        let mut slug = String::with_capacity(text.len());
        let mut pending_dash = false;
        for c in text.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() { slug.push('-'); }
                pending_dash = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        if slug.is_empty() { return Err(ValueError::EmptySlug); }
        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for Slug {
    type Error = ValueError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(&value) }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self { slug.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Coupon code, stored uppercased
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub fn new(value: &str) -> Result<Self, ValueError> {
        let value = value.trim().to_uppercase();
        let valid_chars = value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !(3..=30).contains(&value.len()) || !valid_chars {
            return Err(ValueError::InvalidCouponCode);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for CouponCode {
    type Error = ValueError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(&value) }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self { code.0 }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Review rating, 1 to 5 stars
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if (1..=5).contains(&value) { Ok(Self(value)) } else { Err(ValueError::RatingOutOfRange) }
    }
    pub fn value(self) -> u8 { self.0 }
}

impl TryFrom<u8> for Rating {
    type Error = ValueError;
    fn try_from(value: u8) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self { rating.0 }
}

/// Percentage in the closed range 0..=100
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    pub fn new(value: Decimal) -> Result<Self, ValueError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(ValueError::PercentageOutOfRange);
        }
        Ok(Self(value))
    }
    pub fn zero() -> Self { Self(Decimal::ZERO) }
    pub fn value(self) -> Decimal { self.0 }

    /// `self` percent of `amount`, rounded to cents.
    pub fn of(self, amount: Money) -> Money { Money::new(amount.amount() * self.0 / Decimal::ONE_HUNDRED) }
}

impl TryFrom<Decimal> for Percentage {
    type Error = ValueError;
    fn try_from(value: Decimal) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Percentage> for Decimal {
    fn from(p: Percentage) -> Self { p.0 }
}

/// Money amount in the store currency, always held at two decimal places
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, 2));

    pub fn new(amount: Decimal) -> Self {
        let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        Self(rounded)
    }

    /// Like [`Money::new`] but refuses negative amounts.
    pub fn non_negative(amount: Decimal) -> Result<Self, ValueError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(ValueError::NegativeAmount); }
        Ok(Self::new(amount))
    }

    pub fn from_cents(cents: i64) -> Self { Self(Decimal::new(cents, 2)) }
    pub fn amount(self) -> Decimal { self.0 }
    pub fn is_zero(self) -> bool { self.0.is_zero() }
    pub fn multiply(self, qty: u32) -> Money { Money::new(self.0 * Decimal::from(qty)) }

    /// Subtraction that floors at zero.
    pub fn saturating_sub(self, other: Money) -> Money {
        if other.0 >= self.0 { Money::ZERO } else { Money(self.0 - other.0) }
    }
}

impl Default for Money {
    fn default() -> Self { Self::ZERO }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self { Self::new(amount) }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self { money.0 }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money { Money(self.0 + rhs.0) }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money { Money(self.0 - rhs.0) }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self { iter.fold(Money::ZERO, Add::add) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

/// Cart line quantity, clamped to `1..=MAX_LINE_QUANTITY`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value.clamp(1, MAX_LINE_QUANTITY)) }
    pub fn value(self) -> u32 { self.0 }
    pub fn add(self, other: u32) -> Self { Self::new(self.0.saturating_add(other)) }

    /// Clamp to what is in stock; `None` when nothing is.
    pub fn limit_to(self, stock: u32) -> Option<Self> {
        if stock == 0 { None } else { Some(Self(self.0.min(stock))) }
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self { Self::new(value) }
}

impl From<Quantity> for u32 {
    fn from(qty: Quantity) -> Self { qty.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku() {
        let sku = Sku::new(" prod-001 ").unwrap();
        assert_eq!(sku.as_str(), "PROD-001");
        assert_eq!(Sku::new("   "), Err(ValueError::EmptySku));
        assert_eq!(Sku::new("x".repeat(51)), Err(ValueError::SkuTooLong));
    }

    #[test]
    fn test_slug() {
        assert_eq!(Slug::new("  Silk Scarf -- Ivory & Gold ").unwrap().as_str(), "silk-scarf-ivory-gold");
        assert_eq!(Slug::new("***"), Err(ValueError::EmptySlug));
    }

    #[test]
    fn test_coupon_code() {
        assert_eq!(CouponCode::new(" welcome10 ").unwrap().as_str(), "WELCOME10");
        assert!(CouponCode::new("no spaces").is_err());
        assert!(CouponCode::new("AB").is_err());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert_eq!(Rating::new(5).unwrap().value(), 5);
        assert!(Rating::new(6).is_err());
        assert!(serde_json::from_str::<Rating>("7").is_err());
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(Percentage::new(Decimal::new(-1, 0)).is_err());
        assert!(Percentage::new(Decimal::new(101, 0)).is_err());
        let p = Percentage::new(Decimal::new(15, 0)).unwrap();
        assert_eq!(p.of(Money::from_cents(19_999)), Money::from_cents(3_000));
    }

    #[test]
    fn test_money_rounding_and_arithmetic() {
        assert_eq!(Money::new(Decimal::new(10_005, 3)), Money::from_cents(1_001));
        let a = Money::from_cents(10_000);
        let b = Money::from_cents(5_000);
        assert_eq!(a + b, Money::from_cents(15_000));
        assert_eq!(b.saturating_sub(a), Money::ZERO);
        assert_eq!(b.multiply(3), Money::from_cents(15_000));
        assert!(Money::non_negative(Decimal::new(-1, 2)).is_err());
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"100.00\"");
    }

    #[test]
    fn test_quantity_clamps() {
        assert_eq!(Quantity::new(0).value(), 1);
        assert_eq!(Quantity::new(500).value(), MAX_LINE_QUANTITY);
        assert_eq!(Quantity::new(98).add(5).value(), MAX_LINE_QUANTITY);
        assert_eq!(Quantity::new(4).limit_to(2), Some(Quantity::new(2)));
        assert_eq!(Quantity::new(4).limit_to(0), None);
    }
}
