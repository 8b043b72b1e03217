//! Order total computation
//!
//! ```text
//! subtotal = Σ unit_price × quantity
//! discount = coupon discount (≤ subtotal)
//! shipping = 0 if no items or (subtotal − discount) ≥ free threshold, else flat fee
//! tax      = (subtotal − discount) × tax_rate
//! total    = subtotal − discount + shipping + tax
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Coupon, CouponError, StoreSettings};
use crate::domain::value_objects::Money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

/// Something with a price and a quantity.
pub trait Priced {
    fn unit_price(&self) -> Money;
    fn quantity(&self) -> u32;

    fn line_total(&self) -> Money { self.unit_price().multiply(self.quantity()) }
}

pub fn subtotal<P: Priced>(lines: &[P]) -> Money { lines.iter().map(Priced::line_total).sum() }

impl OrderTotals {
    pub fn compute<P: Priced>(
        lines: &[P],
        coupon: Option<&Coupon>,
        settings: &StoreSettings,
        now: DateTime<Utc>,
    ) -> Result<Self, CouponError> {
        let subtotal = subtotal(lines);
        let discount = match coupon {
            Some(c) => c.evaluate(subtotal, now)?,
            None => Money::ZERO,
        };
        let taxable = subtotal.saturating_sub(discount);

        let free = settings.free_shipping_threshold.is_some_and(|t| taxable >= t);
        let shipping = if lines.is_empty() || free { Money::ZERO } else { settings.shipping_fee };
        let tax = settings.tax_rate.of(taxable);

        Ok(Self { subtotal, discount, shipping, tax, total: taxable + shipping + tax })
    }
}
