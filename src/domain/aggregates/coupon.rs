//! Coupon Aggregate
//!
//! A coupon is applicable when it is active, inside its validity window,
//! under its usage limit and the order subtotal reaches its minimum. The
//! discount it yields never exceeds the subtotal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::{CouponCode, Money, Percentage};
use crate::store::{Collection, Document, UniqueKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    Percentage(Percentage),
    Fixed(Money),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    pub code: CouponCode,
    pub description: Option<String>,
    pub discount: Discount,
    /// Cap on what a percentage coupon may take off.
    pub max_discount: Option<Money>,
    pub min_order_amount: Money,
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("coupon {0} does not exist")]
    Unknown(String),
    #[error("coupon is not active")]
    Inactive,
    #[error("coupon is not valid yet")]
    NotStarted,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon usage limit reached")]
    UsageLimitReached,
    #[error("order subtotal must be at least {minimum}")]
    MinimumNotMet { minimum: Money },
}

impl Coupon {
    pub fn create(code: CouponCode, discount: Discount) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(), code, description: None, discount, max_discount: None,
            min_order_amount: Money::ZERO, usage_limit: None, used_count: 0,
            starts_at: None, expires_at: None, active: true, created_at: now, updated_at: now,
        }
    }

    pub fn remaining_uses(&self) -> Option<u32> {
        self.usage_limit.map(|limit| limit.saturating_sub(self.used_count))
    }

    /// Validate the coupon against an order subtotal and return the discount it yields.
    pub fn evaluate(&self, subtotal: Money, now: DateTime<Utc>) -> Result<Money, CouponError> {
        if !self.active { return Err(CouponError::Inactive); }
        if self.starts_at.is_some_and(|s| now < s) { return Err(CouponError::NotStarted); }
        if self.expires_at.is_some_and(|e| now >= e) { return Err(CouponError::Expired); }
        if self.remaining_uses() == Some(0) { return Err(CouponError::UsageLimitReached); }
        if subtotal < self.min_order_amount {
            return Err(CouponError::MinimumNotMet { minimum: self.min_order_amount });
        }

        let raw = match self.discount {
            Discount::Percentage(p) => {
                let off = p.of(subtotal);
                self.max_discount.map_or(off, |cap| off.min(cap))
            }
            Discount::Fixed(amount) => amount,
        };
        Ok(raw.min(subtotal))
    }

    pub fn redeem(&mut self) {
        self.used_count = self.used_count.saturating_add(1);
        self.updated_at = Utc::now();
    }
}

impl Document for Coupon {
    const COLLECTION: Collection = Collection::Coupons;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
    fn unique_keys(&self) -> Vec<UniqueKey> { vec![UniqueKey::new("code", self.code.as_str())] }
}
