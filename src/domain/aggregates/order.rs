//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Owner, Product};
use crate::domain::pricing::{OrderTotals, Priced};
use crate::domain::value_objects::{CouponCode, Money};
use crate::store::{Collection, Document, UniqueKey};

/// Line item as it was at purchase time; later catalog edits do not touch it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

impl LineItem {
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            sku: product.sku.to_string(),
            image: product.primary_image().map(str::to_string),
            unit_price: product.price,
            quantity,
            line_total: product.price.multiply(quantity),
        }
    }
}

impl Priced for LineItem {
    fn unit_price(&self) -> Money { self.unit_price }
    fn quantity(&self) -> u32 { self.quantity }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether an order may move from `self` to `next`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending | Confirmed | Processing, Cancelled)
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Card,
    BankTransfer,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub owner: Owner,
    pub email: String,
    pub customer_name: String,
    pub phone: Option<String>,
    pub items: Vec<LineItem>,
    pub shipping_address: Address,
    pub coupon_code: Option<CouponCode>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("an order needs at least one item")]
    NoItems,
    #[error("cannot change order status from {from:?} to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

/// `MS-YYYYMMDD-NNNNNN`
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    format!("MS-{}-{:06}", now.format("%Y%m%d"), rand::random::<u32>() % 1_000_000)
}

impl Order {
    pub fn place(
        owner: Owner,
        email: impl Into<String>,
        customer_name: impl Into<String>,
        items: Vec<LineItem>,
        shipping_address: Address,
        totals: OrderTotals,
    ) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(), order_number: generate_order_number(now), owner,
            email: email.into().trim().to_lowercase(), customer_name: customer_name.into(), phone: None,
            items, shipping_address, coupon_code: None, totals,
            status: OrderStatus::Pending, payment_method: PaymentMethod::default(),
            payment_status: PaymentStatus::Pending, tracking_number: None, notes: None,
            created_at: now, updated_at: now,
        })
    }

    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    /// Move to `next`, returning the previous status.
    pub fn transition(&mut self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        let from = self.status;
        if !from.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from, to: next });
        }
        self.status = next;
        if next == OrderStatus::Delivered && self.payment_method == PaymentMethod::CashOnDelivery {
            self.payment_status = PaymentStatus::Paid;
        }
        self.touch();
        Ok(from)
    }

    pub fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for Order {
    const COLLECTION: Collection = Collection::Orders;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
    fn unique_keys(&self) -> Vec<UniqueKey> { vec![UniqueKey::new("order_number", &self.order_number)] }
}
