//! Cart Aggregate
//!
//! One cart per [`Owner`]. Lines hold only product ids and quantities; prices
//! are resolved against the catalog whenever the cart is read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Owner, Product};
use crate::domain::value_objects::Quantity;
use crate::store::{Collection, Document, UniqueKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: Quantity,
}

impl CartLine {
    pub fn new(product_id: Uuid, quantity: u32) -> Self {
        Self { product_id, quantity: Quantity::new(quantity) }
    }
}

/// A change made to the cart while checking it against the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartAdjustment {
    Removed { product_id: Uuid },
    Reduced { product_id: Uuid, quantity: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub owner: Owner,
    pub items: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("product is not in the cart")]
    ItemNotFound,
}

impl Cart {
    pub fn new(owner: Owner) -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(), owner, items: vec![], created_at: now, updated_at: now }
    }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity.value()).sum() }

    pub fn quantity_of(&self, product_id: Uuid) -> Option<u32> {
        self.items.iter().find(|i| i.product_id == product_id).map(|i| i.quantity.value())
    }

    /// Add `quantity` units, on top of what is already in the cart.
    pub fn add_item(&mut self, product_id: Uuid, quantity: u32) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            existing.quantity = existing.quantity.add(quantity);
        } else {
            self.items.push(CartLine::new(product_id, quantity));
        }
        self.touch();
    }

    /// Set the quantity of a line; zero removes it.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 { return self.remove_item(product_id); }
        let item = self.items.iter_mut().find(|i| i.product_id == product_id).ok_or(CartError::ItemNotFound)?;
        item.quantity = Quantity::new(quantity);
        self.touch();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); self.touch(); }

    /// Fold another copy of this cart into it. A product present on both
    /// sides keeps the larger quantity, so merging state that mirrors the
    /// server never doubles it.
    pub fn merge(&mut self, incoming: &[CartLine]) {
        for line in incoming {
            match self.items.iter_mut().find(|i| i.product_id == line.product_id) {
                Some(existing) => existing.quantity = existing.quantity.max(line.quantity),
                None => self.items.push(*line),
            }
        }
        self.touch();
    }

    /// Drop lines whose product is gone or not for sale and clamp the rest
    /// to available stock.
    pub fn reconcile(&mut self, catalog: &HashMap<Uuid, Product>) -> Vec<CartAdjustment> {
        let mut adjustments = Vec::new();
        self.items.retain_mut(|line| {
            let Some(product) = catalog.get(&line.product_id).filter(|p| p.is_active()) else {
                adjustments.push(CartAdjustment::Removed { product_id: line.product_id });
                return false;
            };
            match line.quantity.limit_to(product.stock) {
                None => {
                    adjustments.push(CartAdjustment::Removed { product_id: line.product_id });
                    false
                }
                Some(q) if q != line.quantity => {
                    line.quantity = q;
                    adjustments.push(CartAdjustment::Reduced { product_id: line.product_id, quantity: q.value() });
                    true
                }
                Some(_) => true,
            }
        });
        if !adjustments.is_empty() { self.touch(); }
        adjustments
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for Cart {
    const COLLECTION: Collection = Collection::Carts;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
    fn unique_keys(&self) -> Vec<UniqueKey> { vec![UniqueKey::new("owner", self.owner.key())] }
}
