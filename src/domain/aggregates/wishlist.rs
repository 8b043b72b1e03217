//! Wishlist Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::Owner;
use crate::store::{Collection, Document, UniqueKey};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    pub id: Uuid,
    pub owner: Owner,
    pub product_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wishlist {
    pub fn new(owner: Owner) -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(), owner, product_ids: vec![], created_at: now, updated_at: now }
    }

    pub fn contains(&self, product_id: Uuid) -> bool { self.product_ids.contains(&product_id) }

    /// Returns false if the product was already there.
    pub fn add(&mut self, product_id: Uuid) -> bool {
        if self.contains(product_id) { return false; }
        self.product_ids.push(product_id);
        self.touch();
        true
    }

    /// Returns false if the product was not there.
    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.product_ids.len();
        self.product_ids.retain(|id| *id != product_id);
        let removed = self.product_ids.len() != before;
        if removed { self.touch(); }
        removed
    }

    /// Flip membership and return whether the product is now wishlisted.
    pub fn toggle(&mut self, product_id: Uuid) -> bool {
        if self.remove(product_id) { false } else { self.add(product_id) }
    }

    /// Set union, preserving existing order.
    pub fn merge(&mut self, product_ids: &[Uuid]) {
        for id in product_ids {
            self.add(*id);
        }
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for Wishlist {
    const COLLECTION: Collection = Collection::Wishlists;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
    fn unique_keys(&self) -> Vec<UniqueKey> { vec![UniqueKey::new("owner", self.owner.key())] }
}
