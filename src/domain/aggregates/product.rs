//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::{Money, Slug, Sku};
use crate::store::{Collection, Document, UniqueKey};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: Slug,
    pub sku: Sku,
    pub description: String,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    pub category_id: Option<Uuid>,
    pub images: Vec<String>,
    pub stock: u32,
    pub status: ProductStatus,
    pub featured: bool,
    pub tags: Vec<String>,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("{name} is not available")]
    NotAvailable { name: String },
    #[error("only {available} of {name} left in stock")]
    InsufficientStock { name: String, available: u32 },
}

impl Product {
    pub fn create(sku: Sku, name: impl Into<String>, slug: Slug, price: Money) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(), name: name.into(), slug, sku, description: String::new(),
            price, compare_at_price: None, category_id: None, images: vec![], stock: 0,
            status: ProductStatus::Draft, featured: false, tags: vec![], view_count: 0,
            created_at: now, updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool { self.status == ProductStatus::Active }
    pub fn is_in_stock(&self) -> bool { self.stock > 0 }
    pub fn primary_image(&self) -> Option<&str> { self.images.first().map(String::as_str) }

    /// Percentage off the compare-at price, when the product is on sale.
    pub fn sale_percent(&self) -> Option<u32> {
        let compare = self.compare_at_price?;
        if compare <= self.price || compare.is_zero() { return None; }
        let off = (compare.amount() - self.price.amount()) * rust_decimal::Decimal::ONE_HUNDRED / compare.amount();
        off.round().try_into().ok()
    }

    pub fn publish(&mut self) { self.status = ProductStatus::Active; self.touch(); }
    pub fn archive(&mut self) { self.status = ProductStatus::Archived; self.touch(); }

    pub fn record_view(&mut self) { self.view_count = self.view_count.saturating_add(1); }

    /// Check that `qty` units can be sold right now.
    pub fn ensure_available(&self, qty: u32) -> Result<(), ProductError> {
        if !self.is_active() {
            return Err(ProductError::NotAvailable { name: self.name.clone() });
        }
        if qty > self.stock {
            return Err(ProductError::InsufficientStock { name: self.name.clone(), available: self.stock });
        }
        Ok(())
    }

    pub fn remove_stock(&mut self, qty: u32) -> Result<(), ProductError> {
        self.ensure_available(qty)?;
        self.stock -= qty;
        self.touch();
        Ok(())
    }

    pub fn add_stock(&mut self, qty: u32) { self.stock = self.stock.saturating_add(qty); self.touch(); }

    pub fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for Product {
    const COLLECTION: Collection = Collection::Products;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("sku", self.sku.as_str()), UniqueKey::new("slug", self.slug.as_str())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        let mut p = Product::create(Sku::new("TEST-001").unwrap(), "Silk Scarf", Slug::new("silk-scarf").unwrap(), Money::from_cents(19_900));
        p.publish();
        p
    }

    #[test]
    fn test_product_create() {
        let p = Product::create(Sku::new("TEST-001").unwrap(), "Test Product", Slug::new("test").unwrap(), Money::from_cents(1_999));
        assert_eq!(p.name, "Test Product");
        assert_eq!(p.status, ProductStatus::Draft);
        assert!(!p.is_in_stock());
    }

    #[test]
    fn test_inventory() {
        let mut p = product();
        p.add_stock(10);
        assert!(p.is_in_stock());
        p.remove_stock(5).unwrap();
        assert_eq!(p.stock, 5);
        assert_eq!(
            p.remove_stock(6),
            Err(ProductError::InsufficientStock { name: "Silk Scarf".into(), available: 5 })
        );
    }

    #[test]
    fn test_inactive_product_not_sellable() {
        let mut p = product();
        p.add_stock(3);
        p.archive();
        assert!(matches!(p.ensure_available(1), Err(ProductError::NotAvailable { .. })));
    }

    #[test]
    fn test_sale_percent() {
        let mut p = product();
        assert_eq!(p.sale_percent(), None);
        p.compare_at_price = Some(Money::from_cents(24_900));
        assert_eq!(p.sale_percent(), Some(20));
    }
}
