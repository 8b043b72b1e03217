//! Store-wide settings (singleton document)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Money, Percentage};
use crate::store::{Collection, Document};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub id: Uuid,
    pub store_name: String,
    pub currency: String,
    pub tax_rate: Percentage,
    pub shipping_fee: Money,
    pub free_shipping_threshold: Option<Money>,
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreSettings {
    /// The settings document always lives under the nil id.
    pub const ID: Uuid = Uuid::nil();
}

impl Default for StoreSettings {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Self::ID,
            store_name: "Maison".to_string(),
            currency: "USD".to_string(),
            tax_rate: Percentage::zero(),
            shipping_fee: Money::from_cents(1_500),
            free_shipping_threshold: Some(Money::from_cents(50_000)),
            contact_email: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Document for StoreSettings {
    const COLLECTION: Collection = Collection::Settings;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}
