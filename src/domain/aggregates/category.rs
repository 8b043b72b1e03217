//! Product categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Slug;
use crate::store::{Collection, Document, UniqueKey};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn create(name: impl Into<String>, slug: Slug) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(), name: name.into(), slug, description: None, image: None,
            parent_id: None, created_at: now, updated_at: now,
        }
    }
}

impl Document for Category {
    const COLLECTION: Collection = Collection::Categories;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
    fn unique_keys(&self) -> Vec<UniqueKey> { vec![UniqueKey::new("slug", self.slug.as_str())] }
}
