//! Guest identities and cart/wishlist ownership

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::store::{Collection, Document};

/// Who a cart or wishlist belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    Guest(Uuid),
    User(String),
}

impl Owner {
    /// Stable string used for the one-document-per-owner constraint.
    pub fn key(&self) -> String {
        match self {
            Self::Guest(id) => format!("guest:{id}"),
            Self::User(id) => format!("user:{id}"),
        }
    }

    pub fn is_guest(&self) -> bool { matches!(self, Self::Guest(_)) }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.key()) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuestUser {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl GuestUser {
    pub fn new() -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(), created_at: now, last_seen_at: now }
    }

    pub fn owner(&self) -> Owner { Owner::Guest(self.id) }
    pub fn seen(&mut self) { self.last_seen_at = Utc::now(); }

    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool { self.last_seen_at < cutoff }
}

impl Default for GuestUser {
    fn default() -> Self { Self::new() }
}

impl Document for GuestUser {
    const COLLECTION: Collection = Collection::Guests;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_owner_serialization() {
        let id = Uuid::nil();
        let json = serde_json::to_value(Owner::Guest(id)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "guest", "id": id}));
        assert_eq!(Owner::User("u-42".into()).key(), "user:u-42");
    }

    #[test]
    fn test_guest_staleness() {
        let mut guest = GuestUser::new();
        guest.last_seen_at = Utc::now() - Duration::days(40);
        assert!(guest.is_stale(Utc::now() - Duration::days(30)));
        guest.seen();
        assert!(!guest.is_stale(Utc::now() - Duration::days(30)));
    }
}
