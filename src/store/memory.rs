//! In-process document store, used by tests and when no database is configured.

use super::{contains, Collection, DocumentStore, Query, RawDocument, Result, SortOrder, StoreError, UniqueKey};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug)]
struct Entry {
    id: Uuid,
    body: Value,
    created_at: DateTime<Utc>,
    seq: u64,
    unique_keys: Vec<UniqueKey>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<Collection, Vec<Entry>>,
    unique: HashMap<(Collection, &'static str, String), Uuid>,
    seq: u64,
}

impl Inner {
    fn claim_keys(&mut self, collection: Collection, id: Uuid, keys: &[UniqueKey]) -> Result<()> {
        for key in keys {
            if let Some(owner) = self.unique.get(&(collection, key.field, key.value.clone())) {
                if *owner != id {
                    return Err(StoreError::Duplicate {
                        collection,
                        field: key.field.to_string(),
                        value: key.value.clone(),
                    });
                }
            }
        }
        for key in keys {
            self.unique.insert((collection, key.field, key.value.clone()), id);
        }
        Ok(())
    }

    fn release_keys(&mut self, collection: Collection, keys: &[UniqueKey]) {
        for key in keys {
            self.unique.remove(&(collection, key.field, key.value.clone()));
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

fn matches(entry: &Entry, query: &Query) -> bool {
    let filter = Value::Object(query.filter.clone());
    if !contains(&entry.body, &filter) {
        return false;
    }
    match &query.search {
        Some(search) => entry
            .body
            .get(search.field)
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_lowercase().contains(&search.term.to_lowercase())),
        None => true,
    }
}

fn sorted<'a>(entries: impl Iterator<Item = &'a Entry>, query: &Query) -> Vec<&'a Entry> {
    let mut out: Vec<&Entry> = entries.filter(|e| matches(e, query)).collect();
    out.sort_by_key(|e| (e.created_at, e.seq));
    if query.sort == SortOrder::NewestFirst {
        out.reverse();
    }
    out
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, doc: RawDocument) -> Result<()> {
        let mut inner = self.inner.write().await;
        let exists = inner.collections.get(&collection).is_some_and(|c| c.iter().any(|e| e.id == doc.id));
        if exists {
            return Err(StoreError::Duplicate { collection, field: "id".into(), value: doc.id.to_string() });
        }
        inner.claim_keys(collection, doc.id, &doc.unique_keys)?;
        inner.seq += 1;
        let seq = inner.seq;
        inner.collections.entry(collection).or_default().push(Entry {
            id: doc.id,
            body: doc.body,
            created_at: doc.created_at,
            seq,
            unique_keys: doc.unique_keys,
        });
        Ok(())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&collection)
            .and_then(|c| c.iter().find(|e| e.id == id))
            .map(|e| e.body.clone()))
    }

    async fn replace(&self, collection: Collection, doc: RawDocument) -> Result<()> {
        let mut inner = self.inner.write().await;
        let old_keys = inner
            .collections
            .get(&collection)
            .and_then(|c| c.iter().find(|e| e.id == doc.id))
            .map(|e| e.unique_keys.clone())
            .ok_or(StoreError::NotFound(collection))?;

        inner.release_keys(collection, &old_keys);
        if let Err(e) = inner.claim_keys(collection, doc.id, &doc.unique_keys) {
            inner.claim_keys(collection, doc.id, &old_keys)?;
            return Err(e);
        }

        if let Some(entry) = inner
            .collections
            .get_mut(&collection)
            .and_then(|c| c.iter_mut().find(|e| e.id == doc.id))
        {
            entry.body = doc.body;
            entry.unique_keys = doc.unique_keys;
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(entries) = inner.collections.get_mut(&collection) else { return Ok(false) };
        let Some(pos) = entries.iter().position(|e| e.id == id) else { return Ok(false) };
        let entry = entries.remove(pos);
        inner.release_keys(collection, &entry.unique_keys);
        Ok(true)
    }

    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>> {
        let inner = self.inner.read().await;
        let Some(entries) = inner.collections.get(&collection) else { return Ok(Vec::new()) };
        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query.limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(sorted(entries.iter(), query)
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|e| e.body.clone())
            .collect())
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64> {
        let inner = self.inner.read().await;
        let n = inner.collections.get(&collection).map_or(0, |c| c.iter().filter(|e| matches(e, query)).count());
        Ok(n as u64)
    }

    async fn ping(&self) -> Result<()> { Ok(()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(id: Uuid, body: Value, keys: Vec<UniqueKey>) -> RawDocument {
        RawDocument { id, body, unique_keys: keys, created_at: Utc::now() }
    }

    #[tokio::test]
    async fn test_unique_keys_enforced_and_released() {
        let store = MemoryStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.insert(Collection::Coupons, raw(a, json!({"code": "VIP"}), vec![UniqueKey::new("code", "VIP")])).await.unwrap();

        let dup = store.insert(Collection::Coupons, raw(b, json!({"code": "VIP"}), vec![UniqueKey::new("code", "VIP")])).await;
        assert!(matches!(dup, Err(StoreError::Duplicate { .. })));

        // Renaming frees the old code for others.
        store.replace(Collection::Coupons, raw(a, json!({"code": "VIP2"}), vec![UniqueKey::new("code", "VIP2")])).await.unwrap();
        store.insert(Collection::Coupons, raw(b, json!({"code": "VIP"}), vec![UniqueKey::new("code", "VIP")])).await.unwrap();

        assert!(store.delete(Collection::Coupons, a).await.unwrap());
        assert!(!store.delete(Collection::Coupons, a).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_old_keys() {
        let store = MemoryStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.insert(Collection::Products, raw(a, json!({"sku": "A"}), vec![UniqueKey::new("sku", "A")])).await.unwrap();
        store.insert(Collection::Products, raw(b, json!({"sku": "B"}), vec![UniqueKey::new("sku", "B")])).await.unwrap();

        let clash = store.replace(Collection::Products, raw(a, json!({"sku": "B"}), vec![UniqueKey::new("sku", "B")])).await;
        assert!(clash.is_err());
        let other = store.insert(Collection::Products, raw(Uuid::new_v4(), json!({}), vec![UniqueKey::new("sku", "A")])).await;
        assert!(other.is_err());
        assert_eq!(store.get(Collection::Products, a).await.unwrap(), Some(json!({"sku": "A"})));
    }

    #[tokio::test]
    async fn test_find_filters_searches_and_pages() {
        let store = MemoryStore::default();
        for (i, name) in ["Silk Scarf", "Cashmere Scarf", "Leather Tote"].iter().enumerate() {
            let body = json!({"name": name, "status": if i == 2 { "draft" } else { "active" }});
            store.insert(Collection::Products, raw(Uuid::new_v4(), body, vec![])).await.unwrap();
        }
        let active = Query::new().filter("status", "active");
        assert_eq!(store.count(Collection::Products, &active).await.unwrap(), 2);

        let scarves = Query::new().search("name", "SCARF");
        let found = store.find(Collection::Products, &scarves).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0]["name"], "Cashmere Scarf");

        let oldest = Query { limit: Some(1), skip: 1, ..Query::new().oldest_first() };
        let found = store.find(Collection::Products, &oldest).await.unwrap();
        assert_eq!(found[0]["name"], "Cashmere Scarf");
    }
}
