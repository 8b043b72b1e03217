//! Document storage
//!
//! Every collection holds JSON documents keyed by id. Backends only need to
//! understand containment filters (`{"status": "active"}` matches documents
//! whose `status` field equals `"active"`), a case-insensitive substring
//! search on one string field, creation-time ordering and unique keys.
//! The typed [`Store`] handle maps documents to and from Rust structs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a {collection} document with {field} '{value}' already exists")]
    Duplicate { collection: Collection, field: String, value: String },

    #[error("{0} document not found")]
    NotFound(Collection),

    #[error("malformed document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error")]
    Sql(#[source] sqlx::Error),

    #[error("migration failed")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self { Self::Sql(error) }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Products,
    Categories,
    Orders,
    Coupons,
    BlogPosts,
    Comments,
    Reviews,
    Questions,
    ContactMessages,
    Carts,
    Wishlists,
    Guests,
    Settings,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Orders => "orders",
            Self::Coupons => "coupons",
            Self::BlogPosts => "blog_posts",
            Self::Comments => "comments",
            Self::Reviews => "reviews",
            Self::Questions => "questions",
            Self::ContactMessages => "contact_messages",
            Self::Carts => "carts",
            Self::Wishlists => "wishlists",
            Self::Guests => "guests",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A field value that must be unique across a collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniqueKey {
    pub field: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self { field, value: value.into() }
    }
}

/// A serialized document as handed to a backend.
#[derive(Clone, Debug)]
pub struct RawDocument {
    pub id: Uuid,
    pub body: Value,
    pub unique_keys: Vec<UniqueKey>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Search {
    pub field: &'static str,
    pub term: String,
}

#[derive(Clone, Debug, Default)]
pub struct Query {
    pub filter: Map<String, Value>,
    pub search: Option<Search>,
    pub sort: SortOrder,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Query {
    pub fn new() -> Self { Self::default() }

    /// Require `field` to contain `value` (equality for scalars).
    pub fn filter(mut self, field: &str, value: impl Serialize) -> Self {
        self.filter.insert(field.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
        self
    }

    /// Require the array `field` to include `value`.
    pub fn includes(mut self, field: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.filter.insert(field.to_string(), Value::Array(vec![value]));
        self
    }

    pub fn search(mut self, field: &'static str, term: impl Into<String>) -> Self {
        let term = term.into();
        if !term.trim().is_empty() {
            self.search = Some(Search { field, term: term.trim().to_string() });
        }
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.sort = SortOrder::OldestFirst;
        self
    }

    pub fn paginate(mut self, page: &Page) -> Self {
        self.skip = page.offset();
        self.limit = Some(u64::from(page.per_page));
        self
    }
}

/// JSON containment with the semantics of Postgres `@>` below the top level.
pub fn contains(doc: &Value, pattern: &Value) -> bool {
    match (doc, pattern) {
        (Value::Object(doc), Value::Object(pattern)) => pattern
            .iter()
            .all(|(k, v)| doc.get(k).is_some_and(|d| contains(d, v))),
        (Value::Array(doc), Value::Array(pattern)) => pattern
            .iter()
            .all(|p| doc.iter().any(|d| contains(d, p))),
        (doc, pattern) => doc == pattern,
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: Collection, doc: RawDocument) -> Result<()>;

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>>;

    /// Replace an existing document. Fails with [`StoreError::NotFound`] if absent.
    async fn replace(&self, collection: Collection, doc: RawDocument) -> Result<()>;

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool>;

    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>>;

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64>;

    async fn ping(&self) -> Result<()>;
}

/// A document type stored in one collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;

    fn unique_keys(&self) -> Vec<UniqueKey> { Vec::new() }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Page {
    #[serde(default = "Page::first")]
    pub page: u32,
    #[serde(default = "Page::default_size")]
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self { Self { page: 1, per_page: Self::default_size() } }
}

impl Page {
    pub const MAX_SIZE: u32 = 100;

    fn first() -> u32 { 1 }
    fn default_size() -> u32 { 20 }

    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page: page.max(1), per_page: per_page.clamp(1, Self::MAX_SIZE) }
    }

    /// Clamp values that arrived over the wire.
    pub fn normalized(self) -> Self { Self::new(self.page, self.per_page) }

    pub fn offset(&self) -> u64 { u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page) }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

/// Typed, cloneable handle over a backend.
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn DocumentStore>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_struct("Store").finish_non_exhaustive() }
}

impl Store {
    pub fn new(backend: impl DocumentStore + 'static) -> Self { Self { inner: Arc::new(backend) } }

    pub fn memory() -> Self { Self::new(MemoryStore::default()) }

    fn raw<T: Document>(doc: &T) -> Result<RawDocument> {
        Ok(RawDocument {
            id: doc.id(),
            body: serde_json::to_value(doc)?,
            unique_keys: doc.unique_keys(),
            created_at: doc.created_at(),
        })
    }

    pub async fn insert<T: Document>(&self, doc: &T) -> Result<()> {
        self.inner.insert(T::COLLECTION, Self::raw(doc)?).await
    }

    pub async fn get<T: Document>(&self, id: Uuid) -> Result<Option<T>> {
        self.inner.get(T::COLLECTION, id).await?.map(serde_json::from_value).transpose().map_err(Into::into)
    }

    /// Like [`Store::get`] but a missing document is an error.
    pub async fn fetch<T: Document>(&self, id: Uuid) -> Result<T> {
        self.get(id).await?.ok_or(StoreError::NotFound(T::COLLECTION))
    }

    pub async fn save<T: Document>(&self, doc: &T) -> Result<()> {
        self.inner.replace(T::COLLECTION, Self::raw(doc)?).await
    }

    pub async fn delete<T: Document>(&self, id: Uuid) -> Result<bool> {
        self.inner.delete(T::COLLECTION, id).await
    }

    pub async fn find<T: Document>(&self, query: &Query) -> Result<Vec<T>> {
        self.inner
            .find(T::COLLECTION, query)
            .await?
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }

    pub async fn find_one<T: Document>(&self, query: Query) -> Result<Option<T>> {
        let query = Query { limit: Some(1), ..query };
        Ok(self.find(&query).await?.into_iter().next())
    }

    pub async fn count<T: Document>(&self, query: &Query) -> Result<u64> {
        self.inner.count(T::COLLECTION, query).await
    }

    pub async fn page<T: Document>(&self, query: Query, page: Page) -> Result<Paginated<T>> {
        let page = page.normalized();
        let total = self.count::<T>(&query).await?;
        let items = self.find(&query.paginate(&page)).await?;
        Ok(Paginated { items, total, page: page.page, per_page: page.per_page })
    }

    pub async fn ping(&self) -> Result<()> { self.inner.ping().await }
}
