//! Client-side cart and wishlist mirror
//!
//! [`SyncedCart`] keeps a local copy of the visitor's cart and wishlist so the
//! storefront can render changes immediately. Each mutation is applied and
//! persisted locally first, then sent to the server through a [`CartApi`].
//! When the server call fails the previous state is restored and persisted
//! again, so local state never drifts from what the server accepted.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::MAX_LINE_QUANTITY;

pub use http::HttpCartApi;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid identity header: {0}")]
    InvalidIdentity(String),

    #[error("local storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("malformed local state: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// What the browser keeps between page loads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default)]
    pub items: Vec<LocalLine>,
    #[serde(default)]
    pub wishlist: Vec<Uuid>,
}

impl LocalState {
    pub fn quantity_of(&self, product_id: Uuid) -> Option<u32> {
        self.items.iter().find(|l| l.product_id == product_id).map(|l| l.quantity)
    }

    pub fn add(&mut self, product_id: Uuid, quantity: u32) {
        match self.items.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY),
            None => self.items.push(LocalLine { product_id, quantity: quantity.clamp(1, MAX_LINE_QUANTITY) }),
        }
    }

    /// Zero removes the line.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
        } else if let Some(line) = self.items.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity.min(MAX_LINE_QUANTITY);
        }
    }

    pub fn remove(&mut self, product_id: Uuid) { self.items.retain(|l| l.product_id != product_id); }

    pub fn is_wishlisted(&self, product_id: Uuid) -> bool { self.wishlist.contains(&product_id) }

    /// Returns the new membership.
    pub fn toggle_wishlist(&mut self, product_id: Uuid) -> bool {
        self.set_wishlisted(product_id, !self.is_wishlisted(product_id));
        self.is_wishlisted(product_id)
    }

    fn set_wishlisted(&mut self, product_id: Uuid, wishlisted: bool) {
        if wishlisted {
            if !self.is_wishlisted(product_id) { self.wishlist.push(product_id); }
        } else {
            self.wishlist.retain(|id| *id != product_id);
        }
    }
}

/// Where local state is persisted.
pub trait LocalStorage: Send + Sync {
    fn load(&self) -> Result<LocalState, SyncError>;
    fn save(&self, state: &LocalState) -> Result<(), SyncError>;
}

/// JSON file on disk; a missing file reads as empty state.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl LocalStorage for JsonFileStorage {
    fn load(&self) -> Result<LocalState, SyncError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LocalState::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &LocalState) -> Result<(), SyncError> {
        // Write then rename so a crash never leaves half a file behind.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec(state)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<LocalState>,
}

impl LocalStorage for MemoryStorage {
    fn load(&self) -> Result<LocalState, SyncError> {
        Ok(self.state.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, state: &LocalState) -> Result<(), SyncError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
        Ok(())
    }
}

/// Server side of the mirror.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn add_item(&self, product_id: Uuid, quantity: u32) -> Result<(), SyncError>;

    async fn set_quantity(&self, product_id: Uuid, quantity: u32) -> Result<(), SyncError>;

    async fn remove_item(&self, product_id: Uuid) -> Result<(), SyncError>;

    /// Returns whether the product is wishlisted afterwards.
    async fn toggle_wishlist(&self, product_id: Uuid) -> Result<bool, SyncError>;

    /// Push local state into the server copy and return the merged result.
    async fn merge(&self, state: &LocalState) -> Result<LocalState, SyncError>;
}

pub struct SyncedCart<A, S> {
    api: A,
    storage: S,
    state: LocalState,
}

impl<A: CartApi, S: LocalStorage> SyncedCart<A, S> {
    pub fn load(api: A, storage: S) -> Result<Self, SyncError> {
        let state = storage.load()?;
        Ok(Self { api, storage, state })
    }

    pub fn state(&self) -> &LocalState { &self.state }

    pub async fn add_item(&mut self, product_id: Uuid, quantity: u32) -> Result<(), SyncError> {
        let snapshot = self.apply(|s| s.add(product_id, quantity))?;
        let result = self.api.add_item(product_id, quantity).await;
        self.settle(snapshot, result)
    }

    pub async fn set_quantity(&mut self, product_id: Uuid, quantity: u32) -> Result<(), SyncError> {
        let snapshot = self.apply(|s| s.set_quantity(product_id, quantity))?;
        let result = if quantity == 0 {
            self.api.remove_item(product_id).await
        } else {
            self.api.set_quantity(product_id, quantity).await
        };
        self.settle(snapshot, result)
    }

    pub async fn remove_item(&mut self, product_id: Uuid) -> Result<(), SyncError> {
        let snapshot = self.apply(|s| s.remove(product_id))?;
        let result = self.api.remove_item(product_id).await;
        self.settle(snapshot, result)
    }

    pub async fn toggle_wishlist(&mut self, product_id: Uuid) -> Result<bool, SyncError> {
        let snapshot = self.apply(|s| {
            s.toggle_wishlist(product_id);
        })?;
        let result = self.api.toggle_wishlist(product_id).await;
        let wishlisted = self.settle(snapshot, result)?;
        if wishlisted != self.state.is_wishlisted(product_id) {
            // The server had a different view; take its answer.
            self.state.set_wishlisted(product_id, wishlisted);
            self.storage.save(&self.state)?;
        }
        Ok(wishlisted)
    }

    /// Merge local state into the server and adopt the server's result.
    pub async fn reconcile(&mut self) -> Result<(), SyncError> {
        let merged = self.api.merge(&self.state).await?;
        tracing::debug!(items = merged.items.len(), wishlist = merged.wishlist.len(), "local cart reconciled");
        self.storage.save(&merged)?;
        self.state = merged;
        Ok(())
    }

    /// Apply a mutation locally and persist it, returning the prior state.
    fn apply(&mut self, mutate: impl FnOnce(&mut LocalState)) -> Result<LocalState, SyncError> {
        let snapshot = self.state.clone();
        mutate(&mut self.state);
        if let Err(e) = self.storage.save(&self.state) {
            self.state = snapshot;
            return Err(e);
        }
        Ok(snapshot)
    }

    /// Roll back to `snapshot` if the server call failed.
    fn settle<T>(&mut self, snapshot: LocalState, result: Result<T, SyncError>) -> Result<T, SyncError> {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "server rejected cart change, reverting");
            self.state = snapshot;
            if let Err(save) = self.storage.save(&self.state) {
                tracing::error!(error = %save, "failed to persist reverted cart");
            }
        }
        result
    }
}
