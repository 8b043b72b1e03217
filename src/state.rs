//! Shared request state

use crate::config::Config;
use crate::domain::aggregates::StoreSettings;
use crate::events::EventBus;
use crate::store::{Store, StoreError};

#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Store,
    pub events: EventBus,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(store: Store, events: EventBus, config: &Config) -> Self {
        Self { store, events, admin_token: config.admin_token.clone() }
    }

    /// State over an empty in-memory store.
    pub fn in_memory(admin_token: Option<&str>) -> Self {
        Self { store: Store::memory(), events: EventBus::default(), admin_token: admin_token.map(str::to_string) }
    }

    /// Current settings, falling back to defaults until an admin saves some.
    pub async fn settings(&self) -> Result<StoreSettings, StoreError> {
        Ok(self.store.get(StoreSettings::ID).await?.unwrap_or_default())
    }
}
