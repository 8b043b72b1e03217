//! [`CartApi`] over the storefront's HTTP endpoints

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{CartApi, LocalLine, LocalState, SyncError};
use crate::api::extract::{GUEST_HEADER, USER_HEADER};
use crate::domain::aggregates::Owner;

#[derive(Debug, Clone)]
pub struct HttpCartApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct CartBody {
    items: Vec<LocalLine>,
}

#[derive(Deserialize)]
struct WishlistBody {
    product_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
struct ToggleBody {
    wishlisted: bool,
}

#[derive(Serialize)]
struct Line {
    product_id: Uuid,
    quantity: u32,
}

impl HttpCartApi {
    /// `base_url` is the storefront root, e.g. `https://shop.example.com`.
    pub fn new(base_url: impl Into<String>, owner: &Owner) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        let (name, value) = match owner {
            Owner::User(id) => (USER_HEADER, id.clone()),
            Owner::Guest(id) => (GUEST_HEADER, id.to_string()),
        };
        headers.insert(name, HeaderValue::from_str(&value).map_err(|e| SyncError::InvalidIdentity(e.to_string()))?);

        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String { format!("{}/api{path}", self.base_url) }

    async fn handle<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SyncError> {
        let status = response.status();
        if status.is_success() {
            let envelope: Envelope<T> = response.json().await?;
            return Ok(envelope.data);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(SyncError::Rejected { status: status.as_u16(), message })
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn add_item(&self, product_id: Uuid, quantity: u32) -> Result<(), SyncError> {
        let response = self.client.post(self.url("/cart/items")).json(&Line { product_id, quantity }).send().await?;
        Self::handle::<CartBody>(response).await.map(drop)
    }

    async fn set_quantity(&self, product_id: Uuid, quantity: u32) -> Result<(), SyncError> {
        let response = self
            .client
            .put(self.url(&format!("/cart/items/{product_id}")))
            .json(&json!({ "quantity": quantity }))
            .send()
            .await?;
        Self::handle::<CartBody>(response).await.map(drop)
    }

    async fn remove_item(&self, product_id: Uuid) -> Result<(), SyncError> {
        let response = self.client.delete(self.url(&format!("/cart/items/{product_id}"))).send().await?;
        Self::handle::<CartBody>(response).await.map(drop)
    }

    async fn toggle_wishlist(&self, product_id: Uuid) -> Result<bool, SyncError> {
        let response = self.client.post(self.url("/wishlist/toggle")).json(&json!({ "product_id": product_id })).send().await?;
        Ok(Self::handle::<ToggleBody>(response).await?.wishlisted)
    }

    async fn merge(&self, state: &LocalState) -> Result<LocalState, SyncError> {
        let items: Vec<Line> = state.items.iter().map(|l| Line { product_id: l.product_id, quantity: l.quantity }).collect();
        let response = self.client.post(self.url("/cart/merge")).json(&json!({ "items": items })).send().await?;
        let cart: CartBody = Self::handle(response).await?;

        let response = self
            .client
            .post(self.url("/wishlist/merge"))
            .json(&json!({ "product_ids": state.wishlist }))
            .send()
            .await?;
        let wishlist: WishlistBody = Self::handle(response).await?;

        Ok(LocalState { items: cart.items, wishlist: wishlist.product_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let api = HttpCartApi::new("http://localhost:8083/", &Owner::Guest(Uuid::nil())).unwrap();
        assert_eq!(api.url("/cart"), "http://localhost:8083/api/cart");
    }

    #[test]
    fn test_rejects_unencodable_user_id() {
        let err = HttpCartApi::new("http://localhost", &Owner::User("bad\nid".into())).unwrap_err();
        assert!(matches!(err, SyncError::InvalidIdentity(_)));
    }
}
