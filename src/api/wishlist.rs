//! Wishlists

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::cart::owner_query;
use super::catalog::find_product;
use super::extract::{Path, ValidatedJson};
use super::{ok, Envelope};
use crate::domain::aggregates::{Owner, Product, Wishlist};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{Store, StoreError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wishlist", get(get_wishlist))
        .route("/wishlist/items", post(add_item))
        .route("/wishlist/items/:product_id", delete(remove_item))
        .route("/wishlist/toggle", post(toggle_item))
        .route("/wishlist/merge", post(merge_wishlist))
        .route("/wishlist/claim", post(claim_wishlist))
}

async fn wishlist_for(store: &Store, owner: &Owner) -> ApiResult<Wishlist> {
    if let Some(wishlist) = store.find_one(owner_query(owner)).await? {
        return Ok(wishlist);
    }
    let wishlist = Wishlist::new(owner.clone());
    match store.insert(&wishlist).await {
        Ok(()) => Ok(wishlist),
        Err(StoreError::Duplicate { .. }) => store.find_one(owner_query(owner)).await?.ok_or(ApiError::NotFound("wishlist")),
        Err(e) => Err(e.into()),
    }
}

/// Move a guest's wishlist onto `user` and drop the guest copy.
pub(crate) async fn claim(store: &Store, guest: &Owner, user: &Owner) -> ApiResult<()> {
    let Some(guest_list) = store.find_one::<Wishlist>(owner_query(guest)).await? else {
        return Ok(());
    };
    let mut wishlist = wishlist_for(store, user).await?;
    wishlist.merge(&guest_list.product_ids);
    store.save(&wishlist).await?;
    store.delete::<Wishlist>(guest_list.id).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct WishlistView {
    #[serde(flatten)]
    pub wishlist: Wishlist,
    /// Wishlisted products that still exist, in wishlist order.
    pub products: Vec<Product>,
}

async fn view(store: &Store, wishlist: Wishlist) -> ApiResult<WishlistView> {
    let mut products = Vec::with_capacity(wishlist.product_ids.len());
    for id in &wishlist.product_ids {
        if let Some(product) = store.get::<Product>(*id).await? {
            products.push(product);
        }
    }
    Ok(WishlistView { wishlist, products })
}

async fn get_wishlist(State(s): State<AppState>, owner: Owner) -> ApiResult<Json<Envelope<WishlistView>>> {
    let wishlist = s.store.find_one(owner_query(&owner)).await?.unwrap_or_else(|| Wishlist::new(owner));
    Ok(ok(view(&s.store, wishlist).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ItemRequest {
    pub product_id: Uuid,
}

async fn add_item(State(s): State<AppState>, owner: Owner, ValidatedJson(r): ValidatedJson<ItemRequest>) -> ApiResult<Json<Envelope<WishlistView>>> {
    let product = find_product(&s.store, &r.product_id.to_string()).await?;
    let mut wishlist = wishlist_for(&s.store, &owner).await?;
    if wishlist.add(product.id) {
        s.store.save(&wishlist).await?;
    }
    Ok(ok(view(&s.store, wishlist).await?))
}

async fn remove_item(State(s): State<AppState>, owner: Owner, Path(product_id): Path<Uuid>) -> ApiResult<Json<Envelope<WishlistView>>> {
    let mut wishlist = wishlist_for(&s.store, &owner).await?;
    if wishlist.remove(product_id) {
        s.store.save(&wishlist).await?;
    }
    Ok(ok(view(&s.store, wishlist).await?))
}

#[derive(Debug, Serialize)]
pub struct Toggled {
    pub product_id: Uuid,
    pub wishlisted: bool,
}

async fn toggle_item(State(s): State<AppState>, owner: Owner, ValidatedJson(r): ValidatedJson<ItemRequest>) -> ApiResult<Json<Envelope<Toggled>>> {
    let mut wishlist = wishlist_for(&s.store, &owner).await?;
    // Removing a product that has since been deleted is still allowed.
    if !wishlist.contains(r.product_id) {
        find_product(&s.store, &r.product_id.to_string()).await?;
    }
    let wishlisted = wishlist.toggle(r.product_id);
    s.store.save(&wishlist).await?;
    Ok(ok(Toggled { product_id: r.product_id, wishlisted }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct MergeRequest {
    #[validate(length(max = 500))]
    pub product_ids: Vec<Uuid>,
}

/// Union the client's local wishlist into the server copy. Unknown products are skipped.
async fn merge_wishlist(State(s): State<AppState>, owner: Owner, ValidatedJson(r): ValidatedJson<MergeRequest>) -> ApiResult<Json<Envelope<WishlistView>>> {
    let mut known = Vec::with_capacity(r.product_ids.len());
    for id in r.product_ids {
        if s.store.get::<Product>(id).await?.is_some() {
            known.push(id);
        }
    }
    let mut wishlist = wishlist_for(&s.store, &owner).await?;
    wishlist.merge(&known);
    s.store.save(&wishlist).await?;
    Ok(ok(view(&s.store, wishlist).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClaimRequest {
    pub guest_id: Uuid,
}

async fn claim_wishlist(State(s): State<AppState>, owner: Owner, ValidatedJson(r): ValidatedJson<ClaimRequest>) -> ApiResult<Json<Envelope<WishlistView>>> {
    if owner.is_guest() {
        return Err(ApiError::BadRequest("only a signed-in user can claim a guest wishlist".into()));
    }
    claim(&s.store, &Owner::Guest(r.guest_id), &owner).await?;
    let wishlist = wishlist_for(&s.store, &owner).await?;
    Ok(ok(view(&s.store, wishlist).await?))
}
