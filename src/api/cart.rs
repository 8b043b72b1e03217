//! Guest identities and the server-side cart

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::coupons::find_coupon;
use super::extract::{Path, Query as QueryParams, ValidatedJson};
use super::wishlist;
use super::{created, ok, Envelope};
use crate::domain::aggregates::{Cart, CartAdjustment, CartLine, GuestUser, Owner, Product, ProductError};
use crate::domain::pricing::{OrderTotals, Priced};
use crate::domain::value_objects::{CouponCode, Money};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{Query, Store, StoreError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/guests", post(create_guest))
        .route("/guests/:id", get(touch_guest))
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:product_id", put(update_item).delete(remove_item))
        .route("/cart/merge", post(merge_cart))
        .route("/cart/claim", post(claim))
}

async fn create_guest(State(s): State<AppState>) -> ApiResult<(StatusCode, Json<Envelope<GuestUser>>)> {
    let guest = GuestUser::new();
    s.store.insert(&guest).await?;
    tracing::debug!(guest_id = %guest.id, "guest created");
    Ok(created(guest))
}

async fn touch_guest(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Envelope<GuestUser>>> {
    let mut guest: GuestUser = s.store.get(id).await?.ok_or(ApiError::NotFound("guest"))?;
    guest.seen();
    s.store.save(&guest).await?;
    Ok(ok(guest))
}

/// A cart line resolved against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: Uuid,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    pub stock: u32,
}

impl Priced for CartItemView {
    fn unit_price(&self) -> Money { self.unit_price }
    fn quantity(&self) -> u32 { self.quantity }
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: Uuid,
    pub owner: Owner,
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub coupon_code: Option<CouponCode>,
    /// Why the requested coupon was left out of the totals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_error: Option<String>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    /// Lines dropped or reduced because the catalog changed underneath them.
    pub adjustments: Vec<CartAdjustment>,
}

pub(crate) fn owner_query(owner: &Owner) -> Query { Query::new().filter("owner", owner) }

/// The owner's cart, created on first use.
pub(crate) async fn cart_for(store: &Store, owner: &Owner) -> ApiResult<Cart> {
    if let Some(cart) = store.find_one(owner_query(owner)).await? {
        return Ok(cart);
    }
    let cart = Cart::new(owner.clone());
    match store.insert(&cart).await {
        Ok(()) => Ok(cart),
        // Lost a race with a concurrent request creating the same cart.
        Err(StoreError::Duplicate { .. }) => store.find_one(owner_query(owner)).await?.ok_or(ApiError::NotFound("cart")),
        Err(e) => Err(e.into()),
    }
}

async fn catalog_for(store: &Store, ids: Vec<Uuid>) -> ApiResult<HashMap<Uuid, Product>> {
    let mut catalog = HashMap::new();
    for id in ids {
        if let Some(product) = store.get::<Product>(id).await? {
            catalog.insert(id, product);
        }
    }
    Ok(catalog)
}

/// Check the cart against the catalog, price it and persist any adjustments.
async fn resolve(s: &AppState, mut cart: Cart, coupon: Option<&str>, persisted: bool) -> ApiResult<CartView> {
    let ids: Vec<Uuid> = cart.items.iter().map(|l| l.product_id).collect();
    let catalog = catalog_for(&s.store, ids).await?;
    let adjustments = cart.reconcile(&catalog);
    if persisted && !adjustments.is_empty() {
        tracing::info!(owner = %cart.owner, adjusted = adjustments.len(), "cart reconciled against catalog");
        s.store.save(&cart).await?;
    }

    let items: Vec<CartItemView> = cart
        .items
        .iter()
        .filter_map(|line| {
            let product = catalog.get(&line.product_id)?;
            let quantity = line.quantity.value();
            Some(CartItemView {
                product_id: product.id,
                name: product.name.clone(),
                slug: product.slug.to_string(),
                image: product.primary_image().map(str::to_string),
                unit_price: product.price,
                quantity,
                line_total: product.price.multiply(quantity),
                stock: product.stock,
            })
        })
        .collect();

    let settings = s.settings().await?;
    let now = Utc::now();
    let mut coupon_error = None;
    let mut coupon = match coupon.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => match find_coupon(&s.store, code).await {
            Ok(coupon) => Some(coupon),
            Err(ApiError::Coupon(e)) => {
                coupon_error = Some(e.to_string());
                None
            }
            Err(e) => return Err(e),
        },
        None => None,
    };
    // A coupon that does not apply is reported, not fatal; the cart is priced without it.
    let totals = match OrderTotals::compute(&items, coupon.as_ref(), &settings, now) {
        Ok(totals) => totals,
        Err(e) => {
            coupon_error = Some(e.to_string());
            coupon = None;
            OrderTotals::compute(&items, None, &settings, now)?
        }
    };

    Ok(CartView {
        id: cart.id,
        item_count: cart.item_count(),
        owner: cart.owner,
        items,
        coupon_code: coupon.map(|c| c.code),
        coupon_error,
        totals,
        adjustments,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct CartParams {
    pub coupon: Option<String>,
}

/// Reading never creates a cart; an owner without one sees an empty cart.
async fn get_cart(State(s): State<AppState>, owner: Owner, QueryParams(p): QueryParams<CartParams>) -> ApiResult<Json<Envelope<CartView>>> {
    let existing: Option<Cart> = s.store.find_one(owner_query(&owner)).await?;
    let persisted = existing.is_some();
    let cart = existing.unwrap_or_else(|| Cart::new(owner));
    Ok(ok(resolve(&s, cart, p.coupon.as_deref(), persisted).await?))
}

/// Products that can go in a cart: present and active.
async fn sellable(store: &Store, product_id: Uuid) -> ApiResult<Product> {
    let product: Product = store.get(product_id).await?.ok_or(ApiError::NotFound("product"))?;
    if !product.is_active() {
        return Err(ProductError::NotAvailable { name: product.name }.into());
    }
    Ok(product)
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 99))]
    pub quantity: u32,
}

async fn add_item(State(s): State<AppState>, owner: Owner, ValidatedJson(r): ValidatedJson<AddItemRequest>) -> ApiResult<Json<Envelope<CartView>>> {
    let product = sellable(&s.store, r.product_id).await?;
    let mut cart = cart_for(&s.store, &owner).await?;
    cart.add_item(product.id, r.quantity);
    product.ensure_available(cart.quantity_of(product.id).unwrap_or(r.quantity))?;
    s.store.save(&cart).await?;
    Ok(ok(resolve(&s, cart, None, true).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(range(max = 99))]
    pub quantity: u32,
}

async fn update_item(
    State(s): State<AppState>,
    owner: Owner,
    Path(product_id): Path<Uuid>,
    ValidatedJson(r): ValidatedJson<UpdateItemRequest>,
) -> ApiResult<Json<Envelope<CartView>>> {
    let mut cart = cart_for(&s.store, &owner).await?;
    if r.quantity > 0 {
        sellable(&s.store, product_id).await?.ensure_available(r.quantity)?;
    }
    cart.update_quantity(product_id, r.quantity)?;
    s.store.save(&cart).await?;
    Ok(ok(resolve(&s, cart, None, true).await?))
}

async fn remove_item(State(s): State<AppState>, owner: Owner, Path(product_id): Path<Uuid>) -> ApiResult<Json<Envelope<CartView>>> {
    let mut cart = cart_for(&s.store, &owner).await?;
    cart.remove_item(product_id)?;
    s.store.save(&cart).await?;
    Ok(ok(resolve(&s, cart, None, true).await?))
}

async fn clear_cart(State(s): State<AppState>, owner: Owner) -> ApiResult<Json<Envelope<CartView>>> {
    let mut cart = cart_for(&s.store, &owner).await?;
    cart.clear();
    s.store.save(&cart).await?;
    Ok(ok(resolve(&s, cart, None, true).await?))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MergeRequest {
    #[validate(length(max = 200))]
    pub items: Vec<LineRequest>,
}

/// Fold the client's local lines into the server cart. Over-large quantities
/// are clamped, not rejected; the reconcile step then trims to stock.
async fn merge_cart(State(s): State<AppState>, owner: Owner, ValidatedJson(r): ValidatedJson<MergeRequest>) -> ApiResult<Json<Envelope<CartView>>> {
    let incoming: Vec<CartLine> = r.items.iter().map(|l| CartLine::new(l.product_id, l.quantity)).collect();
    let mut cart = cart_for(&s.store, &owner).await?;
    cart.merge(&incoming);
    s.store.save(&cart).await?;
    tracing::debug!(owner = %owner, lines = incoming.len(), "local cart merged");
    Ok(ok(resolve(&s, cart, None, true).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClaimRequest {
    pub guest_id: Uuid,
}

/// Hand a guest's cart and wishlist over to the signed-in user.
async fn claim(State(s): State<AppState>, owner: Owner, ValidatedJson(r): ValidatedJson<ClaimRequest>) -> ApiResult<Json<Envelope<CartView>>> {
    if owner.is_guest() {
        return Err(ApiError::BadRequest("only a signed-in user can claim a guest cart".into()));
    }
    let guest = Owner::Guest(r.guest_id);
    let mut cart = cart_for(&s.store, &owner).await?;

    if let Some(guest_cart) = s.store.find_one::<Cart>(owner_query(&guest)).await? {
        cart.merge(&guest_cart.items);
        s.store.save(&cart).await?;
        s.store.delete::<Cart>(guest_cart.id).await?;
    }
    wishlist::claim(&s.store, &guest, &owner).await?;
    s.store.delete::<GuestUser>(r.guest_id).await?;

    tracing::info!(guest_id = %r.guest_id, user = %owner, "guest cart claimed");
    Ok(ok(resolve(&s, cart, None, true).await?))
}
