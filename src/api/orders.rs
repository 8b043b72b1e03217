//! Checkout, order lookup and the admin order workflow

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::coupons::find_coupon;
use super::extract::{Path, Query as QueryParams, ValidatedJson};
use super::{created, ok, Envelope};
use crate::domain::aggregates::{
    Address, Cart, Coupon, LineItem, Order, OrderError, OrderStatus, Owner, PaymentMethod, Product,
};
use crate::domain::aggregates::order::generate_order_number;
use crate::domain::events::{CatalogEvent, DomainEvent, OrderEvent};
use crate::domain::pricing::OrderTotals;
use crate::domain::value_objects::{ValueError, MAX_LINE_QUANTITY};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{Page, Paginated, Query, StoreError};

/// Attempts at drawing an unused order number.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(my_orders).post(place_order))
        .route("/orders/track", get(track_order))
        .route("/orders/:id", get(my_order))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin_list_orders))
        .route("/orders/:id", get(admin_get_order))
        .route("/orders/:id/status", put(update_status))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(min = 1, max = 200))]
    pub line1: String,
    #[validate(length(max = 200))]
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 2, max = 60))]
    pub country: String,
}

impl From<AddressRequest> for Address {
    fn from(r: AddressRequest) -> Self {
        Self {
            full_name: r.full_name.trim().to_string(),
            line1: r.line1.trim().to_string(),
            line2: r.line2,
            city: r.city.trim().to_string(),
            state: r.state,
            postal_code: r.postal_code.trim().to_string(),
            country: r.country.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[allow(clippy::ptr_arg)]
fn line_quantities(items: &Vec<LineRequest>) -> Result<(), ValidationError> {
    if items.iter().all(|l| (1..=MAX_LINE_QUANTITY).contains(&l.quantity)) {
        Ok(())
    } else {
        let mut err = ValidationError::new("quantity");
        err.message = Some(format!("each quantity must be between 1 and {MAX_LINE_QUANTITY}").into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub customer_name: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate]
    pub shipping_address: AddressRequest,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    /// Explicit lines ("buy now"); without them the caller's cart is checked out.
    #[validate(length(min = 1, max = 100), custom = "line_quantities")]
    pub items: Option<Vec<LineRequest>>,
}

/// Sum quantities per product, keeping first-seen order. Zero lines are
/// dropped; a product summing past the line limit is refused.
fn collapse_lines(lines: impl IntoIterator<Item = (Uuid, u32)>) -> Result<Vec<(Uuid, u32)>, ValueError> {
    let mut order = Vec::new();
    let mut totals: BTreeMap<Uuid, u32> = BTreeMap::new();
    for (id, qty) in lines.into_iter().filter(|(_, qty)| *qty > 0) {
        let entry = totals.entry(id).or_insert_with(|| {
            order.push(id);
            0
        });
        *entry = entry.saturating_add(qty);
        if *entry > MAX_LINE_QUANTITY {
            return Err(ValueError::QuantityOutOfRange);
        }
    }
    Ok(order.into_iter().filter_map(|id| totals.get(&id).map(|q| (id, *q))).collect())
}

async fn place_order(State(s): State<AppState>, owner: Owner, ValidatedJson(r): ValidatedJson<CheckoutRequest>) -> ApiResult<(StatusCode, Json<Envelope<Order>>)> {
    let cart = s.store.find_one::<Cart>(Query::new().filter("owner", &owner)).await?;
    let requested = match &r.items {
        Some(items) => collapse_lines(items.iter().map(|l| (l.product_id, l.quantity)))?,
        None => collapse_lines(cart.iter().flat_map(|c| c.items.iter().map(|l| (l.product_id, l.quantity.value()))))?,
    };
    if requested.is_empty() { return Err(OrderError::NoItems.into()); }

    let mut products = Vec::with_capacity(requested.len());
    let mut items = Vec::with_capacity(requested.len());
    for (product_id, quantity) in requested {
        let product: Product = s.store.get(product_id).await?.ok_or(ApiError::NotFound("product"))?;
        product.ensure_available(quantity)?;
        items.push(LineItem::snapshot(&product, quantity));
        products.push((product, quantity));
    }

    let mut coupon: Option<Coupon> = match r.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(find_coupon(&s.store, code).await?),
        None => None,
    };
    let settings = s.settings().await?;
    let totals = OrderTotals::compute(&items, coupon.as_ref(), &settings, Utc::now())?;

    let mut order = Order::place(owner, r.email, r.customer_name.trim(), items, r.shipping_address.into(), totals)?;
    order.phone = r.phone;
    order.payment_method = r.payment_method;
    order.notes = r.notes;
    order.coupon_code = coupon.as_ref().map(|c| c.code.clone());

    let mut attempt = 1;
    loop {
        match s.store.insert(&order).await {
            Err(StoreError::Duplicate { field, .. }) if field == "order_number" && attempt < ORDER_NUMBER_ATTEMPTS => {
                attempt += 1;
                order.order_number = generate_order_number(Utc::now());
            }
            result => break result?,
        }
    }

    for (mut product, quantity) in products {
        if let Err(e) = product.remove_stock(quantity) {
            // Stock moved between the check and now; the order stands, last write wins.
            tracing::warn!(product_id = %product.id, error = %e, "stock went short during checkout");
            product.stock = 0;
        }
        s.store.save(&product).await?;
        if product.stock == 0 {
            s.events
                .publish(DomainEvent::Catalog(CatalogEvent::StockDepleted { product_id: product.id, sku: product.sku.to_string() }))
                .await;
        }
    }

    if let Some(coupon) = coupon.as_mut() {
        coupon.redeem();
        s.store.save(coupon).await?;
        s.events
            .publish(DomainEvent::Order(OrderEvent::CouponRedeemed {
                code: coupon.code.to_string(),
                order_id: order.id,
                discount: order.totals.discount,
            }))
            .await;
    }

    if r.items.is_none() {
        if let Some(mut cart) = cart {
            cart.clear();
            s.store.save(&cart).await?;
        }
    }

    tracing::info!(order_number = %order.order_number, total = %order.totals.total, "order placed");
    s.events
        .publish(DomainEvent::Order(OrderEvent::Placed {
            order_id: order.id,
            order_number: order.order_number.clone(),
            total: order.totals.total,
        }))
        .await;
    Ok(created(order))
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<OrderStatus>,
    pub email: Option<String>,
}

impl OrderListParams {
    fn page(&self) -> Page { Page::new(self.page.unwrap_or(1), self.per_page.unwrap_or(20)) }
}

async fn my_orders(State(s): State<AppState>, owner: Owner, QueryParams(p): QueryParams<OrderListParams>) -> ApiResult<Json<Envelope<Paginated<Order>>>> {
    let query = Query::new().filter("owner", &owner);
    Ok(ok(s.store.page(query, p.page()).await?))
}

async fn my_order(State(s): State<AppState>, owner: Owner, Path(id): Path<Uuid>) -> ApiResult<Json<Envelope<Order>>> {
    let order: Order = s.store.get(id).await?.filter(|o: &Order| o.owner == owner).ok_or(ApiError::NotFound("order"))?;
    Ok(ok(order))
}

#[derive(Debug, Deserialize)]
pub struct TrackParams {
    pub order_number: String,
    pub email: String,
}

/// Public lookup; both the number and the email must match.
async fn track_order(State(s): State<AppState>, QueryParams(p): QueryParams<TrackParams>) -> ApiResult<Json<Envelope<Order>>> {
    let query = Query::new()
        .filter("order_number", p.order_number.trim().to_uppercase())
        .filter("email", p.email.trim().to_lowercase());
    Ok(ok(s.store.find_one(query).await?.ok_or(ApiError::NotFound("order"))?))
}

async fn admin_list_orders(State(s): State<AppState>, QueryParams(p): QueryParams<OrderListParams>) -> ApiResult<Json<Envelope<Paginated<Order>>>> {
    let mut query = Query::new();
    if let Some(status) = p.status { query = query.filter("status", status); }
    if let Some(email) = &p.email { query = query.search("email", email.clone()); }
    Ok(ok(s.store.page(query, p.page()).await?))
}

async fn admin_get_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Envelope<Order>>> {
    Ok(ok(s.store.get(id).await?.ok_or(ApiError::NotFound("order"))?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    pub status: OrderStatus,
    #[validate(length(min = 1, max = 100))]
    pub tracking_number: Option<String>,
}

async fn update_status(State(s): State<AppState>, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<StatusRequest>) -> ApiResult<Json<Envelope<Order>>> {
    let mut order: Order = s.store.fetch(id).await?;
    let from = order.transition(r.status)?;
    if let Some(tracking) = r.tracking_number {
        order.tracking_number = Some(tracking.trim().to_string());
    }
    s.store.save(&order).await?;

    if r.status == OrderStatus::Cancelled {
        restock(&s, &order).await?;
    }

    tracing::info!(order_number = %order.order_number, ?from, to = ?r.status, "order status changed");
    s.events
        .publish(DomainEvent::Order(OrderEvent::StatusChanged { order_id: order.id, from, to: r.status }))
        .await;
    Ok(ok(order))
}

/// Return a cancelled order's units to stock. Deleted products are skipped.
async fn restock(s: &AppState, order: &Order) -> ApiResult<()> {
    for item in &order.items {
        let Some(mut product) = s.store.get::<Product>(item.product_id).await? else {
            tracing::debug!(product_id = %item.product_id, "skipping restock of deleted product");
            continue;
        };
        product.add_stock(item.quantity);
        s.store.save(&product).await?;
    }
    Ok(())
}
