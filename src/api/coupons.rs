//! Coupons: admin management and public validation

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::extract::{Path, Query as QueryParams, ValidatedJson};
use super::{created, done, ok, Envelope};
use crate::domain::aggregates::{Coupon, CouponError, Discount};
use crate::domain::value_objects::{CouponCode, Money, Percentage};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{Page, Paginated, Query, Store};

pub fn routes() -> Router<AppState> {
    Router::new().route("/coupons/validate", post(validate_coupon))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/coupons", get(list_coupons).post(create_coupon))
        .route("/coupons/:id", get(get_coupon).put(update_coupon).delete(delete_coupon))
}

/// Find a coupon by code; unknown codes are a [`CouponError::Unknown`].
pub async fn find_coupon(store: &Store, code: &str) -> ApiResult<Coupon> {
    let code = CouponCode::new(code).map_err(|_| CouponError::Unknown(code.trim().to_uppercase()))?;
    store
        .find_one::<Coupon>(Query::new().filter("code", &code))
        .await?
        .ok_or_else(|| CouponError::Unknown(code.to_string()).into())
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1, max = 30))]
    pub code: String,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CouponQuote {
    pub code: CouponCode,
    pub discount: Money,
    pub subtotal_after_discount: Money,
    pub description: Option<String>,
}

async fn validate_coupon(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<ValidateCouponRequest>) -> ApiResult<Json<Envelope<CouponQuote>>> {
    let subtotal = Money::non_negative(r.subtotal)?;
    let coupon = find_coupon(&s.store, &r.code).await?;
    let discount = coupon.evaluate(subtotal, Utc::now())?;
    Ok(ok(CouponQuote {
        code: coupon.code,
        discount,
        subtotal_after_discount: subtotal.saturating_sub(discount),
        description: coupon.description,
    }))
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO { Ok(()) } else { Err(ValidationError::new("must_be_positive")) }
}

fn not_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() { Err(ValidationError::new("must_not_be_negative")) } else { Ok(()) }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CouponRequest {
    #[validate(length(min = 3, max = 30))]
    pub code: String,
    #[validate(length(max = 300))]
    pub description: Option<String>,
    pub discount_type: DiscountKind,
    #[validate(custom = "positive")]
    pub discount_value: Decimal,
    #[validate(custom = "positive")]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    #[validate(custom = "not_negative")]
    pub min_order_amount: Decimal,
    #[validate(range(min = 1))]
    pub usage_limit: Option<u32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool { true }

impl CouponRequest {
    fn discount(&self) -> ApiResult<Discount> {
        Ok(match self.discount_type {
            DiscountKind::Percentage => Discount::Percentage(Percentage::new(self.discount_value)?),
            DiscountKind::Fixed => Discount::Fixed(Money::new(self.discount_value)),
        })
    }

    fn apply(self, coupon: &mut Coupon) -> ApiResult<()> {
        if let (Some(start), Some(end)) = (self.starts_at, self.expires_at) {
            if end <= start { return Err(ApiError::BadRequest("expires_at must be after starts_at".into())); }
        }
        coupon.discount = self.discount()?;
        coupon.code = CouponCode::new(&self.code)?;
        coupon.description = self.description;
        coupon.max_discount = self.max_discount.map(Money::new);
        coupon.min_order_amount = Money::new(self.min_order_amount);
        coupon.usage_limit = self.usage_limit;
        coupon.starts_at = self.starts_at;
        coupon.expires_at = self.expires_at;
        coupon.active = self.active;
        coupon.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CouponListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub active: Option<bool>,
    pub search: Option<String>,
}

async fn list_coupons(State(s): State<AppState>, QueryParams(p): QueryParams<CouponListParams>) -> ApiResult<Json<Envelope<Paginated<Coupon>>>> {
    let mut query = Query::new();
    if let Some(active) = p.active { query = query.filter("active", active); }
    if let Some(search) = p.search { query = query.search("code", search); }
    let page = Page::new(p.page.unwrap_or(1), p.per_page.unwrap_or(20));
    Ok(ok(s.store.page(query, page).await?))
}

async fn get_coupon(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Envelope<Coupon>>> {
    Ok(ok(s.store.get(id).await?.ok_or(ApiError::NotFound("coupon"))?))
}

async fn create_coupon(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<CouponRequest>) -> ApiResult<(StatusCode, Json<Envelope<Coupon>>)> {
    let mut coupon = Coupon::create(CouponCode::new(&r.code)?, r.discount()?);
    r.apply(&mut coupon)?;
    s.store.insert(&coupon).await?;
    tracing::info!(code = %coupon.code, "coupon created");
    Ok(created(coupon))
}

/// `used_count` is left alone; it only moves when orders redeem the coupon.
async fn update_coupon(State(s): State<AppState>, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<CouponRequest>) -> ApiResult<Json<Envelope<Coupon>>> {
    let mut coupon: Coupon = s.store.fetch(id).await?;
    r.apply(&mut coupon)?;
    s.store.save(&coupon).await?;
    Ok(ok(coupon))
}

async fn delete_coupon(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    if !s.store.delete::<Coupon>(id).await? { return Err(ApiError::NotFound("coupon")); }
    Ok(done("coupon deleted"))
}
