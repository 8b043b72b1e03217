//! Store settings

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::extract::ValidatedJson;
use super::{ok, Envelope};
use crate::domain::aggregates::StoreSettings;
use crate::domain::value_objects::{Money, Percentage};
use crate::error::ApiResult;
use crate::state::AppState;
use crate::store::StoreError;

pub fn routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

async fn get_settings(State(s): State<AppState>) -> ApiResult<Json<Envelope<StoreSettings>>> {
    Ok(ok(s.settings().await?))
}

fn currency_code(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ValidationError::new("currency_code"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SettingsRequest {
    #[validate(length(min = 1, max = 100))]
    pub store_name: String,
    #[validate(custom = "currency_code")]
    pub currency: String,
    pub tax_rate: Decimal,
    pub shipping_fee: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
    #[validate(email)]
    pub contact_email: Option<String>,
}

async fn update_settings(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<SettingsRequest>) -> ApiResult<Json<Envelope<StoreSettings>>> {
    let existing: Option<StoreSettings> = s.store.get(StoreSettings::ID).await?;
    let mut settings = existing.clone().unwrap_or_default();
    settings.store_name = r.store_name.trim().to_string();
    settings.currency = r.currency.to_uppercase();
    settings.tax_rate = Percentage::new(r.tax_rate)?;
    settings.shipping_fee = Money::non_negative(r.shipping_fee)?;
    settings.free_shipping_threshold = r.free_shipping_threshold.map(Money::non_negative).transpose()?;
    settings.contact_email = r.contact_email.map(|e| e.trim().to_lowercase());
    settings.updated_at = Utc::now();

    let saved = if existing.is_some() { s.store.save(&settings).await } else { s.store.insert(&settings).await };
    match saved {
        // Another admin created the singleton between our read and write.
        Err(StoreError::Duplicate { .. }) => s.store.save(&settings).await?,
        other => other?,
    }
    tracing::info!(store_name = %settings.store_name, "store settings updated");
    Ok(ok(settings))
}
