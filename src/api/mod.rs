//! HTTP API
//!
//! Public routes live under `/api`, admin routes under `/api/admin` behind
//! [`extract::require_admin`]. Every body is wrapped in the
//! `{ success, data | message }` envelope.

pub mod blogs;
pub mod cart;
pub mod catalog;
pub mod contact;
pub mod coupons;
pub mod extract;
pub mod orders;
pub mod reviews;
pub mod settings;
pub mod wishlist;

use axum::{http::StatusCode, middleware, routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> { Json(Envelope { success: true, data }) }

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) { (StatusCode::CREATED, ok(data)) }

/// Success envelope carrying only a message.
pub fn done(message: &str) -> Json<serde_json::Value> { Json(json!({ "success": true, "message": message })) }

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "healthy", "service": "maison-storefront"}))),
        Err(e) => {
            tracing::error!(error = ?e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "unhealthy", "service": "maison-storefront"})))
        }
    }
}

async fn not_found() -> ApiError { ApiError::NotFound("route") }

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .merge(catalog::admin_routes())
        .merge(blogs::admin_routes())
        .merge(reviews::admin_routes())
        .merge(coupons::admin_routes())
        .merge(orders::admin_routes())
        .merge(contact::admin_routes())
        .merge(settings::admin_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), extract::require_admin));

    let api = Router::new()
        .merge(catalog::routes())
        .merge(blogs::routes())
        .merge(reviews::routes())
        .merge(coupons::routes())
        .merge(orders::routes())
        .merge(cart::routes())
        .merge(wishlist::routes())
        .merge(contact::routes())
        .merge(settings::routes())
        .nest("/admin", admin);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}
