//! HTTP error type and the `{ success: false, message }` envelope.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::domain::aggregates::{CartError, CouponError, OrderError, ProductError};
use crate::domain::value_objects::ValueError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("admin access required")]
    Forbidden,

    /// An extractor refused the request before the handler ran.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

macro_rules! rejection {
    ($($rejection:ty),+) => {$(
        impl From<$rejection> for ApiError {
            fn from(rejection: $rejection) -> Self {
                Self::Rejected { status: rejection.status(), message: rejection.body_text() }
            }
        }
    )+};
}

rejection!(JsonRejection, PathRejection, QueryRejection);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound(_)) | Self::NotFound(_) | Self::Cart(CartError::ItemNotFound) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Duplicate { .. }) | Self::Conflict(_) | Self::Order(OrderError::InvalidTransition { .. }) => {
                StatusCode::CONFLICT
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Coupon(CouponError::Unknown(_)) => StatusCode::NOT_FOUND,
            Self::Coupon(_) | Self::Product(_) | Self::Order(OrderError::NoItems) | Self::Validation(_) | Self::Value(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Rejected { status, .. } => *status,
        }
    }
}

/// Flatten validator output into `field: message; field: message`. Nested
/// structs and lists are reported by path, e.g. `shipping_address.city`.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts = Vec::new();
    collect(errors, "", &mut parts);
    parts.sort();
    parts.join("; ")
}

fn collect(errors: &ValidationErrors, prefix: &str, parts: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() { (*field).to_string() } else { format!("{prefix}.{field}") };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let reason = errs
                    .first()
                    .map_or_else(|| "invalid".to_string(), |e| e.message.as_ref().map_or_else(|| e.code.to_string(), ToString::to_string));
                parts.push(format!("{path}: {reason}"));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, parts),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), parts);
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            _ if status.is_server_error() => {
                tracing::error!(error = ?self, "request failed");
                "Internal server error".to_string()
            }
            Self::Validation(errors) => describe(errors),
            other => other.to_string(),
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
