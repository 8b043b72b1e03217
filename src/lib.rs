//! Maison Storefront
//!
//! JSON API behind a luxury storefront and its admin dashboard.
//!
//! ## Features
//! - Product catalog, categories and product Q&A
//! - Blog posts with moderated comments
//! - Product reviews with rating summaries
//! - Guest and registered carts and wishlists, with merge on login
//! - Coupons and order totals (discount, shipping, tax)
//! - Orders with a status workflow and stock bookkeeping
//! - A client-side cart/wishlist mirror with optimistic updates

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod maintenance;
pub mod state;
pub mod store;
pub mod sync;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
