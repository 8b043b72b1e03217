//! Contact form

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::extract::{Path, Query as QueryParams, ValidatedJson};
use super::{created, ok, Envelope};
use crate::domain::aggregates::{ContactMessage, MessageStatus};
use crate::domain::events::{DomainEvent, EngagementEvent};
use crate::error::ApiResult;
use crate::state::AppState;
use crate::store::{Page, Paginated, Query};

pub fn routes() -> Router<AppState> {
    Router::new().route("/contact", post(submit))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", get(list_messages))
        .route("/contact/:id/status", put(set_status))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

async fn submit(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<ContactRequest>) -> ApiResult<(StatusCode, Json<Envelope<ContactMessage>>)> {
    let mut message = ContactMessage::receive(r.name.trim(), r.email.trim().to_lowercase(), r.message.trim());
    message.subject = r.subject.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    s.store.insert(&message).await?;
    s.events
        .publish(DomainEvent::Engagement(EngagementEvent::ContactReceived { message_id: message.id, email: message.email.clone() }))
        .await;
    Ok(created(message))
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<MessageStatus>,
}

async fn list_messages(State(s): State<AppState>, QueryParams(p): QueryParams<MessageListParams>) -> ApiResult<Json<Envelope<Paginated<ContactMessage>>>> {
    let mut query = Query::new();
    if let Some(status) = p.status { query = query.filter("status", status); }
    let page = Page::new(p.page.unwrap_or(1), p.per_page.unwrap_or(20));
    Ok(ok(s.store.page(query, page).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    pub status: MessageStatus,
}

async fn set_status(State(s): State<AppState>, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<StatusRequest>) -> ApiResult<Json<Envelope<ContactMessage>>> {
    let mut message: ContactMessage = s.store.fetch(id).await?;
    message.status = r.status;
    s.store.save(&message).await?;
    Ok(ok(message))
}
