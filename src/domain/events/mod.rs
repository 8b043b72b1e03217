//! Domain events
//!
//! Raised by the API layer after a write succeeds and handed to the
//! [`EventBus`](crate::events::EventBus).

use crate::domain::aggregates::OrderStatus;
use crate::domain::value_objects::Money;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Catalog(CatalogEvent),
    Engagement(EngagementEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, order_number: String, total: Money },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
    CouponRedeemed { code: String, order_id: Uuid, discount: Money },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CatalogEvent {
    StockDepleted { product_id: Uuid, sku: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngagementEvent {
    ReviewSubmitted { review_id: Uuid, product_id: Uuid, rating: u8 },
    QuestionAsked { question_id: Uuid, product_id: Uuid },
    CommentSubmitted { comment_id: Uuid, post_id: Uuid },
    ContactReceived { message_id: Uuid, email: String },
}

impl DomainEvent {
    /// NATS subject suffix, e.g. `order.placed`.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Placed { .. }) => "order.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "order.status_changed",
            Self::Order(OrderEvent::CouponRedeemed { .. }) => "coupon.redeemed",
            Self::Catalog(CatalogEvent::StockDepleted { .. }) => "product.stock_depleted",
            Self::Engagement(EngagementEvent::ReviewSubmitted { .. }) => "review.submitted",
            Self::Engagement(EngagementEvent::QuestionAsked { .. }) => "question.asked",
            Self::Engagement(EngagementEvent::CommentSubmitted { .. }) => "comment.submitted",
            Self::Engagement(EngagementEvent::ContactReceived { .. }) => "contact.received",
        }
    }
}
