//! Product reviews and product Q&A

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::catalog::find_product;
use super::extract::{Path, Query as QueryParams, ValidatedJson};
use super::{created, done, ok, Envelope};
use crate::domain::aggregates::{Question, RatingSummary, Review};
use crate::domain::events::{DomainEvent, EngagementEvent};
use crate::domain::value_objects::Rating;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{Page, Paginated, Query};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products/:key/reviews", get(list_reviews).post(submit_review))
        .route("/reviews/:id/helpful", post(mark_helpful))
        .route("/products/:key/questions", get(list_questions).post(ask_question))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(admin_list_reviews))
        .route("/reviews/:id", delete(delete_review))
        .route("/reviews/:id/approve", put(approve_review))
        .route("/questions", get(admin_list_questions))
        .route("/questions/:id", delete(delete_question))
        .route("/questions/:id/answer", put(answer_question))
}

#[derive(Debug, Default, Deserialize)]
pub struct ModerationParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub approved: Option<bool>,
    pub product_id: Option<Uuid>,
}

impl ModerationParams {
    fn page(&self) -> Page { Page::new(self.page.unwrap_or(1), self.per_page.unwrap_or(20)) }
}

#[derive(Debug, Serialize)]
pub struct ProductReviews {
    pub summary: RatingSummary,
    pub reviews: Paginated<Review>,
}

async fn list_reviews(State(s): State<AppState>, Path(key): Path<String>, QueryParams(p): QueryParams<ModerationParams>) -> ApiResult<Json<Envelope<ProductReviews>>> {
    let product = find_product(&s.store, &key).await?;
    let query = Query::new().filter("product_id", product.id).filter("approved", true);
    let all: Vec<Review> = s.store.find(&query).await?;
    Ok(ok(ProductReviews {
        summary: RatingSummary::from_reviews(&all),
        reviews: s.store.page(query, p.page()).await?,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(min = 1, max = 100))]
    pub author_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[validate(length(max = 150))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

async fn submit_review(State(s): State<AppState>, Path(key): Path<String>, ValidatedJson(r): ValidatedJson<ReviewRequest>) -> ApiResult<(StatusCode, Json<Envelope<Review>>)> {
    let product = find_product(&s.store, &key).await?;
    let mut review = Review::submit(product.id, r.author_name.trim(), r.email.trim().to_lowercase(), Rating::new(r.rating)?, r.body.trim());
    review.title = r.title;
    s.store.insert(&review).await?;
    s.events
        .publish(DomainEvent::Engagement(EngagementEvent::ReviewSubmitted {
            review_id: review.id,
            product_id: product.id,
            rating: review.rating.value(),
        }))
        .await;
    Ok(created(review))
}

async fn mark_helpful(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Envelope<Review>>> {
    let mut review: Review = s.store.fetch(id).await?;
    if !review.approved { return Err(ApiError::NotFound("review")); }
    review.mark_helpful();
    s.store.save(&review).await?;
    Ok(ok(review))
}

async fn admin_list_reviews(State(s): State<AppState>, QueryParams(p): QueryParams<ModerationParams>) -> ApiResult<Json<Envelope<Paginated<Review>>>> {
    let mut query = Query::new();
    if let Some(approved) = p.approved { query = query.filter("approved", approved); }
    if let Some(product) = p.product_id { query = query.filter("product_id", product); }
    Ok(ok(s.store.page(query, p.page()).await?))
}

async fn approve_review(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Envelope<Review>>> {
    let mut review: Review = s.store.fetch(id).await?;
    review.approved = true;
    s.store.save(&review).await?;
    Ok(ok(review))
}

async fn delete_review(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    if !s.store.delete::<Review>(id).await? { return Err(ApiError::NotFound("review")); }
    Ok(done("review deleted"))
}

async fn list_questions(State(s): State<AppState>, Path(key): Path<String>, QueryParams(p): QueryParams<ModerationParams>) -> ApiResult<Json<Envelope<Paginated<Question>>>> {
    let product = find_product(&s.store, &key).await?;
    let query = Query::new().filter("product_id", product.id).filter("published", true);
    Ok(ok(s.store.page(query, p.page()).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 100))]
    pub author_name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
}

async fn ask_question(State(s): State<AppState>, Path(key): Path<String>, ValidatedJson(r): ValidatedJson<QuestionRequest>) -> ApiResult<(StatusCode, Json<Envelope<Question>>)> {
    let product = find_product(&s.store, &key).await?;
    let mut question = Question::ask(product.id, r.author_name.trim(), r.question.trim());
    question.email = r.email.map(|e| e.trim().to_lowercase());
    s.store.insert(&question).await?;
    s.events
        .publish(DomainEvent::Engagement(EngagementEvent::QuestionAsked { question_id: question.id, product_id: product.id }))
        .await;
    Ok(created(question))
}

async fn admin_list_questions(State(s): State<AppState>, QueryParams(p): QueryParams<ModerationParams>) -> ApiResult<Json<Envelope<Paginated<Question>>>> {
    let mut query = Query::new();
    if let Some(published) = p.approved { query = query.filter("published", published); }
    if let Some(product) = p.product_id { query = query.filter("product_id", product); }
    Ok(ok(s.store.page(query, p.page()).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerRequest {
    #[validate(length(min = 1, max = 2000))]
    pub answer: String,
}

async fn answer_question(State(s): State<AppState>, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<AnswerRequest>) -> ApiResult<Json<Envelope<Question>>> {
    let mut question: Question = s.store.fetch(id).await?;
    question.answer(r.answer.trim());
    s.store.save(&question).await?;
    Ok(ok(question))
}

async fn delete_question(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    if !s.store.delete::<Question>(id).await? { return Err(ApiError::NotFound("question")); }
    Ok(done("question deleted"))
}
