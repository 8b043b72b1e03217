//! Blog posts and comments

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

use super::extract::{Path, Query as QueryParams, ValidatedJson};
use super::{created, done, ok, Envelope};
use crate::domain::aggregates::{BlogPost, Comment, PostStatus};
use crate::domain::events::{DomainEvent, EngagementEvent};
use crate::domain::value_objects::Slug;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{Page, Paginated, Query, Store};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_posts))
        .route("/blogs/:slug", get(get_post))
        .route("/blogs/:slug/like", post(like_post))
        .route("/blogs/:slug/comments", get(list_comments).post(submit_comment))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(admin_list_posts).post(create_post))
        .route("/blogs/:id", get(admin_get_post).put(update_post).delete(delete_post))
        .route("/comments", get(admin_list_comments))
        .route("/comments/:id", delete(delete_comment))
        .route("/comments/:id/approve", put(approve_comment))
}

#[derive(Debug, Default, Deserialize)]
pub struct PostListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub status: Option<PostStatus>,
}

impl PostListParams {
    fn page(&self) -> Page { Page::new(self.page.unwrap_or(1), self.per_page.unwrap_or(10)) }

    fn query(&self) -> Query {
        let mut q = Query::new();
        if let Some(tag) = &self.tag { q = q.includes("tags", tag.to_lowercase()); }
        if let Some(search) = &self.search { q = q.search("title", search.clone()); }
        q
    }
}

async fn published_post(store: &Store, slug: &str) -> ApiResult<BlogPost> {
    store
        .find_one::<BlogPost>(Query::new().filter("slug", slug).filter("status", PostStatus::Published))
        .await?
        .ok_or(ApiError::NotFound("blog post"))
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: BlogPost,
    pub reading_minutes: usize,
    pub comment_count: u64,
}

async fn list_posts(State(s): State<AppState>, QueryParams(p): QueryParams<PostListParams>) -> ApiResult<Json<Envelope<Paginated<BlogPost>>>> {
    let query = p.query().filter("status", PostStatus::Published);
    Ok(ok(s.store.page(query, p.page()).await?))
}

async fn get_post(State(s): State<AppState>, Path(slug): Path<String>) -> ApiResult<Json<Envelope<PostDetail>>> {
    let mut post = published_post(&s.store, &slug).await?;
    post.record_view();
    s.store.save(&post).await?;
    let comment_count = s.store.count::<Comment>(&Query::new().filter("post_id", post.id).filter("approved", true)).await?;
    Ok(ok(PostDetail { reading_minutes: post.reading_minutes(), comment_count, post }))
}

async fn like_post(State(s): State<AppState>, Path(slug): Path<String>) -> ApiResult<Json<Envelope<Value>>> {
    let mut post = published_post(&s.store, &slug).await?;
    post.like();
    s.store.save(&post).await?;
    Ok(ok(serde_json::json!({ "like_count": post.like_count })))
}

async fn list_comments(State(s): State<AppState>, Path(slug): Path<String>) -> ApiResult<Json<Envelope<Vec<Comment>>>> {
    let post = published_post(&s.store, &slug).await?;
    let query = Query::new().filter("post_id", post.id).filter("approved", true).oldest_first();
    Ok(ok(s.store.find(&query).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 100))]
    pub author_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

async fn submit_comment(State(s): State<AppState>, Path(slug): Path<String>, ValidatedJson(r): ValidatedJson<CommentRequest>) -> ApiResult<(StatusCode, Json<Envelope<Comment>>)> {
    let post = published_post(&s.store, &slug).await?;
    let comment = Comment::submit(post.id, r.author_name.trim(), r.email.trim().to_lowercase(), r.body.trim());
    s.store.insert(&comment).await?;
    s.events
        .publish(DomainEvent::Engagement(EngagementEvent::CommentSubmitted { comment_id: comment.id, post_id: post.id }))
        .await;
    Ok(created(comment))
}

async fn admin_list_posts(State(s): State<AppState>, QueryParams(p): QueryParams<PostListParams>) -> ApiResult<Json<Envelope<Paginated<BlogPost>>>> {
    let mut query = p.query();
    if let Some(status) = p.status { query = query.filter("status", status); }
    Ok(ok(s.store.page(query, p.page()).await?))
}

async fn admin_get_post(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Envelope<BlogPost>>> {
    Ok(ok(s.store.get(id).await?.ok_or(ApiError::NotFound("blog post"))?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1, max = 100_000))]
    pub content: String,
    pub cover_image: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub author: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
}

impl PostRequest {
    fn apply(self, post: &mut BlogPost) -> ApiResult<()> {
        post.slug = Slug::new(self.slug.as_deref().unwrap_or(&self.title))?;
        post.title = self.title.trim().to_string();
        post.excerpt = self.excerpt;
        post.content = self.content;
        post.cover_image = self.cover_image;
        post.author = self.author.trim().to_string();
        post.tags = self.tags.into_iter().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect();
        match self.status {
            PostStatus::Published => post.publish(),
            PostStatus::Draft => post.unpublish(),
        }
        Ok(())
    }
}

async fn create_post(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<PostRequest>) -> ApiResult<(StatusCode, Json<Envelope<BlogPost>>)> {
    let mut post = BlogPost::create(r.title.clone(), Slug::new(&r.title)?, r.content.clone(), r.author.clone());
    r.apply(&mut post)?;
    s.store.insert(&post).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "blog post created");
    Ok(created(post))
}

async fn update_post(State(s): State<AppState>, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<PostRequest>) -> ApiResult<Json<Envelope<BlogPost>>> {
    let mut post: BlogPost = s.store.fetch(id).await?;
    r.apply(&mut post)?;
    s.store.save(&post).await?;
    Ok(ok(post))
}

/// Deleting a post takes its comments with it.
async fn delete_post(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    if !s.store.delete::<BlogPost>(id).await? { return Err(ApiError::NotFound("blog post")); }
    let comments: Vec<Comment> = s.store.find(&Query::new().filter("post_id", id)).await?;
    for comment in &comments {
        s.store.delete::<Comment>(comment.id).await?;
    }
    tracing::info!(post_id = %id, comments = comments.len(), "blog post deleted");
    Ok(done("blog post deleted"))
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub approved: Option<bool>,
    pub post_id: Option<Uuid>,
}

async fn admin_list_comments(State(s): State<AppState>, QueryParams(p): QueryParams<CommentListParams>) -> ApiResult<Json<Envelope<Paginated<Comment>>>> {
    let mut query = Query::new();
    if let Some(approved) = p.approved { query = query.filter("approved", approved); }
    if let Some(post) = p.post_id { query = query.filter("post_id", post); }
    let page = Page::new(p.page.unwrap_or(1), p.per_page.unwrap_or(20));
    Ok(ok(s.store.page(query, page).await?))
}

async fn approve_comment(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Envelope<Comment>>> {
    let mut comment: Comment = s.store.fetch(id).await?;
    comment.approved = true;
    s.store.save(&comment).await?;
    Ok(ok(comment))
}

async fn delete_comment(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    if !s.store.delete::<Comment>(id).await? { return Err(ApiError::NotFound("comment")); }
    Ok(done("comment deleted"))
}
