//! Blog posts and their reader comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Slug;
use crate::store::{Collection, Document, UniqueKey};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: Slug,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub author: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: u64,
    pub like_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn create(title: impl Into<String>, slug: Slug, content: impl Into<String>, author: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(), title: title.into(), slug, excerpt: None, content: content.into(),
            cover_image: None, author: author.into(), tags: vec![], status: PostStatus::Draft,
            published_at: None, view_count: 0, like_count: 0, created_at: now, updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool { self.status == PostStatus::Published }

    /// Publishing keeps the first publication date across unpublish/publish cycles.
    pub fn publish(&mut self) {
        self.status = PostStatus::Published;
        self.published_at.get_or_insert_with(Utc::now);
        self.touch();
    }

    pub fn unpublish(&mut self) { self.status = PostStatus::Draft; self.touch(); }

    pub fn record_view(&mut self) { self.view_count = self.view_count.saturating_add(1); }
    pub fn like(&mut self) { self.like_count = self.like_count.saturating_add(1); }

    /// Rough reading time at 200 words per minute, at least one minute.
    pub fn reading_minutes(&self) -> usize { self.content.split_whitespace().count().div_ceil(200).max(1) }

    pub fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl Document for BlogPost {
    const COLLECTION: Collection = Collection::BlogPosts;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
    fn unique_keys(&self) -> Vec<UniqueKey> { vec![UniqueKey::new("slug", self.slug.as_str())] }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_name: String,
    pub email: String,
    pub body: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// New comments wait for moderation.
    pub fn submit(post_id: Uuid, author_name: impl Into<String>, email: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(), post_id, author_name: author_name.into(), email: email.into(),
            body: body.into(), approved: false, created_at: Utc::now(),
        }
    }
}

impl Document for Comment {
    const COLLECTION: Collection = Collection::Comments;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_keeps_first_date() {
        let mut post = BlogPost::create("Atelier Notes", Slug::new("atelier-notes").unwrap(), "word ".repeat(450), "Editor");
        assert!(!post.is_published());
        post.publish();
        let first = post.published_at;
        post.unpublish();
        post.publish();
        assert_eq!(post.published_at, first);
        assert_eq!(post.reading_minutes(), 3);
    }
}
