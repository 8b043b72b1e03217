//! Product Q&A

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Collection, Document};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub product_id: Uuid,
    pub author_name: String,
    pub email: Option<String>,
    pub question: String,
    pub answer: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl Question {
    pub fn ask(product_id: Uuid, author_name: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(), product_id, author_name: author_name.into(), email: None,
            question: question.into(), answer: None, answered_at: None, published: false,
            created_at: Utc::now(),
        }
    }

    /// Answering publishes the question.
    pub fn answer(&mut self, answer: impl Into<String>) {
        self.answer = Some(answer.into());
        self.answered_at = Some(Utc::now());
        self.published = true;
    }
}

impl Document for Question {
    const COLLECTION: Collection = Collection::Questions;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}
