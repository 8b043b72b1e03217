//! Contact form messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Collection, Document};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    New,
    Read,
    Replied,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    pub fn receive(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(), name: name.into(), email: email.into(), subject: None,
            message: message.into(), status: MessageStatus::New, created_at: Utc::now(),
        }
    }
}

impl Document for ContactMessage {
    const COLLECTION: Collection = Collection::ContactMessages;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}
