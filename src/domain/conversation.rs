use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, UserId};

/// Conversation metadata. `last_message`, `last_message_at` and
/// `message_count` are denormalized preview fields kept current by the
/// chat engine after each completed exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    pub title: String,
    pub model_id: String,
    pub provider: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub message_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(user_id: UserId, title: String, model_id: String, provider: String) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            user_id,
            title,
            model_id,
            provider,
            is_pinned: false,
            is_archived: false,
            last_message: None,
            last_message_at: None,
            message_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the preview fields after a completed user/assistant
    /// exchange.
    pub fn record_exchange(&mut self, preview: &str, at: DateTime<Utc>, new_messages: u32) {
        self.last_message = Some(preview.to_string());
        self.last_message_at = Some(at);
        self.message_count += new_messages;
        self.updated_at = at;
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.updated_at = Utc::now();
    }
}
