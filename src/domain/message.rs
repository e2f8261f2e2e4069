use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, MessageId, MessageRole, MessageStatus};

/// One turn in a conversation. `error_message` is set if and only if
/// `status` is `Failed`; the mutators below are the only place that
/// invariant is maintained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub is_edited: bool,
    pub token_count: Option<u32>,
    pub error_message: Option<String>,
}

impl Message {
    /// A user-authored turn, optimistically local until the repository
    /// acknowledges the write.
    pub fn user(conversation_id: ConversationId, content: String) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: MessageRole::User,
            content,
            status: MessageStatus::Sending,
            created_at: Utc::now(),
            is_edited: false,
            token_count: None,
            error_message: None,
        }
    }

    /// The assistant turn paired with a send, empty until the provider
    /// returns.
    pub fn assistant(conversation_id: ConversationId) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: MessageRole::Assistant,
            content: String::new(),
            status: MessageStatus::Generating,
            created_at: Utc::now(),
            is_edited: false,
            token_count: None,
            error_message: None,
        }
    }

    pub fn system(conversation_id: ConversationId, content: String) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: MessageRole::System,
            content,
            status: MessageStatus::Completed,
            created_at: Utc::now(),
            is_edited: false,
            token_count: None,
            error_message: None,
        }
    }

    pub fn mark_sent(&mut self) {
        self.status = MessageStatus::Sent;
        self.error_message = None;
    }

    pub fn complete(&mut self, content: String) {
        self.content = content;
        self.status = MessageStatus::Completed;
        self.error_message = None;
    }

    pub fn fail(&mut self, error: String) {
        self.status = MessageStatus::Failed;
        self.error_message = Some(error);
    }

    pub fn edit(&mut self, content: String) {
        self.content = content;
        self.is_edited = true;
    }
}
