use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Conversation, Message};

const ATTRIBUTION_FOOTER: &str = "--\nExported from Palaver";

/// Deterministic plain-text rendering of a conversation: a title/model
/// header, one speaker-prefixed block per message in order, and a fixed
/// attribution footer.
pub fn shareable_text(conversation: &Conversation, messages: &[Message]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} ({})\n\n",
        conversation.title, conversation.model_id
    ));
    for message in messages {
        out.push_str(message.role.speaker_label());
        out.push('\n');
        out.push_str(&message.content);
        out.push_str("\n\n");
    }
    out.push_str(ATTRIBUTION_FOOTER);
    out
}

/// Serializable snapshot of a conversation and its messages.
/// `exported_at` is stamped at projection time, not stored.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedConversation {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
    pub message_count: usize,
    pub exported_at: DateTime<Utc>,
}

impl ExportedConversation {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn exportable_data(conversation: &Conversation, messages: &[Message]) -> ExportedConversation {
    ExportedConversation {
        conversation: conversation.clone(),
        messages: messages.to_vec(),
        message_count: messages.len(),
        exported_at: Utc::now(),
    }
}
