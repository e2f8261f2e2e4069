mod chat_service;
mod conversation_list_service;
mod transcript;

pub use chat_service::{ChatError, ChatService, ChatState};
pub use conversation_list_service::{
    ConversationListError, ConversationListService, ConversationListState,
};
pub use transcript::{exportable_data, shareable_text, ExportedConversation};
