use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::domain::{Conversation, ConversationId, Message, MessageId, UserId};

use super::RepositoryError;

/// Long-lived subscription stream. Every item is a full snapshot of the
/// subscribed collection, not a delta; the store may emit an error
/// in-band at any time and keep the subscription alive.
pub type Snapshots<T> = Pin<Box<dyn Stream<Item = Result<Vec<T>, RepositoryError>> + Send>>;

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn subscribe_conversations(&self, user_id: UserId) -> Snapshots<Conversation>;

    async fn subscribe_messages(&self, conversation_id: ConversationId) -> Snapshots<Message>;

    async fn create_conversation(&self, conversation: &Conversation)
        -> Result<(), RepositoryError>;

    async fn update_conversation(&self, conversation: &Conversation)
        -> Result<(), RepositoryError>;

    async fn delete_conversation(&self, id: ConversationId) -> Result<(), RepositoryError>;

    async fn pin_conversation(&self, id: ConversationId) -> Result<(), RepositoryError>;

    async fn unpin_conversation(&self, id: ConversationId) -> Result<(), RepositoryError>;

    async fn archive_conversation(&self, id: ConversationId) -> Result<(), RepositoryError>;

    async fn unarchive_conversation(&self, id: ConversationId) -> Result<(), RepositoryError>;

    async fn search_conversations(
        &self,
        user_id: UserId,
        query: &str,
    ) -> Result<Vec<Conversation>, RepositoryError>;

    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    async fn add_message(&self, message: &Message) -> Result<(), RepositoryError>;

    async fn update_message(&self, message: &Message) -> Result<(), RepositoryError>;

    async fn delete_message(
        &self,
        conversation_id: ConversationId,
        id: MessageId,
    ) -> Result<(), RepositoryError>;
}
