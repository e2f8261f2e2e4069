use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_stream::stream;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::instrument;

use crate::application::ports::{ConversationRepository, RepositoryError, Snapshots};
use crate::domain::{Conversation, ConversationId, Message, MessageId, UserId};

type SnapshotSender<T> = mpsc::UnboundedSender<Result<Vec<T>, RepositoryError>>;

#[derive(Default)]
struct Inner {
    conversations: HashMap<ConversationId, Conversation>,
    messages: HashMap<ConversationId, Vec<Message>>,
    conversation_watchers: Vec<(UserId, SnapshotSender<Conversation>)>,
    message_watchers: Vec<(ConversationId, SnapshotSender<Message>)>,
}

impl Inner {
    fn conversations_for(&self, user_id: UserId) -> Vec<Conversation> {
        let mut list: Vec<Conversation> = self
            .conversations
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }

    fn messages_for(&self, conversation_id: ConversationId) -> Vec<Message> {
        self.messages
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    fn notify_conversations(&mut self, user_id: UserId) {
        let snapshot = self.conversations_for(user_id);
        self.conversation_watchers.retain(|(watched, tx)| {
            if *watched != user_id {
                return !tx.is_closed();
            }
            tx.send(Ok(snapshot.clone())).is_ok()
        });
    }

    fn notify_messages(&mut self, conversation_id: ConversationId) {
        let snapshot = self.messages_for(conversation_id);
        self.message_watchers.retain(|(watched, tx)| {
            if *watched != conversation_id {
                return !tx.is_closed();
            }
            tx.send(Ok(snapshot.clone())).is_ok()
        });
    }

    fn conversation_mut(
        &mut self,
        id: ConversationId,
    ) -> Result<&mut Conversation, RepositoryError> {
        self.conversations
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("conversation {}", id)))
    }
}

/// Reference implementation of the repository port. State lives in
/// process memory; every subscriber gets an initial snapshot and a
/// fresh full snapshot after each change, matching the contract of the
/// remote store.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    inner: Mutex<Inner>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_flags(
        &self,
        id: ConversationId,
        apply: impl FnOnce(&mut Conversation),
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        let conversation = inner.conversation_mut(id)?;
        apply(conversation);
        conversation.updated_at = Utc::now();
        let user_id = conversation.user_id;
        inner.notify_conversations(user_id);
        Ok(())
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn subscribe_conversations(&self, user_id: UserId) -> Snapshots<Conversation> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let mut inner = self.lock();
            let snapshot = inner.conversations_for(user_id);
            let _ = tx.send(Ok(snapshot));
            inner.conversation_watchers.push((user_id, tx));
        }
        Box::pin(stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        })
    }

    async fn subscribe_messages(&self, conversation_id: ConversationId) -> Snapshots<Message> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let mut inner = self.lock();
            let snapshot = inner.messages_for(conversation_id);
            let _ = tx.send(Ok(snapshot));
            inner.message_watchers.push((conversation_id, tx));
        }
        Box::pin(stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        })
    }

    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id))]
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        inner.notify_conversations(conversation.user_id);
        Ok(())
    }

    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id))]
    async fn update_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        if !inner.conversations.contains_key(&conversation.id) {
            return Err(RepositoryError::NotFound(format!(
                "conversation {}",
                conversation.id
            )));
        }
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        inner.notify_conversations(conversation.user_id);
        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %id))]
    async fn delete_conversation(&self, id: ConversationId) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        let removed = inner
            .conversations
            .remove(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("conversation {}", id)))?;
        inner.messages.remove(&id);
        inner.notify_conversations(removed.user_id);
        inner.notify_messages(id);
        Ok(())
    }

    async fn pin_conversation(&self, id: ConversationId) -> Result<(), RepositoryError> {
        self.set_flags(id, |c| c.is_pinned = true)
    }

    async fn unpin_conversation(&self, id: ConversationId) -> Result<(), RepositoryError> {
        self.set_flags(id, |c| c.is_pinned = false)
    }

    async fn archive_conversation(&self, id: ConversationId) -> Result<(), RepositoryError> {
        self.set_flags(id, |c| c.is_archived = true)
    }

    async fn unarchive_conversation(&self, id: ConversationId) -> Result<(), RepositoryError> {
        self.set_flags(id, |c| c.is_archived = false)
    }

    async fn search_conversations(
        &self,
        user_id: UserId,
        query: &str,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let needle = query.to_lowercase();
        let inner = self.lock();
        Ok(inner
            .conversations_for(user_id)
            .into_iter()
            .filter(|c| {
                c.title.to_lowercase().contains(&needle)
                    || c.last_message
                        .as_deref()
                        .is_some_and(|m| m.to_lowercase().contains(&needle))
            })
            .collect())
    }

    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.lock().conversations.get(&id).cloned())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id, conversation_id = %message.conversation_id))]
    async fn add_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        if !inner.conversations.contains_key(&message.conversation_id) {
            return Err(RepositoryError::NotFound(format!(
                "conversation {}",
                message.conversation_id
            )));
        }
        inner
            .messages
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        inner.notify_messages(message.conversation_id);
        Ok(())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn update_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        let stored = inner
            .messages
            .get_mut(&message.conversation_id)
            .and_then(|list| list.iter_mut().find(|m| m.id == message.id))
            .ok_or_else(|| RepositoryError::NotFound(format!("message {}", message.id)))?;
        *stored = message.clone();
        inner.notify_messages(message.conversation_id);
        Ok(())
    }

    #[instrument(skip(self), fields(message_id = %id))]
    async fn delete_message(
        &self,
        conversation_id: ConversationId,
        id: MessageId,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        let list = inner
            .messages
            .get_mut(&conversation_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("conversation {}", conversation_id)))?;
        let before = list.len();
        list.retain(|m| m.id != id);
        if list.len() == before {
            return Err(RepositoryError::NotFound(format!("message {}", id)));
        }
        inner.notify_messages(conversation_id);
        Ok(())
    }
}
