use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;

use palaver::application::ports::{
    CompletionClient, CompletionError, CompletionRequest, ConversationRepository, RepositoryError,
    Snapshots,
};
use palaver::domain::{Conversation, ConversationId, Message, MessageId, UserId};

pub fn test_conversation(user_id: UserId) -> Conversation {
    Conversation::new(
        user_id,
        "Test Chat".to_string(),
        "gpt-4".to_string(),
        "openai".to_string(),
    )
}

/// Poll until the condition holds or a deadline passes.
pub async fn wait_until(mut predicate: impl FnMut() -> bool) {
    for _ in 0..400 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// Configurable repository stub: can serve one conversation, seed or
/// script subscription snapshots, reject all writes, and record which
/// operations were invoked.
#[derive(Default)]
pub struct StubRepository {
    pub conversation: Option<Conversation>,
    pub seed_messages: Vec<Message>,
    pub conversation_events: Mutex<Vec<Result<Vec<Conversation>, RepositoryError>>>,
    pub message_events: Mutex<Vec<Result<Vec<Message>, RepositoryError>>>,
    pub fail_writes: bool,
    pub search_called: AtomicBool,
    pub update_called: AtomicBool,
}

impl StubRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = Some(conversation);
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.seed_messages = messages;
        self
    }

    pub fn with_conversation_events(
        self,
        events: Vec<Result<Vec<Conversation>, RepositoryError>>,
    ) -> Self {
        *self.conversation_events.lock().unwrap() = events;
        self
    }

    pub fn with_message_events(self, events: Vec<Result<Vec<Message>, RepositoryError>>) -> Self {
        *self.message_events.lock().unwrap() = events;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    fn write_result(&self) -> Result<(), RepositoryError> {
        if self.fail_writes {
            Err(RepositoryError::Unknown("write rejected".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConversationRepository for StubRepository {
    async fn subscribe_conversations(&self, _user_id: UserId) -> Snapshots<Conversation> {
        let events = std::mem::take(&mut *self.conversation_events.lock().unwrap());
        if events.is_empty() {
            Box::pin(stream::iter(vec![Ok(Vec::new())]))
        } else {
            Box::pin(stream::iter(events))
        }
    }

    async fn subscribe_messages(&self, _conversation_id: ConversationId) -> Snapshots<Message> {
        let events = std::mem::take(&mut *self.message_events.lock().unwrap());
        if events.is_empty() {
            Box::pin(stream::iter(vec![Ok(self.seed_messages.clone())]))
        } else {
            Box::pin(stream::iter(events))
        }
    }

    async fn create_conversation(
        &self,
        _conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        self.write_result()
    }

    async fn update_conversation(
        &self,
        _conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        self.update_called.store(true, Ordering::SeqCst);
        self.write_result()
    }

    async fn delete_conversation(&self, _id: ConversationId) -> Result<(), RepositoryError> {
        self.write_result()
    }

    async fn pin_conversation(&self, _id: ConversationId) -> Result<(), RepositoryError> {
        self.write_result()
    }

    async fn unpin_conversation(&self, _id: ConversationId) -> Result<(), RepositoryError> {
        self.write_result()
    }

    async fn archive_conversation(&self, _id: ConversationId) -> Result<(), RepositoryError> {
        self.write_result()
    }

    async fn unarchive_conversation(&self, _id: ConversationId) -> Result<(), RepositoryError> {
        self.write_result()
    }

    async fn search_conversations(
        &self,
        _user_id: UserId,
        _query: &str,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        self.search_called.store(true, Ordering::SeqCst);
        if self.fail_writes {
            Err(RepositoryError::TransientNetwork("offline".to_string()))
        } else {
            Ok(Vec::new())
        }
    }

    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.conversation.as_ref().filter(|c| c.id == id).cloned())
    }

    async fn add_message(&self, _message: &Message) -> Result<(), RepositoryError> {
        self.write_result()
    }

    async fn update_message(&self, _message: &Message) -> Result<(), RepositoryError> {
        self.write_result()
    }

    async fn delete_message(
        &self,
        _conversation_id: ConversationId,
        _id: MessageId,
    ) -> Result<(), RepositoryError> {
        self.write_result()
    }
}

/// Completion client whose future never resolves.
pub struct StallingCompletionClient;

#[async_trait]
impl CompletionClient for StallingCompletionClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        futures::future::pending().await
    }
}

/// Completion client that replies after a fixed delay.
pub struct DelayedCompletionClient {
    pub delay: Duration,
    pub reply: String,
}

#[async_trait]
impl CompletionClient for DelayedCompletionClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}
