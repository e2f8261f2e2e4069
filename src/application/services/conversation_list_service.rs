use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::ports::{ConversationRepository, RepositoryError};
use crate::domain::{Conversation, ConversationId, UserId};

/// Snapshot of the conversation list. The repository stream is the
/// single source of truth for `conversations`; the derived views below
/// are recomputed on every read, never cached.
#[derive(Debug, Clone)]
pub struct ConversationListState {
    pub conversations: Vec<Conversation>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl Default for ConversationListState {
    fn default() -> Self {
        Self {
            conversations: Vec::new(),
            is_loading: true,
            error_message: None,
        }
    }
}

impl ConversationListState {
    /// Pinned and not archived. An archived conversation never shows in
    /// the pinned view even while its pin flag is set.
    pub fn pinned(&self) -> Vec<Conversation> {
        self.conversations
            .iter()
            .filter(|c| c.is_pinned && !c.is_archived)
            .cloned()
            .collect()
    }

    pub fn active(&self) -> Vec<Conversation> {
        self.conversations
            .iter()
            .filter(|c| !c.is_pinned && !c.is_archived)
            .cloned()
            .collect()
    }

    pub fn archived(&self) -> Vec<Conversation> {
        self.conversations
            .iter()
            .filter(|c| c.is_archived)
            .cloned()
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversationListError {
    #[error("no user signed in")]
    NoUser,
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}

/// Mirrors the set of conversations owned by one user and exposes the
/// list-level operations. Without a signed-in user the service stays in
/// a loading state and never touches the repository.
pub struct ConversationListService<R>
where
    R: ConversationRepository,
{
    repository: Arc<R>,
    user_id: Option<UserId>,
    state: Arc<watch::Sender<ConversationListState>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<R> ConversationListService<R>
where
    R: ConversationRepository + 'static,
{
    pub async fn new(repository: Arc<R>, user_id: Option<UserId>) -> Self {
        let (state, _) = watch::channel(ConversationListState::default());
        let state = Arc::new(state);

        let pump = match user_id {
            Some(user_id) => {
                let mut snapshots = repository.subscribe_conversations(user_id).await;
                let state = Arc::clone(&state);
                Some(tokio::spawn(async move {
                    while let Some(event) = snapshots.next().await {
                        state.send_modify(|s| apply_list_event(s, event));
                    }
                }))
            }
            None => None,
        };

        Self {
            repository,
            user_id,
            state,
            pump: Mutex::new(pump),
        }
    }

    pub fn state(&self) -> ConversationListState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationListState> {
        self.state.subscribe()
    }

    pub fn pinned_conversations(&self) -> Vec<Conversation> {
        self.state.borrow().pinned()
    }

    pub fn active_conversations(&self) -> Vec<Conversation> {
        self.state.borrow().active()
    }

    pub fn archived_conversations(&self) -> Vec<Conversation> {
        self.state.borrow().archived()
    }

    /// Create a conversation owned by the signed-in user. The list
    /// itself is updated by the subscription stream, not mutated here.
    pub async fn create_conversation(
        &self,
        title: &str,
        model_id: &str,
        provider: &str,
    ) -> Result<Conversation, ConversationListError> {
        let user_id = self.user_id.ok_or(ConversationListError::NoUser)?;
        let conversation = Conversation::new(
            user_id,
            title.to_string(),
            model_id.to_string(),
            provider.to_string(),
        );
        self.repository.create_conversation(&conversation).await?;
        Ok(conversation)
    }

    /// Best-effort title/preview search. Returns an empty list when no
    /// user is signed in or when the repository fails.
    pub async fn search_conversations(&self, query: &str) -> Vec<Conversation> {
        let Some(user_id) = self.user_id else {
            return Vec::new();
        };
        match self.repository.search_conversations(user_id, query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, "conversation search failed");
                Vec::new()
            }
        }
    }

    /// Read-modify-write rename; never writes a partial record.
    pub async fn update_conversation_title(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<(), ConversationListError> {
        let mut conversation = self
            .repository
            .get_conversation(id)
            .await?
            .ok_or(ConversationListError::NotFound(id))?;
        conversation.set_title(title.to_string());
        self.repository.update_conversation(&conversation).await?;
        Ok(())
    }

    pub async fn pin_conversation(&self, id: ConversationId) -> Result<(), ConversationListError> {
        self.repository.pin_conversation(id).await?;
        Ok(())
    }

    pub async fn unpin_conversation(
        &self,
        id: ConversationId,
    ) -> Result<(), ConversationListError> {
        self.repository.unpin_conversation(id).await?;
        Ok(())
    }

    pub async fn archive_conversation(
        &self,
        id: ConversationId,
    ) -> Result<(), ConversationListError> {
        self.repository.archive_conversation(id).await?;
        Ok(())
    }

    pub async fn unarchive_conversation(
        &self,
        id: ConversationId,
    ) -> Result<(), ConversationListError> {
        self.repository.unarchive_conversation(id).await?;
        Ok(())
    }

    pub async fn delete_conversation(
        &self,
        id: ConversationId,
    ) -> Result<(), ConversationListError> {
        self.repository.delete_conversation(id).await?;
        Ok(())
    }
}

impl<R> Drop for ConversationListService<R>
where
    R: ConversationRepository,
{
    fn drop(&mut self) {
        if let Some(handle) = self.pump.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

/// Fold one conversation-stream event into the state. A snapshot fully
/// replaces the list and clears any error; an error keeps the previous
/// snapshot visible.
fn apply_list_event(
    state: &mut ConversationListState,
    event: Result<Vec<Conversation>, RepositoryError>,
) {
    match event {
        Ok(snapshot) => {
            state.conversations = snapshot;
            state.error_message = None;
            state.is_loading = false;
        }
        Err(e) => {
            state.error_message = Some(e.to_string());
            state.is_loading = false;
        }
    }
}
