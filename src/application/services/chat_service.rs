use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::ports::{
    ChatTurn, CompletionClient, CompletionError, CompletionRequest, ConversationRepository,
    RepositoryError,
};
use crate::config::ChatSettings;
use crate::domain::{
    reconcile, Conversation, ConversationId, Message, MessageId, MessageRole, MessageStatus,
    SyncState, Tracked,
};

use super::transcript::{self, ExportedConversation};

/// Snapshot of one open conversation. Published through a watch channel
/// so readers always see a consistent state; the repository's message
/// stream is folded in by a background pump.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub conversation: Option<Conversation>,
    pub messages: Vec<Tracked<Message>>,
    pub is_loading: bool,
    pub is_sending: bool,
    pub error_message: Option<String>,
}

impl ChatState {
    pub fn messages(&self) -> Vec<Message> {
        self.messages.iter().map(|t| t.value.clone()).collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("no conversation loaded")]
    NotLoaded,
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),
    #[error("only user messages can be edited")]
    NotEditable,
    #[error("only assistant messages can be regenerated")]
    NotRegenerable,
    #[error("a send is already in progress")]
    SendInProgress,
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("completion: {0}")]
    Completion(CompletionError),
}

/// Drives one open conversation: loads it, mirrors the repository's
/// message stream, and runs the send/receive protocol against the
/// completion provider. One instance per open conversation; all durable
/// state lives behind the repository port.
pub struct ChatService<R, C>
where
    R: ConversationRepository,
    C: CompletionClient,
{
    repository: Arc<R>,
    completion: Arc<C>,
    settings: ChatSettings,
    state: Arc<watch::Sender<ChatState>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<R, C> ChatService<R, C>
where
    R: ConversationRepository + 'static,
    C: CompletionClient + 'static,
{
    pub fn new(repository: Arc<R>, completion: Arc<C>, settings: ChatSettings) -> Self {
        let (state, _) = watch::channel(ChatState::default());
        Self {
            repository,
            completion,
            settings,
            state: Arc::new(state),
            pump: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ChatState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    /// Fetch the conversation and start mirroring its message stream.
    /// Replaces any previously loaded conversation.
    pub async fn load(&self, conversation_id: ConversationId) -> Result<(), ChatError> {
        let conversation = self
            .repository
            .get_conversation(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound(conversation_id))?;

        if let Some(previous) = self.take_pump() {
            previous.abort();
        }

        self.state.send_replace(ChatState {
            conversation: Some(conversation),
            is_loading: true,
            ..ChatState::default()
        });

        let mut snapshots = self.repository.subscribe_messages(conversation_id).await;
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            while let Some(event) = snapshots.next().await {
                state.send_modify(|s| apply_message_event(s, event));
            }
        });
        self.store_pump(handle);
        Ok(())
    }

    /// Send a user message and obtain the paired assistant reply.
    ///
    /// The user message is appended optimistically, persisted, and only
    /// then is the assistant turn started; a repository failure on the
    /// user message stops the operation before any provider call. A
    /// provider failure leaves the user message intact and surfaces the
    /// provider's own text on the failed assistant message. The work
    /// runs on a spawned task, so a caller that stops awaiting does not
    /// cancel an exchange already under way.
    pub async fn send_message(&self, content: &str) -> Result<(), ChatError> {
        let conversation = self
            .state
            .borrow()
            .conversation
            .clone()
            .ok_or(ChatError::NotLoaded)?;
        self.begin_send()?;

        let repository = Arc::clone(&self.repository);
        let completion = Arc::clone(&self.completion);
        let settings = self.settings.clone();
        let state = Arc::clone(&self.state);
        let content = content.to_string();
        let task = tokio::spawn(async move {
            let result = send_flow(
                repository,
                completion,
                settings,
                Arc::clone(&state),
                conversation,
                content,
            )
            .await;
            state.send_modify(|s| s.is_sending = false);
            result
        });
        await_send_task(task).await
    }

    /// Create a fresh assistant reply for an existing assistant message.
    /// The original message keeps its terminal state; the new reply is
    /// generated from the history with the original excluded.
    pub async fn regenerate(&self, id: MessageId) -> Result<(), ChatError> {
        let conversation = self
            .state
            .borrow()
            .conversation
            .clone()
            .ok_or(ChatError::NotLoaded)?;
        {
            let snapshot = self.state.borrow();
            let entry = snapshot
                .messages
                .iter()
                .find(|t| t.value.id == id)
                .ok_or(ChatError::MessageNotFound(id))?;
            if entry.value.role != MessageRole::Assistant {
                return Err(ChatError::NotRegenerable);
            }
        }
        self.begin_send()?;

        let repository = Arc::clone(&self.repository);
        let completion = Arc::clone(&self.completion);
        let settings = self.settings.clone();
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let result = generation_flow(
                repository,
                completion,
                settings,
                Arc::clone(&state),
                conversation,
                vec![id],
                1,
            )
            .await;
            state.send_modify(|s| s.is_sending = false);
            result
        });
        await_send_task(task).await
    }

    /// Rewrite a user message's content. The local edit is applied
    /// before the repository write and kept even if that write fails.
    pub async fn edit_message(&self, id: MessageId, new_content: &str) -> Result<(), ChatError> {
        {
            let snapshot = self.state.borrow();
            if snapshot.conversation.is_none() {
                return Err(ChatError::NotLoaded);
            }
            let entry = snapshot
                .messages
                .iter()
                .find(|t| t.value.id == id)
                .ok_or(ChatError::MessageNotFound(id))?;
            if entry.value.role != MessageRole::User {
                return Err(ChatError::NotEditable);
            }
        }

        let mut edited = None;
        self.state.send_modify(|s| {
            if let Some(entry) = s.messages.iter_mut().find(|t| t.value.id == id) {
                entry.value.edit(new_content.to_string());
                entry.sync = SyncState::Pending;
                edited = Some(entry.value.clone());
            }
        });
        let message = edited.ok_or(ChatError::MessageNotFound(id))?;

        match self.repository.update_message(&message).await {
            Ok(()) => {
                self.set_sync(id, SyncState::Confirmed);
                Ok(())
            }
            Err(e) => {
                self.set_sync(id, SyncState::Failed);
                Err(e.into())
            }
        }
    }

    pub async fn delete_message(&self, id: MessageId) -> Result<(), ChatError> {
        let conversation_id = self
            .state
            .borrow()
            .conversation
            .as_ref()
            .map(|c| c.id)
            .ok_or(ChatError::NotLoaded)?;
        let exists = self.state.borrow().messages.iter().any(|t| t.value.id == id);
        if !exists {
            return Err(ChatError::MessageNotFound(id));
        }

        self.state
            .send_modify(|s| s.messages.retain(|t| t.value.id != id));
        self.repository.delete_message(conversation_id, id).await?;
        Ok(())
    }

    /// Delete every message in the loaded conversation, one repository
    /// call per message. The first failure aborts the remainder; the
    /// conversation record itself is untouched.
    pub async fn clear_history(&self) -> Result<(), ChatError> {
        let conversation_id = self
            .state
            .borrow()
            .conversation
            .as_ref()
            .map(|c| c.id)
            .ok_or(ChatError::NotLoaded)?;
        let ids: Vec<MessageId> = self
            .state
            .borrow()
            .messages
            .iter()
            .map(|t| t.value.id)
            .collect();

        for id in ids {
            self.repository.delete_message(conversation_id, id).await?;
            self.state
                .send_modify(|s| s.messages.retain(|t| t.value.id != id));
        }
        Ok(())
    }

    /// Plain-text transcript of the loaded conversation; empty when
    /// nothing is loaded.
    pub fn shareable_text(&self) -> String {
        let snapshot = self.state.borrow();
        match &snapshot.conversation {
            Some(conversation) => transcript::shareable_text(conversation, &snapshot.messages()),
            None => String::new(),
        }
    }

    pub fn exportable_data(&self) -> Result<ExportedConversation, ChatError> {
        let snapshot = self.state.borrow();
        let conversation = snapshot.conversation.as_ref().ok_or(ChatError::NotLoaded)?;
        Ok(transcript::exportable_data(
            conversation,
            &snapshot.messages(),
        ))
    }

    fn begin_send(&self) -> Result<(), ChatError> {
        let mut rejected = false;
        self.state.send_modify(|s| {
            if s.is_sending {
                rejected = true;
            } else {
                s.is_sending = true;
            }
        });
        if rejected {
            Err(ChatError::SendInProgress)
        } else {
            Ok(())
        }
    }

    fn set_sync(&self, id: MessageId, sync: SyncState) {
        self.state.send_modify(|s| {
            if let Some(entry) = s.messages.iter_mut().find(|t| t.value.id == id) {
                entry.sync = sync;
            }
        });
    }

    fn take_pump(&self) -> Option<JoinHandle<()>> {
        self.pump.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    fn store_pump(&self, handle: JoinHandle<()>) {
        *self.pump.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }
}

impl<R, C> Drop for ChatService<R, C>
where
    R: ConversationRepository,
    C: CompletionClient,
{
    fn drop(&mut self) {
        if let Some(handle) = self.pump.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

/// Fold one message-stream event into the state. Snapshots replace the
/// confirmed set but keep unconfirmed local entries; an in-band error
/// is recorded without dropping data.
fn apply_message_event(state: &mut ChatState, event: Result<Vec<Message>, RepositoryError>) {
    match event {
        Ok(snapshot) => {
            state.messages = reconcile(&state.messages, snapshot);
            state.error_message = None;
            state.is_loading = false;
        }
        Err(e) => {
            state.error_message = Some(e.to_string());
            state.is_loading = false;
        }
    }
}

async fn await_send_task(task: JoinHandle<Result<(), ChatError>>) -> Result<(), ChatError> {
    match task.await {
        Ok(result) => result,
        // send tasks are never aborted, so a join failure is a panic
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}

async fn send_flow<R, C>(
    repository: Arc<R>,
    completion: Arc<C>,
    settings: ChatSettings,
    state: Arc<watch::Sender<ChatState>>,
    conversation: Conversation,
    content: String,
) -> Result<(), ChatError>
where
    R: ConversationRepository,
    C: CompletionClient,
{
    let mut user_message = Message::user(conversation.id, content);
    let user_message_id = user_message.id;
    state.send_modify(|s| s.messages.push(Tracked::pending(user_message.clone())));

    // The write carries the acknowledged form; the local copy stays
    // `sending` until the repository accepts it.
    let mut acknowledged = user_message.clone();
    acknowledged.mark_sent();
    if let Err(e) = repository.add_message(&acknowledged).await {
        let reason = e.to_string();
        state.send_modify(|s| {
            if let Some(entry) = s.messages.iter_mut().find(|t| t.value.id == user_message_id) {
                entry.value.fail(reason.clone());
                entry.sync = SyncState::Failed;
            }
        });
        return Err(ChatError::Repository(e));
    }

    user_message.mark_sent();
    state.send_modify(|s| {
        if let Some(entry) = s.messages.iter_mut().find(|t| t.value.id == user_message_id) {
            *entry = Tracked::confirmed(user_message.clone());
        }
    });

    generation_flow(
        repository,
        completion,
        settings,
        state,
        conversation,
        Vec::new(),
        2,
    )
    .await
}

async fn generation_flow<R, C>(
    repository: Arc<R>,
    completion: Arc<C>,
    settings: ChatSettings,
    state: Arc<watch::Sender<ChatState>>,
    conversation: Conversation,
    exclude: Vec<MessageId>,
    new_messages: u32,
) -> Result<(), ChatError>
where
    R: ConversationRepository,
    C: CompletionClient,
{
    let assistant = Message::assistant(conversation.id);
    let assistant_id = assistant.id;
    state.send_modify(|s| s.messages.push(Tracked::pending(assistant.clone())));

    let history: Vec<ChatTurn> = {
        let snapshot = state.borrow();
        snapshot
            .messages
            .iter()
            .filter(|t| !exclude.contains(&t.value.id))
            .filter(|t| {
                matches!(
                    t.value.status,
                    MessageStatus::Sent | MessageStatus::Completed
                )
            })
            .map(|t| ChatTurn {
                role: t.value.role,
                content: t.value.content.clone(),
            })
            .collect()
    };

    let request = CompletionRequest {
        model_id: conversation.model_id.clone(),
        provider: conversation.provider.clone(),
        messages: history,
        system_prompt: settings.system_prompt.clone(),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    };

    let outcome = match settings.completion_timeout() {
        Some(limit) => match tokio::time::timeout(limit, completion.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::TimedOut),
        },
        None => completion.complete(request).await,
    };

    match outcome {
        Ok(text) => {
            let mut completed = assistant;
            completed.complete(text);
            state.send_modify(|s| {
                if let Some(entry) = s.messages.iter_mut().find(|t| t.value.id == assistant_id) {
                    entry.value = completed.clone();
                }
            });
            repository.add_message(&completed).await?;
            state.send_modify(|s| {
                if let Some(entry) = s.messages.iter_mut().find(|t| t.value.id == assistant_id) {
                    entry.sync = SyncState::Confirmed;
                }
            });

            let mut updated = state
                .borrow()
                .conversation
                .clone()
                .unwrap_or(conversation);
            let preview: String = completed.content.chars().take(120).collect();
            updated.record_exchange(&preview, Utc::now(), new_messages);
            repository.update_conversation(&updated).await?;
            state.send_modify(|s| s.conversation = Some(updated));
            Ok(())
        }
        Err(e) => {
            let mut failed = assistant;
            failed.fail(e.to_string());
            state.send_modify(|s| {
                if let Some(entry) = s.messages.iter_mut().find(|t| t.value.id == assistant_id) {
                    *entry = Tracked::failed(failed.clone());
                }
            });
            // Best effort: the caller needs the provider error, and the
            // failure is already visible in local state.
            if let Err(persist_err) = repository.add_message(&failed).await {
                tracing::warn!(error = %persist_err, "could not persist failed assistant message");
            }
            Err(ChatError::Completion(e))
        }
    }
}
