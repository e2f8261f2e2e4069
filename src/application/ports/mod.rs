mod completion_client;
mod conversation_repository;
mod repository_error;

pub use completion_client::{ChatTurn, CompletionClient, CompletionError, CompletionRequest};
pub use conversation_repository::{ConversationRepository, Snapshots};
pub use repository_error::RepositoryError;
