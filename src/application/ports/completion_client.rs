use async_trait::async_trait;

use crate::domain::MessageRole;

/// One turn of history handed to the provider.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

/// Everything a provider call needs. Generation parameters are passed
/// through from configuration; the engine owns no defaults for them.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model_id: String,
    pub provider: String,
    pub messages: Vec<ChatTurn>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// The whole reply arrives as one unit; token-by-token streaming is
    /// not part of this contract.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("completion timed out")]
    TimedOut,
}
