use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{CompletionClient, CompletionError, CompletionRequest};

/// Scripted completion client. Replies and faults are consumed in
/// order; with an empty script every call returns a canned reply.
#[derive(Default)]
pub struct MockCompletionClient {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(text: &str) -> Self {
        let client = Self::new();
        client.push_reply(text);
        client
    }

    pub fn push_reply(&self, text: &str) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(text.to_string()));
    }

    pub fn push_error(&self, error: CompletionError) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Ok("Mock reply".to_string()))
    }
}
