use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub llm: LlmSettings,
    pub chat: ChatSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
}

/// Generation parameters handed through to the completion provider.
/// The engine owns no defaults for these; absent values are simply not
/// sent. `completion_timeout_seconds` bounds the provider call so a
/// hung request cannot strand a message in `generating`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatSettings {
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub completion_timeout_seconds: Option<u64>,
}

impl ChatSettings {
    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            llm: LlmSettings {
                base_url: std::env::var("LLM_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                api_key: std::env::var("LLM_API_KEY").unwrap_or_default(),
            },
            chat: ChatSettings {
                system_prompt: std::env::var("CHAT_SYSTEM_PROMPT").ok(),
                temperature: std::env::var("CHAT_TEMPERATURE")
                    .ok()
                    .and_then(|v| v.parse().ok()),
                max_tokens: std::env::var("CHAT_MAX_TOKENS")
                    .ok()
                    .and_then(|v| v.parse().ok()),
                completion_timeout_seconds: std::env::var("CHAT_COMPLETION_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            },
            logging: LoggingSettings {
                level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                enable_json: std::env::var("LOG_FORMAT")
                    .map(|v| v.to_lowercase() == "json")
                    .unwrap_or(false),
            },
        }
    }
}
