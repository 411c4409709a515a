//! Core LLM provider trait and message/request/response types (C6, spec
//! §4.6). Grounded on the shape used throughout the teacher's intelligence
//! crate: a small `async_trait` capability interface plus plain data types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.2,
            timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: Uuid,
    pub content: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub model_id: String,
    pub provider: Provider,
}

/// Transient vs. terminal failure classification used by the facade's retry
/// ladder (spec §4.6).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("rate limited, retry after {0:?}ms")]
    RateLimited(Option<u64>),

    #[error("server error {0}")]
    ServerError(u16),

    #[error("client error {0}: {1}")]
    ClientError(u16, String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout(_) | ProviderError::RateLimited(_) | ProviderError::ServerError(_)
        )
    }

    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited(ms) => *ms,
            _ => None,
        }
    }
}

/// Unified provider capability: one `chat` entry point per spec §4.6. Never
/// returns partial content — either `Ok` with a full response or a typed
/// `ProviderError`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn provider(&self) -> Provider;

    async fn chat(
        &self,
        messages: &[Message],
        model_id: &str,
        opts: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError>;
}
