//! Anthropic-compatible messages-API provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::{ChatOptions, ChatResponse, LlmProvider, Message, Provider, ProviderError, Role};

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
    model: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn chat(
        &self,
        messages: &[Message],
        model_id: &str,
        opts: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone());
        let turns = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| AnthropicMessage {
                role: match m.role {
                    Role::User => "user",
                    _ => "assistant",
                }
                .to_string(),
                content: m.content.clone(),
            })
            .collect();

        let request = AnthropicRequest {
            model: model_id,
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
            system,
            messages: turns,
        };

        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .timeout(std::time::Duration::from_millis(opts.timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(opts.timeout_ms)
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        super::handle_status(&resp)?;

        let body: AnthropicResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let content = body
            .content
            .into_iter()
            .next()
            .map(|b| b.text)
            .ok_or_else(|| ProviderError::Transport("empty content blocks".to_string()))?;

        Ok(ChatResponse {
            id: Uuid::new_v4(),
            content,
            tokens_in: body.usage.input_tokens,
            tokens_out: body.usage.output_tokens,
            model_id: body.model,
            provider: Provider::Anthropic,
        })
    }
}
