//! OpenAI-compatible chat-completions provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::{ChatOptions, ChatResponse, LlmProvider, Message, Provider, ProviderError};

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: OpenAiUsage,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessageResp,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessageResp {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn chat(
        &self,
        messages: &[Message],
        model_id: &str,
        opts: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        let request = OpenAiRequest {
            model: model_id,
            messages: messages
                .iter()
                .map(|m| OpenAiMessage {
                    role: match m.role {
                        crate::provider::Role::System => "system",
                        crate::provider::Role::User => "user",
                        crate::provider::Role::Assistant => "assistant",
                    }
                    .to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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

        let body: OpenAiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Transport("empty choices array".to_string()))?;

        Ok(ChatResponse {
            id: Uuid::new_v4(),
            content,
            tokens_in: body.usage.prompt_tokens,
            tokens_out: body.usage.completion_tokens,
            model_id: body.model,
            provider: Provider::OpenAi,
        })
    }
}
