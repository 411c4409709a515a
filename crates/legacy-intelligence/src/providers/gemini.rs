//! Gemini-compatible generateContent provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::{ChatOptions, ChatResponse, LlmProvider, Message, Provider, ProviderError, Role};

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: GeminiUsage,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContentResp,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResp {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: u32,
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn chat(
        &self,
        messages: &[Message],
        model_id: &str,
        opts: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        let system_instruction = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| GeminiContent {
                role: "system".to_string(),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            });

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| GeminiContent {
                role: match m.role {
                    Role::User => "user",
                    _ => "model",
                }
                .to_string(),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        let request = GeminiRequest {
            contents,
            system_instruction,
            generation_config: GeminiGenerationConfig {
                max_output_tokens: opts.max_tokens,
                temperature: opts.temperature,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model_id, self.api_key
        );

        let resp = self
            .client
            .post(url)
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

        let body: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let content = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::Transport("empty candidates array".to_string()))?;

        Ok(ChatResponse {
            id: Uuid::new_v4(),
            content,
            tokens_in: body.usage_metadata.prompt_token_count,
            tokens_out: body.usage_metadata.candidates_token_count,
            model_id: model_id.to_string(),
            provider: Provider::Gemini,
        })
    }
}
