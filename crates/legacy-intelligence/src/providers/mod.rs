//! Concrete provider request/response shaping, one module per chat API.

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use crate::provider::ProviderError;

/// Shared HTTP status classification: 429 carries an optional `retry-after`,
/// 5xx is transient, other 4xx is terminal.
fn handle_status(resp: &reqwest::Response) -> Result<(), ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    if status.as_u16() == 429 {
        let retry_after_ms = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| secs * 1000);
        return Err(ProviderError::RateLimited(retry_after_ms));
    }
    if status.is_server_error() {
        return Err(ProviderError::ServerError(status.as_u16()));
    }
    Err(ProviderError::ClientError(
        status.as_u16(),
        status.to_string(),
    ))
}
