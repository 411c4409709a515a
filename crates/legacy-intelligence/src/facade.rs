//! Unified retrying entry point over a single `LlmProvider` (C6, spec
//! §4.6). Exponential backoff ladder 1s/2s/4s/8s/16s on transient errors;
//! honors a provider's `retry-after` when given. Fallback-model selection is
//! the analyzer's (C9) job, not this facade's — it only retries the *same*
//! model against the *same* provider.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{instrument, warn};

use crate::provider::{ChatOptions, ChatResponse, LlmProvider, Message, Provider, ProviderError};

const BACKOFF_MS: [u64; 5] = [1_000, 2_000, 4_000, 8_000, 16_000];

pub struct LlmFacade {
    provider: Box<dyn LlmProvider>,
}

impl LlmFacade {
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> Provider {
        self.provider.provider()
    }

    #[instrument(skip(self, messages, opts), fields(provider = %self.provider.provider(), model = %model_id))]
    pub async fn chat(
        &self,
        messages: &[Message],
        model_id: &str,
        opts: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        let mut last_err = None;

        for (attempt, backoff_ms) in BACKOFF_MS.iter().enumerate() {
            match self.provider.chat(messages, model_id, opts).await {
                Ok(resp) => return Ok(resp),
                Err(err) if err.is_transient() => {
                    let wait_ms = err.retry_after_ms().unwrap_or(*backoff_ms);
                    warn!(
                        attempt,
                        wait_ms, error = %err, "transient llm error, retrying"
                    );
                    last_err = Some(err);
                    tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_err.expect("loop runs at least once"))
    }
}

/// Maps each provider referenced by the resolved model roles (C7) to its own
/// retrying facade, so a role that resolves to a different provider than the
/// others — most commonly `ModelRole::Fallback` — is routed through that
/// provider's client instead of reusing whichever facade happens to be on
/// hand.
pub struct FacadeRegistry {
    facades: HashMap<Provider, LlmFacade>,
}

impl FacadeRegistry {
    pub fn new(facades: HashMap<Provider, LlmFacade>) -> Self {
        Self { facades }
    }

    /// Looks up the facade for `provider`. Panics if none was registered;
    /// callers build this registry from the same `ModelRegistry` bindings it
    /// will be queried against, so every provider any role resolves to is
    /// guaranteed to have a facade by construction.
    pub fn get(&self, provider: Provider) -> &LlmFacade {
        self.facades
            .get(&provider)
            .unwrap_or_else(|| panic!("no facade configured for provider {provider}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatOptions, Message, Provider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FlakyProvider {
        calls: Arc<AtomicUsize>,
        fail_times: usize,
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        fn provider(&self) -> Provider {
            Provider::OpenAi
        }

        async fn chat(
            &self,
            _messages: &[Message],
            _model_id: &str,
            _opts: &ChatOptions,
        ) -> Result<ChatResponse, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(ProviderError::ServerError(503))
            } else {
                Ok(ChatResponse {
                    id: uuid::Uuid::new_v4(),
                    content: "ok".to_string(),
                    tokens_in: 1,
                    tokens_out: 1,
                    model_id: "m".to_string(),
                    provider: Provider::OpenAi,
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let facade = LlmFacade::new(Box::new(FlakyProvider {
            calls: calls.clone(),
            fail_times: 2,
        }));

        let resp = facade
            .chat(
                &[Message::user("hi")],
                "m",
                &ChatOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(resp.content, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_ladder_on_persistent_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let facade = LlmFacade::new(Box::new(FlakyProvider {
            calls: calls.clone(),
            fail_times: 100,
        }));

        let result = facade
            .chat(&[Message::user("hi")], "m", &ChatOptions::default())
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), BACKOFF_MS.len());
    }

    #[tokio::test]
    async fn non_transient_error_returns_immediately() {
        struct AlwaysClientError;

        #[async_trait]
        impl LlmProvider for AlwaysClientError {
            fn provider(&self) -> Provider {
                Provider::OpenAi
            }

            async fn chat(
                &self,
                _messages: &[Message],
                _model_id: &str,
                _opts: &ChatOptions,
            ) -> Result<ChatResponse, ProviderError> {
                Err(ProviderError::ClientError(400, "bad request".to_string()))
            }
        }

        let facade = LlmFacade::new(Box::new(AlwaysClientError));
        let result = facade
            .chat(&[Message::user("hi")], "m", &ChatOptions::default())
            .await;

        assert!(matches!(result, Err(ProviderError::ClientError(400, _))));
    }
}
