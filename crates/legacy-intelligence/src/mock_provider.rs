//! In-memory scripted provider for tests, mirroring the teacher's
//! mock-provider pattern: a fixed queue of responses (or errors) returned
//! in order, independent of prompt content.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::provider::{ChatOptions, ChatResponse, LlmProvider, Message, Provider, ProviderError};

pub enum ScriptedOutcome {
    Respond(String),
    Fail(ProviderError),
}

pub struct MockProvider {
    provider: Provider,
    script: Mutex<Vec<ScriptedOutcome>>,
}

impl MockProvider {
    pub fn new(provider: Provider, script: Vec<ScriptedOutcome>) -> Self {
        Self {
            provider,
            script: Mutex::new(script),
        }
    }

    pub fn always_returning(provider: Provider, content: impl Into<String>) -> Self {
        Self::new(provider, vec![ScriptedOutcome::Respond(content.into())])
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn chat(
        &self,
        _messages: &[Message],
        model_id: &str,
        _opts: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        let mut script = self.script.lock().unwrap();
        let outcome = if script.len() > 1 {
            script.remove(0)
        } else {
            // last scripted outcome repeats indefinitely
            match script.first() {
                Some(ScriptedOutcome::Respond(content)) => ScriptedOutcome::Respond(content.clone()),
                Some(ScriptedOutcome::Fail(err)) => ScriptedOutcome::Fail(err.clone()),
                None => return Err(ProviderError::Transport("mock script exhausted".to_string())),
            }
        };

        match outcome {
            ScriptedOutcome::Respond(content) => Ok(ChatResponse {
                id: Uuid::new_v4(),
                content,
                tokens_in: 10,
                tokens_out: 10,
                model_id: model_id.to_string(),
                provider: self.provider,
            }),
            ScriptedOutcome::Fail(err) => Err(err),
        }
    }
}
