//! Env-var-driven role -> (provider, model) resolution (C7, spec §4.7).
//! Fails fast at startup, naming the missing variable, rather than failing
//! lazily on first use.

use std::collections::HashMap;
use std::env;

use thiserror::Error;

use crate::provider::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    Step1,
    Step2,
    Fallback,
}

impl ModelRole {
    fn env_var(self) -> &'static str {
        match self {
            ModelRole::Step1 => "STEP1_MODEL",
            ModelRole::Step2 => "STEP2_MODEL",
            ModelRole::Fallback => "FALLBACK_MODEL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelBinding {
    pub provider: Provider,
    pub model_id: String,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("unknown model id {0:?} referenced by {1}")]
    UnknownModel(String, String),
}

/// Resolves `STEP1_MODEL` / `STEP2_MODEL` / `FALLBACK_MODEL` against a
/// provider-qualified model catalog built from `OPENAI_CHAT_MODEL` /
/// `ANTHROPIC_CHAT_MODEL` / `GEMINI_CHAT_MODEL`.
pub struct ModelRegistry {
    bindings: HashMap<ModelRole, ModelBinding>,
}

impl ModelRegistry {
    /// Reads all five environment variables and resolves each role
    /// reference against the provider catalog. Fails fast on the first
    /// missing or unresolvable entry.
    pub fn from_env() -> Result<Self, RegistryError> {
        let catalog = Self::build_catalog()?;

        let mut bindings = HashMap::new();
        for role in [ModelRole::Step1, ModelRole::Step2, ModelRole::Fallback] {
            let raw = env::var(role.env_var())
                .map_err(|_| RegistryError::MissingVar(role.env_var().to_string()))?;
            let binding = catalog
                .get(raw.as_str())
                .cloned()
                .ok_or_else(|| RegistryError::UnknownModel(raw.clone(), role.env_var().to_string()))?;
            bindings.insert(role, binding);
        }

        Ok(Self { bindings })
    }

    fn build_catalog() -> Result<HashMap<String, ModelBinding>, RegistryError> {
        let mut catalog = HashMap::new();
        let entries = [
            ("OPENAI_CHAT_MODEL", Provider::OpenAi),
            ("ANTHROPIC_CHAT_MODEL", Provider::Anthropic),
            ("GEMINI_CHAT_MODEL", Provider::Gemini),
        ];

        for (var, provider) in entries {
            if let Ok(model_id) = env::var(var) {
                catalog.insert(
                    model_id.clone(),
                    ModelBinding {
                        provider,
                        model_id,
                    },
                );
            }
        }

        if catalog.is_empty() {
            return Err(RegistryError::MissingVar(
                "at least one of OPENAI_CHAT_MODEL/ANTHROPIC_CHAT_MODEL/GEMINI_CHAT_MODEL".to_string(),
            ));
        }

        Ok(catalog)
    }

    pub fn resolve(&self, role: ModelRole) -> &ModelBinding {
        self.bindings
            .get(&role)
            .expect("all roles resolved during from_env")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            "STEP1_MODEL",
            "STEP2_MODEL",
            "FALLBACK_MODEL",
            "OPENAI_CHAT_MODEL",
            "ANTHROPIC_CHAT_MODEL",
            "GEMINI_CHAT_MODEL",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn resolves_all_roles_when_configured() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OPENAI_CHAT_MODEL", "gpt-4o");
        env::set_var("ANTHROPIC_CHAT_MODEL", "claude-3-5-sonnet");
        env::set_var("STEP1_MODEL", "gpt-4o");
        env::set_var("STEP2_MODEL", "gpt-4o");
        env::set_var("FALLBACK_MODEL", "claude-3-5-sonnet");

        let registry = ModelRegistry::from_env().unwrap();
        assert_eq!(registry.resolve(ModelRole::Step1).provider, Provider::OpenAi);
        assert_eq!(
            registry.resolve(ModelRole::Fallback).provider,
            Provider::Anthropic
        );
        clear_env();
    }

    #[test]
    fn missing_role_var_names_it_in_the_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OPENAI_CHAT_MODEL", "gpt-4o");

        let err = ModelRegistry::from_env().unwrap_err();
        assert!(matches!(err, RegistryError::MissingVar(ref v) if v == "STEP1_MODEL"));
        clear_env();
    }

    #[test]
    fn unknown_model_id_is_echoed_in_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OPENAI_CHAT_MODEL", "gpt-4o");
        env::set_var("STEP1_MODEL", "not-a-real-model");
        env::set_var("STEP2_MODEL", "gpt-4o");
        env::set_var("FALLBACK_MODEL", "gpt-4o");

        let err = ModelRegistry::from_env().unwrap_err();
        match err {
            RegistryError::UnknownModel(model, var) => {
                assert_eq!(model, "not-a-real-model");
                assert_eq!(var, "STEP1_MODEL");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        clear_env();
    }
}
