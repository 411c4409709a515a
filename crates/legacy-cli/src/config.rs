//! Environment-resolved settings (spec §7 ConfigError: missing/invalid env
//! var is fatal at startup, not discovered lazily mid-run).

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;

use legacy_intelligence::providers::{AnthropicProvider, GeminiProvider, OpenAiProvider};
use legacy_intelligence::{FacadeRegistry, LlmFacade, LlmProvider, ModelRegistry, ModelRole, Provider};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("required environment variable {0} is not set")]
    MissingVar(String),

    #[error(transparent)]
    Registry(#[from] legacy_intelligence::RegistryError),
}

/// Immutable, fully-resolved configuration for one CLI invocation. Built
/// once at startup so a misconfiguration fails fast (spec §7 ConfigError)
/// rather than surfacing mid-run as a page-level failure.
pub struct Settings {
    pub registry: ModelRegistry,
    pub facades: FacadeRegistry,
    pub project_dir: PathBuf,
    pub min_quality: f64,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let registry = ModelRegistry::from_env()?;
        let facades = build_facades(&registry)?;

        let project_dir = std::env::var("LEGACY_DISCOVERY_PROJECT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let min_quality = std::env::var("LEGACY_DISCOVERY_MIN_QUALITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(legacy_intelligence::DEFAULT_MIN_QUALITY);

        Ok(Self {
            registry,
            facades,
            project_dir,
            min_quality,
        })
    }
}

/// Builds one facade per distinct provider referenced by Step1/Step2/
/// Fallback. Most deployments resolve all three roles to the same provider
/// and get a single-entry registry; when `FALLBACK_MODEL` names a model from
/// a different provider, its own client and API key are resolved here too,
/// so the analyzer's (C9) fallback retry is routed through the right one.
fn build_facades(registry: &ModelRegistry) -> Result<FacadeRegistry, SettingsError> {
    let mut facades: HashMap<Provider, LlmFacade> = HashMap::new();
    for role in [ModelRole::Step1, ModelRole::Step2, ModelRole::Fallback] {
        let provider = registry.resolve(role).provider;
        if let Entry::Vacant(entry) = facades.entry(provider) {
            entry.insert(LlmFacade::new(build_provider(provider)?));
        }
    }
    Ok(FacadeRegistry::new(facades))
}

fn build_provider(provider: Provider) -> Result<Box<dyn LlmProvider>, SettingsError> {
    match provider {
        Provider::OpenAi => {
            let key = require_var("OPENAI_API_KEY")?;
            Ok(Box::new(OpenAiProvider::new(key)))
        }
        Provider::Anthropic => {
            let key = require_var("ANTHROPIC_API_KEY")?;
            Ok(Box::new(AnthropicProvider::new(key)))
        }
        Provider::Gemini => {
            let key = require_var("GEMINI_API_KEY")?;
            Ok(Box::new(GeminiProvider::new(key)))
        }
    }
}

fn require_var(name: &str) -> Result<String, SettingsError> {
    std::env::var(name).map_err(|_| SettingsError::MissingVar(name.to_string()))
}
