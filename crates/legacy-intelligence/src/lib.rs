//! LLM provider facade (C6), model registry (C7), and response validation
//! and quality scoring (C8). See `spec.md` §4.6-4.8.

pub mod facade;
pub mod mock_provider;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod validate;

pub use facade::{FacadeRegistry, LlmFacade};
pub use provider::{ChatOptions, ChatResponse, LlmProvider, Message, Provider, ProviderError, Role};
pub use registry::{ModelBinding, ModelRegistry, ModelRole, RegistryError};
pub use validate::{validate_content_summary, validate_feature_analysis, ValidationError, DEFAULT_MIN_QUALITY};
