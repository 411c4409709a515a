//! Unified error taxonomy for the legacy-site discovery engine.
//!
//! Each subsystem defines its own error enum; this module composes them into
//! a single [`LegacyError`] via `#[from]`, following the same shape the rest
//! of the workspace uses for per-crate error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LegacyError>;

/// Missing or invalid configuration. Fatal at startup (§7 ConfigError).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(String),

    #[error("environment variable {0} has an invalid value: {1}")]
    InvalidValue(String, String),

    #[error("unknown model identifier for role {role}: {model_id}")]
    UnknownModel { role: String, model_id: String },

    #[error("no LLM provider API key was supplied")]
    NoProviderConfigured,
}

/// URL normalization failures (§7 InvalidURL). Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidUrlError {
    #[error("url could not be parsed: {0}")]
    ParseFailure(String),

    #[error("unsupported scheme {0:?}, only http/https are accepted")]
    UnsupportedScheme(String),

    #[error("url has an empty host")]
    EmptyHost,
}

/// Discovery-phase failures (§7 DiscoveryError).
#[derive(Error, Debug, Clone)]
pub enum DiscoveryError {
    #[error("robots.txt fetch failed for {host}: {message}")]
    RobotsFetchFailed { host: String, message: String },

    #[error("sitemap fetch failed for {url}: {message}")]
    SitemapFetchFailed { url: String, message: String },

    #[error("crawl failed for {root}: {message}")]
    CrawlFailed { root: String, message: String },

    #[error("discovery produced zero reachable urls for seed {seed}")]
    EmptyInventory { seed: String },
}

/// Browser navigation failures (§7 NavigationTimeout/NavigationFailure/BrowserCrash).
#[derive(Error, Debug, Clone)]
pub enum NavigationError {
    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("navigation to {url} failed with status {status}")]
    Failure { url: String, status: u16 },

    #[error("browser session crashed: {message}")]
    BrowserCrash { message: String },

    #[error("no healthy browser session available")]
    PoolExhausted,
}

/// LLM facade failures after retry/fallback exhaustion (§7 LLMError).
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("provider {provider} request failed: {message}")]
    RequestFailed { provider: String, message: String },

    #[error("provider {provider} rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: Option<u64>,
    },

    #[error("request to {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("all retries and fallback exhausted for role {role}")]
    Exhausted { role: String },
}

/// Schema/quality validation failures (§7 AnalysisQualityError).
#[derive(Error, Debug, Clone)]
pub enum AnalysisQualityError {
    #[error("response failed to parse as json: {0}")]
    SchemaParse(String),

    #[error("response is missing required field {0}")]
    MissingField(String),

    #[error("response field {field} has invalid value: {message}")]
    InvalidField { field: String, message: String },

    #[error("quality score {score:.2} is below minimum {minimum:.2}")]
    BelowQualityThreshold { score: f64, minimum: f64 },
}

/// Checkpoint persistence failures (§7 CheckpointError). Fatal, data-integrity class.
#[derive(Error, Debug, Clone)]
pub enum CheckpointError {
    #[error("failed to write checkpoint for workflow {workflow_id}: {message}")]
    WriteFailed {
        workflow_id: String,
        message: String,
    },

    #[error("failed to read checkpoint at {path}: {message}")]
    ReadFailed { path: String, message: String },
}

/// Artifact store I/O failures (§7 IOError). Fatal if repeated.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("failed to write artifact {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("failed to read artifact {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("advisory lock on {path} could not be acquired: {message}")]
    LockFailed { path: String, message: String },
}

/// Top-level error composing every subsystem taxonomy.
#[derive(Error, Debug)]
pub enum LegacyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrlError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    AnalysisQuality(#[from] AnalysisQualityError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl LegacyError {
    pub fn custom(msg: impl Into<String>) -> Self {
        LegacyError::Custom(msg.into())
    }

    /// Whether this error aborts the whole workflow rather than just the page
    /// it occurred on (§7 propagation policy).
    pub fn is_workflow_fatal(&self) -> bool {
        matches!(
            self,
            LegacyError::Config(_) | LegacyError::Checkpoint(_)
        ) || matches!(self, LegacyError::Discovery(DiscoveryError::EmptyInventory { .. }))
    }
}
