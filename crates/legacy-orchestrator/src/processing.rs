//! Concrete per-page work (spec §4.12): acquire a browser session, navigate
//! and capture (C5), run the two-step analyzer (C9), publish the result
//! (C13). This is the `PageProcessor` the scheduler (C11) is generic over.

use std::sync::Arc;

use async_trait::async_trait;
use legacy_analyzer::Analyzer;
use legacy_artifacts::ArtifactStore;
use legacy_browser::{navigate_and_extract, NavigateOptions, SessionManager};
use legacy_docgen::DocGenerator;
use legacy_intelligence::{FacadeRegistry, ModelRegistry};
use legacy_types::analysis::{PageError, PageResult, ProjectMetadata, StepOutcome};
use legacy_workflow::PageProcessor;
use tracing::{instrument, warn};

use crate::interactive::{ConfirmationGate, ConfirmationPoint};

pub struct SitePageProcessor {
    sessions: Arc<SessionManager>,
    facades: Arc<FacadeRegistry>,
    registry: Arc<ModelRegistry>,
    artifacts: Arc<ArtifactStore>,
    navigate_options: NavigateOptions,
    min_quality: f64,
    metadata: ProjectMetadata,
    gate: Option<Arc<dyn ConfirmationGate>>,
}

impl SitePageProcessor {
    pub fn new(
        sessions: Arc<SessionManager>,
        facades: Arc<FacadeRegistry>,
        registry: Arc<ModelRegistry>,
        artifacts: Arc<ArtifactStore>,
        metadata: ProjectMetadata,
    ) -> Self {
        Self {
            sessions,
            facades,
            registry,
            artifacts,
            navigate_options: NavigateOptions::default(),
            min_quality: legacy_intelligence::DEFAULT_MIN_QUALITY,
            metadata,
            gate: None,
        }
    }

    pub fn with_min_quality(mut self, min_quality: f64) -> Self {
        self.min_quality = min_quality;
        self
    }

    pub fn with_confirmation_gate(mut self, gate: Arc<dyn ConfirmationGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn skipped_result(page_id: &str, url: &str, reason: &str) -> PageResult {
        PageResult {
            page_id: page_id.to_string(),
            url: url.to_string(),
            snapshot_ref: None,
            step1: StepOutcome::Skipped,
            step2: StepOutcome::Skipped,
            errors: vec![PageError {
                error_kind: "interactive".to_string(),
                error_code: "declined".to_string(),
                message: reason.to_string(),
                retry_count: 0,
            }],
            processing_time_ms: 0,
        }
    }

    fn navigation_failure(page_id: &str, url: &str, code: &str, message: String) -> PageResult {
        PageResult {
            page_id: page_id.to_string(),
            url: url.to_string(),
            snapshot_ref: None,
            step1: StepOutcome::Failed {
                reason: message.clone(),
            },
            step2: StepOutcome::Skipped,
            errors: vec![PageError {
                error_kind: "navigation".to_string(),
                error_code: code.to_string(),
                message,
                retry_count: 0,
            }],
            processing_time_ms: 0,
        }
    }
}

#[async_trait]
impl PageProcessor for SitePageProcessor {
    #[instrument(skip(self), fields(%url))]
    async fn process(&self, page_id: &str, url: &str) -> PageResult {
        if let Some(gate) = &self.gate {
            if !gate.confirm(ConfirmationPoint::BeforePage, url).await {
                return Self::skipped_result(page_id, url, "user declined to process this page");
            }
        }

        let mut session = match self.sessions.acquire(None).await {
            Ok(session) => session,
            Err(err) => return Self::navigation_failure(page_id, url, "session_unavailable", err.to_string()),
        };

        let snapshot = navigate_and_extract(&mut session, url, &self.navigate_options).await;
        self.sessions.release(session);
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(err) => return Self::navigation_failure(page_id, url, "navigate_failed", err.to_string()),
        };

        let analyzer = Analyzer::new(&self.facades, &self.registry).with_min_quality(self.min_quality);
        let result = analyzer.analyze_page(page_id, &snapshot).await;

        let slug = slugify(url);
        let generator = DocGenerator::new(&self.artifacts);
        if let Err(err) = generator
            .publish_page(
                page_id,
                url,
                &slug,
                result.step1.clone(),
                result.step2.clone(),
                &self.metadata,
            )
            .await
        {
            warn!(error = %err, page_id, "failed to publish page artifacts");
        }

        result
    }
}

/// Turns a url's path into a filesystem- and markdown-link-safe slug, e.g.
/// `https://example.com/cart/checkout?x=1` -> `cart-checkout`, and the root
/// path -> `index`.
pub fn slugify(url: &str) -> String {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = after_scheme.split_once('/').map(|(_, path)| path).unwrap_or("");
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_matches('/');

    if trimmed.is_empty() {
        return "index".to_string();
    }

    let normalized: String = trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();

    let slug: String = normalized
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "index".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_slugs_to_index() {
        assert_eq!(slugify("https://example.com/"), "index");
        assert_eq!(slugify("https://example.com"), "index");
    }

    #[test]
    fn nested_path_becomes_hyphenated_slug() {
        assert_eq!(slugify("https://example.com/cart/checkout"), "cart-checkout");
    }

    #[test]
    fn query_string_is_dropped_from_the_slug() {
        assert_eq!(slugify("https://example.com/search?q=shoes"), "search");
    }
}
