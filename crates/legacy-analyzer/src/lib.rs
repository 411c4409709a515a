//! Two-step page analyzer (C9, spec §4.9): Step 1 content summarization,
//! Step 2 feature analysis conditioned on Step 1's output, with a
//! retry-same-model-then-fallback-model ladder on schema/quality failure
//! and deterministic priority scoring of the resulting rebuild specs.

mod priority;
mod prompts;

use std::time::Instant;

use legacy_intelligence::{ChatOptions, FacadeRegistry, Message, ModelRegistry, ModelRole};
use legacy_types::analysis::{PageError, PageResult, StepOutcome};
use legacy_types::error::{AnalysisQualityError, LlmError};
use legacy_types::snapshot::PageSnapshot;
use tracing::{instrument, warn};
use uuid::Uuid;

pub use priority::assign_priorities;

pub struct Analyzer<'a> {
    facades: &'a FacadeRegistry,
    registry: &'a ModelRegistry,
    min_quality: f64,
}

impl<'a> Analyzer<'a> {
    pub fn new(facades: &'a FacadeRegistry, registry: &'a ModelRegistry) -> Self {
        Self {
            facades,
            registry,
            min_quality: legacy_intelligence::DEFAULT_MIN_QUALITY,
        }
    }

    pub fn with_min_quality(mut self, min_quality: f64) -> Self {
        self.min_quality = min_quality;
        self
    }

    /// Runs the full two-step pipeline against a single page snapshot, per
    /// spec §4.9. Always returns `Ok` — failures are captured as
    /// `StepOutcome` / `PageError` entries inside the result, never
    /// propagated, so one page's failure cannot abort a batch.
    #[instrument(skip(self, page_id, snapshot), fields(page_id = %page_id))]
    pub async fn analyze_page(&self, page_id: &str, snapshot: &PageSnapshot) -> PageResult {
        let started = Instant::now();
        let mut errors = Vec::new();

        let step1 = self.run_step1(snapshot, &mut errors).await;

        let step2 = match step1.ok() {
            Some(summary) => {
                let mut summary_result = self.run_step2(snapshot, summary, &mut errors).await;
                if let StepOutcome::Ok(ref mut analysis) = summary_result {
                    assign_priorities(analysis, summary.business_importance);
                }
                summary_result
            }
            None => StepOutcome::Skipped,
        };

        PageResult {
            page_id: page_id.to_string(),
            url: snapshot.url.clone(),
            snapshot_ref: None,
            step1,
            step2,
            errors,
            processing_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn run_step1(
        &self,
        snapshot: &PageSnapshot,
        errors: &mut Vec<PageError>,
    ) -> StepOutcome<legacy_types::analysis::ContentSummary> {
        let system = Message::system(prompts::step1_system_prompt());
        let primary = self.registry.resolve(ModelRole::Step1);
        let primary_facade = self.facades.get(primary.provider);

        let first_attempt = primary_facade
            .chat(
                &[system.clone(), Message::user(prompts::step1_user_prompt(snapshot))],
                &primary.model_id,
                &ChatOptions::default(),
            )
            .await;

        let raw = match first_attempt {
            Ok(resp) => resp.content,
            Err(err) => {
                errors.push(llm_error_to_page_error(&err, 0));
                return StepOutcome::Failed {
                    reason: LlmError::Exhausted {
                        role: "step1".to_string(),
                    }
                    .to_string(),
                };
            }
        };

        match legacy_intelligence::validate_content_summary(&raw) {
            Ok(summary) if summary.quality.overall >= self.min_quality => {
                return StepOutcome::Ok(summary)
            }
            Ok(summary) => {
                warn!(quality = summary.quality.overall, "step1 below min quality, retrying");
                errors.push(PageError {
                    error_kind: "quality".to_string(),
                    error_code: "below_min_quality".to_string(),
                    message: format!("quality {:.2} below {:.2}", summary.quality.overall, self.min_quality),
                    retry_count: 0,
                });
            }
            Err(err) => {
                errors.push(PageError {
                    error_kind: "schema".to_string(),
                    error_code: "validation_failed".to_string(),
                    message: err.to_string(),
                    retry_count: 0,
                });
            }
        }

        // Retry 1: same model, hardened prompt.
        let hardened = prompts::step1_hardened_prompt(snapshot, "schema or quality validation failed");
        let retry_result = primary_facade
            .chat(
                &[system.clone(), Message::user(hardened)],
                &primary.model_id,
                &ChatOptions::default(),
            )
            .await;

        if let Ok(resp) = retry_result {
            match legacy_intelligence::validate_content_summary(&resp.content) {
                Ok(summary) if summary.quality.overall >= self.min_quality => {
                    return StepOutcome::Ok(summary)
                }
                _ => {}
            }
        }

        // Retry 2: fallback model, routed through whichever provider it
        // resolves to rather than assumed to match Step1's.
        let fallback = self.registry.resolve(ModelRole::Fallback);
        let fallback_facade = self.facades.get(fallback.provider);
        let fallback_result = fallback_facade
            .chat(
                &[system, Message::user(prompts::step1_user_prompt(snapshot))],
                &fallback.model_id,
                &ChatOptions::default(),
            )
            .await;

        match fallback_result {
            Ok(resp) => match legacy_intelligence::validate_content_summary(&resp.content) {
                Ok(summary) if summary.quality.overall >= self.min_quality => StepOutcome::Ok(summary),
                Ok(summary) => {
                    errors.push(PageError {
                        error_kind: "quality".to_string(),
                        error_code: "below_min_quality".to_string(),
                        message: format!("quality {:.2} below {:.2}", summary.quality.overall, self.min_quality),
                        retry_count: 2,
                    });
                    StepOutcome::Partial {
                        raw: resp.content,
                        reason: "step1_failed: exhausted retry and fallback".to_string(),
                    }
                }
                Err(err) => {
                    errors.push(PageError {
                        error_kind: "schema".to_string(),
                        error_code: "validation_failed".to_string(),
                        message: err.to_string(),
                        retry_count: 2,
                    });
                    StepOutcome::Partial {
                        raw: resp.content,
                        reason: format!("step1_failed: {err}"),
                    }
                }
            },
            Err(err) => {
                errors.push(llm_error_to_page_error(&err, 2));
                StepOutcome::Failed {
                    reason: AnalysisQualityError::SchemaParse(
                        "step1_failed: exhausted retry and fallback".to_string(),
                    )
                    .to_string(),
                }
            }
        }
    }

    async fn run_step2(
        &self,
        snapshot: &PageSnapshot,
        summary: &legacy_types::analysis::ContentSummary,
        errors: &mut Vec<PageError>,
    ) -> StepOutcome<legacy_types::analysis::FeatureAnalysis> {
        let system = Message::system(prompts::step2_system_prompt());
        let primary = self.registry.resolve(ModelRole::Step2);
        let primary_facade = self.facades.get(primary.provider);
        let context_ref = summary.id;

        let first_attempt = primary_facade
            .chat(
                &[system.clone(), Message::user(prompts::step2_user_prompt(snapshot, summary))],
                &primary.model_id,
                &ChatOptions::default(),
            )
            .await;

        let raw = match first_attempt {
            Ok(resp) => Some(resp.content),
            Err(err) => {
                errors.push(llm_error_to_page_error(&err, 0));
                None
            }
        };

        if let Some(raw) = raw {
            match legacy_intelligence::validate_feature_analysis(&raw, context_ref) {
                Ok(analysis) if analysis.quality_score >= self.min_quality => {
                    return StepOutcome::Ok(analysis)
                }
                _ => {}
            }
        }

        let hardened = prompts::step2_hardened_prompt(snapshot, summary, "schema or quality validation failed");
        let retry_result = primary_facade
            .chat(
                &[system.clone(), Message::user(hardened)],
                &primary.model_id,
                &ChatOptions::default(),
            )
            .await;

        if let Ok(resp) = retry_result {
            if let Ok(analysis) = legacy_intelligence::validate_feature_analysis(&resp.content, context_ref) {
                if analysis.quality_score >= self.min_quality {
                    return StepOutcome::Ok(analysis);
                }
            }
        }

        // Fallback model, routed through whichever provider it resolves to
        // rather than assumed to match Step2's.
        let fallback = self.registry.resolve(ModelRole::Fallback);
        let fallback_facade = self.facades.get(fallback.provider);
        let fallback_result = fallback_facade
            .chat(
                &[system, Message::user(prompts::step2_user_prompt(snapshot, summary))],
                &fallback.model_id,
                &ChatOptions::default(),
            )
            .await;

        match fallback_result {
            Ok(resp) => match legacy_intelligence::validate_feature_analysis(&resp.content, context_ref) {
                Ok(analysis) if analysis.quality_score >= self.min_quality => StepOutcome::Ok(analysis),
                Ok(_) | Err(_) => {
                    errors.push(PageError {
                        error_kind: "schema".to_string(),
                        error_code: "validation_failed".to_string(),
                        message: "step2_failed: exhausted retry and fallback".to_string(),
                        retry_count: 2,
                    });
                    StepOutcome::Partial {
                        raw: resp.content,
                        reason: "step2_failed: exhausted retry and fallback".to_string(),
                    }
                }
            },
            Err(err) => {
                errors.push(llm_error_to_page_error(&err, 2));
                StepOutcome::Failed {
                    reason: "step2_failed: exhausted retry and fallback".to_string(),
                }
            }
        }
    }
}

fn llm_error_to_page_error(err: &legacy_intelligence::ProviderError, retry_count: u32) -> PageError {
    PageError {
        error_kind: "llm".to_string(),
        error_code: if err.is_transient() {
            "transient".to_string()
        } else {
            "terminal".to_string()
        },
        message: err.to_string(),
        retry_count,
    }
}

/// Generates a fresh page id for callers that don't already have one
/// (e.g. ad-hoc analysis outside the workflow engine).
pub fn new_page_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacy_intelligence::mock_provider::MockProvider;
    use legacy_intelligence::{LlmFacade, Provider};
    use legacy_types::snapshot::{DomStats, NetworkLog, TechSignals};
    use std::collections::HashMap;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn sample_snapshot() -> PageSnapshot {
        PageSnapshot {
            url: "https://example.com/cart".to_string(),
            final_url: "https://example.com/cart".to_string(),
            status_code: 200,
            title: "Your Cart".to_string(),
            html: "<html></html>".to_string(),
            visible_text: "Review your cart before checkout.".to_string(),
            meta: HashMap::new(),
            screenshot: None,
            network: NetworkLog::new(),
            dom_stats: DomStats::default(),
            tech_signals: TechSignals::default(),
            interaction_log: None,
            load_time_ms: 100,
        }
    }

    fn registry_with(step1: &str, step2: &str, fallback: &str) -> ModelRegistry {
        let _guard = ENV_LOCK.lock().unwrap();
        for var in [
            "STEP1_MODEL",
            "STEP2_MODEL",
            "FALLBACK_MODEL",
            "OPENAI_CHAT_MODEL",
        ] {
            env::remove_var(var);
        }
        env::set_var("OPENAI_CHAT_MODEL", step1);
        env::set_var("STEP1_MODEL", step1);
        env::set_var("STEP2_MODEL", step2);
        env::set_var("FALLBACK_MODEL", fallback);
        ModelRegistry::from_env().unwrap()
    }

    /// Like `registry_with`, but also registers `fallback` against
    /// `ANTHROPIC_CHAT_MODEL` so the fallback role resolves to a different
    /// provider than Step1/Step2.
    fn registry_with_providers(step1: &str, step2: &str, fallback: &str) -> ModelRegistry {
        let _guard = ENV_LOCK.lock().unwrap();
        for var in [
            "STEP1_MODEL",
            "STEP2_MODEL",
            "FALLBACK_MODEL",
            "OPENAI_CHAT_MODEL",
            "ANTHROPIC_CHAT_MODEL",
        ] {
            env::remove_var(var);
        }
        env::set_var("OPENAI_CHAT_MODEL", step1);
        env::set_var("ANTHROPIC_CHAT_MODEL", fallback);
        env::set_var("STEP1_MODEL", step1);
        env::set_var("STEP2_MODEL", step2);
        env::set_var("FALLBACK_MODEL", fallback);
        ModelRegistry::from_env().unwrap()
    }

    #[tokio::test]
    async fn successful_step1_skips_step2_when_it_fails_terminally() {
        let good_summary = r#"{
            "purpose": "Lets a customer review their cart.",
            "user_context": "Returning shoppers.",
            "business_logic": "Calculates totals and applies promo codes before checkout proceeds.",
            "navigation_role": "Between catalog and checkout.",
            "business_importance": 0.8,
            "workflows": ["checkout"],
            "journey_stage": "middle",
            "keywords": ["cart", "checkout"]
        }"#;

        let provider = MockProvider::always_returning(Provider::OpenAi, good_summary);
        let facade = LlmFacade::new(Box::new(provider));
        let mut facades = HashMap::new();
        facades.insert(Provider::OpenAi, facade);
        let facades = FacadeRegistry::new(facades);
        let registry = registry_with("gpt-4o", "gpt-4o", "gpt-4o");

        let analyzer = Analyzer::new(&facades, &registry);
        let result = analyzer.analyze_page("p1", &sample_snapshot()).await;

        assert!(matches!(result.step1, StepOutcome::Ok(_)));
    }

    #[tokio::test]
    async fn fallback_to_a_different_provider_uses_that_providers_facade() {
        let good_summary = r#"{
            "purpose": "Lets a customer review their cart.",
            "user_context": "Returning shoppers.",
            "business_logic": "Calculates totals and applies promo codes before checkout proceeds.",
            "navigation_role": "Between catalog and checkout.",
            "business_importance": 0.8,
            "workflows": ["checkout"],
            "journey_stage": "middle",
            "keywords": ["cart", "checkout"]
        }"#;

        // OpenAI (Step1's provider) never produces a valid summary, so both
        // the first attempt and the same-model retry exhaust against it; the
        // fallback role resolves to Anthropic, so only its facade ever sees
        // a parseable response.
        let openai = MockProvider::always_returning(Provider::OpenAi, "not valid json");
        let anthropic = MockProvider::always_returning(Provider::Anthropic, good_summary);

        let mut facades = HashMap::new();
        facades.insert(Provider::OpenAi, LlmFacade::new(Box::new(openai)));
        facades.insert(Provider::Anthropic, LlmFacade::new(Box::new(anthropic)));
        let facades = FacadeRegistry::new(facades);

        let registry = registry_with_providers("gpt-4o", "gpt-4o", "claude-3-5-sonnet");

        let analyzer = Analyzer::new(&facades, &registry);
        let result = analyzer.analyze_page("p1", &sample_snapshot()).await;

        assert!(matches!(result.step1, StepOutcome::Ok(_)));
    }
}
