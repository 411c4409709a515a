//! Top-level orchestration entry point (spec §4.12): discover -> select ->
//! estimate cost -> (optionally confirm) -> run the workflow -> synthesize
//! the final report, grounded on `riptide-facade::builder::RiptideBuilder`'s
//! role of composing the workspace's capabilities into one call.

use std::sync::Arc;

use chrono::Utc;
use legacy_artifacts::ArtifactStore;
use legacy_browser::{BrowserEngine, SessionManager};
use legacy_discovery::{discover_website, DiscoveryOptions, HttpFetcher};
use legacy_docgen::DocGenerator;
use legacy_intelligence::{FacadeRegistry, ModelRegistry};
use legacy_types::analysis::{Checkpoint, Counts, PageResult, ProjectMetadata, QualitySummary};
use legacy_types::error::LegacyError;
use legacy_workflow::{PageEntry, WorkflowEngine, WorkflowOptions};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::cost::{estimate_cost, CostEstimate};
use crate::interactive::{AutoConfirm, ConfirmationGate, ConfirmationPoint};
use crate::mode::AnalysisOptions;
use crate::processing::SitePageProcessor;
use crate::selection::select_pages;

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub project_id: String,
    pub pages: Vec<PageResult>,
    pub cost_estimate: CostEstimate,
}

/// Runs discovery, page selection, cost estimation, and the full analysis
/// workflow for `seed_url`, publishing artifacts via `artifacts` as each
/// page completes. `resume_from` replays a prior checkpoint (spec §4.11
/// resume semantics) against a freshly re-discovered and re-selected page
/// list, which is deterministic given the same `options` and a stable site.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(fetcher, browser_engine, facades, registry, artifacts, gate, resume_from), fields(%seed_url))]
pub async fn analyze_legacy_site(
    seed_url: &str,
    options: AnalysisOptions,
    fetcher: &dyn HttpFetcher,
    browser_engine: Arc<dyn BrowserEngine>,
    facades: Arc<FacadeRegistry>,
    registry: Arc<ModelRegistry>,
    artifacts: Arc<ArtifactStore>,
    gate: Option<Arc<dyn ConfirmationGate>>,
    resume_from: Option<Checkpoint>,
) -> Result<AnalysisResult, LegacyError> {
    let gate: Arc<dyn ConfirmationGate> = gate.unwrap_or_else(|| Arc::new(AutoConfirm));

    let discovery_opts = DiscoveryOptions {
        include_patterns: options.include_patterns.clone(),
        exclude_patterns: options.exclude_patterns.clone(),
        ..Default::default()
    };
    let inventory = discover_website(seed_url, &discovery_opts, fetcher).await?;
    info!(count = inventory.len(), "discovery complete");

    if !gate
        .confirm(
            ConfirmationPoint::AfterDiscovery,
            &format!("discovered {} urls", inventory.len()),
        )
        .await
    {
        return Err(LegacyError::custom("discovery not confirmed"));
    }

    let entries = inventory.as_slice();
    let (_, preset_include_step2) = options.analysis_mode.preset(options.max_pages);
    let include_step2 = options.include_step2.unwrap_or(preset_include_step2);
    let selected = select_pages(entries, options.analysis_mode, options.max_pages, &options.focus_areas);
    info!(count = selected.len(), "page selection complete");

    if !gate
        .confirm(
            ConfirmationPoint::AfterSelection,
            &format!("selected {} pages for analysis", selected.len()),
        )
        .await
    {
        return Err(LegacyError::custom("page selection not confirmed"));
    }

    let cost_estimate = estimate_cost(selected.len(), include_step2, options.cost_priority);
    info!(
        estimated_tokens = cost_estimate.estimated_tokens,
        estimated_usd = cost_estimate.estimated_usd,
        "cost estimate ready"
    );

    let metadata = ProjectMetadata {
        project_id: options.project_id.clone(),
        seed_url: seed_url.to_string(),
        domain: entries
            .first()
            .map(|e| e.normalized.domain.clone())
            .unwrap_or_default(),
        created_at: Utc::now(),
        settings: serde_json::json!({
            "analysis_mode": options.analysis_mode,
            "cost_priority": options.cost_priority,
            "include_step2": include_step2,
        }),
        counts: Counts {
            total: selected.len(),
            pending: selected.len(),
            ..Default::default()
        },
        quality_summary: QualitySummary::default(),
    };
    artifacts.write_metadata(&metadata).await?;

    let sessions = Arc::new(SessionManager::new(browser_engine, legacy_browser::DEFAULT_MAX_CONCURRENT_SESSIONS));
    let processor = Arc::new(
        SitePageProcessor::new(sessions, facades, registry, artifacts.clone(), metadata.clone())
            .with_confirmation_gate(gate.clone()),
    );

    let pages: Vec<PageEntry> = selected
        .iter()
        .map(|e| PageEntry {
            page_id: Uuid::new_v4().to_string(),
            url: e.normalized.url.clone(),
        })
        .collect();

    let engine = WorkflowEngine::new(processor, WorkflowOptions::default()).with_artifacts(artifacts.clone());
    let control = engine.control();

    let run_fut = engine.run(pages, resume_from);
    tokio::pin!(run_fut);

    let results = tokio::select! {
        res = &mut run_fut => res?,
        _ = tokio::signal::ctrl_c() => {
            control.stop();
            run_fut.await?
        }
    };

    let final_metadata = summarize(metadata, &results);
    artifacts.write_metadata(&final_metadata).await?;
    let generator = DocGenerator::new(&artifacts);
    generator.regenerate_master_report(&final_metadata).await?;

    Ok(AnalysisResult {
        project_id: options.project_id,
        pages: results,
        cost_estimate,
    })
}

fn summarize(mut metadata: ProjectMetadata, results: &[PageResult]) -> ProjectMetadata {
    let total = results.len();
    let completed = results.iter().filter(|r| r.completed()).count();
    let failed = results.iter().filter(|r| r.failed()).count();
    let skipped = total.saturating_sub(completed + failed);

    let step1_qualities: Vec<f64> = results
        .iter()
        .filter_map(|r| r.step1.ok())
        .map(|s| s.quality.overall)
        .collect();
    let step2_qualities: Vec<f64> = results
        .iter()
        .filter_map(|r| r.step2.ok())
        .map(|s| s.quality_score)
        .collect();

    metadata.counts = Counts {
        total,
        completed,
        failed,
        skipped,
        pending: 0,
        running: 0,
    };
    metadata.quality_summary = QualitySummary {
        average_step1_quality: average(&step1_qualities),
        average_step2_quality: average(&step2_qualities),
        pages_below_threshold: step1_qualities
            .iter()
            .chain(step2_qualities.iter())
            .filter(|q| **q < legacy_intelligence::DEFAULT_MIN_QUALITY)
            .count(),
    };
    metadata
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
