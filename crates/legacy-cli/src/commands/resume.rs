//! `resume` subcommand: continues an interrupted analysis from its last
//! persisted checkpoint (spec §4.11 resume semantics).

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Args;
use legacy_artifacts::ArtifactStore;
use legacy_browser::mock_engine::MockBrowserEngine;
use legacy_browser::BrowserEngine;
use legacy_discovery::ReqwestFetcher;
use legacy_orchestrator::{analyze_legacy_site, AnalysisMode, AnalysisOptions, CostPriority};
use legacy_types::analysis::ProjectMetadata;
use legacy_types::error::LegacyError;

use crate::config::Settings;
use crate::error::ExitCode;

#[derive(Args, Clone, Debug)]
pub struct ResumeArgs {
    /// Project identifier to resume
    #[arg(long)]
    pub project_id: String,
}

pub async fn run(args: ResumeArgs) -> Result<ExitCode> {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return Ok(ExitCode::ConfigError);
        }
    };

    let artifacts = Arc::new(ArtifactStore::new(&settings.project_dir));
    let metadata: ProjectMetadata =
        serde_json::from_slice(&artifacts.read(&artifacts.metadata_path()).await?)?;
    let checkpoint = artifacts.read_checkpoint().await?;

    let mode: AnalysisMode = serde_json::from_value(
        metadata
            .settings
            .get("analysis_mode")
            .cloned()
            .ok_or_else(|| anyhow!("project metadata is missing analysis_mode"))?,
    )?;
    let cost_priority: CostPriority = serde_json::from_value(
        metadata
            .settings
            .get("cost_priority")
            .cloned()
            .ok_or_else(|| anyhow!("project metadata is missing cost_priority"))?,
    )?;

    let mut options = AnalysisOptions::new(args.project_id.clone(), mode);
    options.cost_priority = cost_priority;

    let fetcher = ReqwestFetcher::new();
    let browser_engine: Arc<dyn BrowserEngine> = Arc::new(MockBrowserEngine::new());
    let registry = Arc::new(settings.registry);
    let facades = Arc::new(settings.facades);

    let result = analyze_legacy_site(
        &metadata.seed_url,
        options,
        &fetcher,
        browser_engine,
        facades,
        registry,
        artifacts,
        None,
        Some(checkpoint),
    )
    .await;

    match result {
        Ok(outcome) => {
            println!("resumed analysis: {} pages processed", outcome.pages.len());
            Ok(ExitCode::Success)
        }
        Err(LegacyError::Discovery(err)) => {
            eprintln!("discovery failed: {err}");
            Ok(ExitCode::DiscoveryError)
        }
        Err(err) => {
            eprintln!("resume failed: {err}");
            Ok(ExitCode::TerminalAnalysisError)
        }
    }
}
