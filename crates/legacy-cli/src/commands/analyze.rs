//! `analyze` subcommand: the full discover -> select -> analyze -> document
//! pipeline (spec §4.12) against a live site.

use std::io::{self, Write as _};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Args, ValueEnum};
use legacy_artifacts::ArtifactStore;
use legacy_browser::mock_engine::MockBrowserEngine;
use legacy_browser::BrowserEngine;
use legacy_discovery::ReqwestFetcher;
use legacy_orchestrator::{
    analyze_legacy_site, AnalysisMode, AnalysisOptions, ConfirmationGate, ConfirmationPoint,
    CostPriority,
};

use crate::config::Settings;
use crate::error::ExitCode;

/// Mirrors [`AnalysisMode`] for clap parsing; kept separate so the
/// orchestrator crate has no CLI-parsing dependency.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    Quick,
    Recommended,
    Comprehensive,
    Targeted,
}

impl From<ModeArg> for AnalysisMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Quick => AnalysisMode::Quick,
            ModeArg::Recommended => AnalysisMode::Recommended,
            ModeArg::Comprehensive => AnalysisMode::Comprehensive,
            ModeArg::Targeted => AnalysisMode::Targeted,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CostPriorityArg {
    Speed,
    Balanced,
    CostEfficient,
}

impl From<CostPriorityArg> for CostPriority {
    fn from(value: CostPriorityArg) -> Self {
        match value {
            CostPriorityArg::Speed => CostPriority::Speed,
            CostPriorityArg::Balanced => CostPriority::Balanced,
            CostPriorityArg::CostEfficient => CostPriority::CostEfficient,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct AnalyzeArgs {
    /// Seed URL to analyze
    pub seed_url: String,

    /// Project identifier; artifacts are scoped under its project directory
    #[arg(long)]
    pub project_id: String,

    /// Analysis mode preset
    #[arg(long, value_enum, default_value = "recommended")]
    pub mode: ModeArg,

    /// Override the mode preset's page cap
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Token-cost/thoroughness tradeoff
    #[arg(long, value_enum, default_value = "balanced")]
    pub cost_priority: CostPriorityArg,

    /// Prompt for confirmation after discovery, after selection, and
    /// before each page
    #[arg(long)]
    pub interactive: bool,

    /// Only keep urls matching one of these glob patterns
    #[arg(long = "include")]
    pub include: Vec<String>,

    /// Drop urls matching any of these glob patterns
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Keywords that boost a page's selection priority
    #[arg(long = "focus")]
    pub focus: Vec<String>,
}

/// Reads a `y`/`n` answer from stdin. Used only when `--interactive` is
/// set; non-interactive runs use [`legacy_orchestrator::AutoConfirm`].
struct StdinConfirm;

#[async_trait]
impl ConfirmationGate for StdinConfirm {
    async fn confirm(&self, point: ConfirmationPoint, summary: &str) -> bool {
        tokio::task::spawn_blocking({
            let summary = summary.to_string();
            move || {
                print!("{point:?}: {summary} -- continue? [Y/n] ");
                let _ = io::stdout().flush();
                let mut line = String::new();
                if io::stdin().read_line(&mut line).is_err() {
                    return true;
                }
                !matches!(line.trim().to_lowercase().as_str(), "n" | "no")
            }
        })
        .await
        .unwrap_or(true)
    }
}

pub async fn run(args: AnalyzeArgs) -> Result<ExitCode> {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return Ok(ExitCode::ConfigError);
        }
    };

    let fetcher = ReqwestFetcher::new();
    // A real chromium/firefox/webkit driver adapter is outside this
    // engine's scope (the browser is treated as an external capability);
    // `MockBrowserEngine` is the only concrete `BrowserEngine` this
    // workspace ships, and stands in for one here.
    let browser_engine: Arc<dyn BrowserEngine> = Arc::new(MockBrowserEngine::new());
    let artifacts = Arc::new(ArtifactStore::new(&settings.project_dir));
    let registry = Arc::new(settings.registry);
    let facades = Arc::new(settings.facades);

    let mut options = AnalysisOptions::new(args.project_id.clone(), args.mode.into());
    options.max_pages = args.max_pages;
    options.cost_priority = args.cost_priority.into();
    options.interactive_mode = args.interactive;
    options.include_patterns = args.include;
    options.exclude_patterns = args.exclude;
    options.focus_areas = args.focus;

    let gate: Option<Arc<dyn ConfirmationGate>> = if args.interactive {
        Some(Arc::new(StdinConfirm))
    } else {
        None
    };

    // `analyze_legacy_site` already listens for Ctrl+C internally to stop
    // the workflow gracefully and return partial results; this second,
    // independent listener only tracks whether that happened, so the exit
    // code can reflect an interrupted run (spec §6) instead of success.
    let interrupted = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let interrupted_flag = interrupted.clone();
    let watch_signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_flag.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });

    let result = analyze_legacy_site(
        &args.seed_url,
        options,
        &fetcher,
        browser_engine,
        facades,
        registry,
        artifacts,
        gate,
        None,
    )
    .await;
    watch_signal.abort();

    if interrupted.load(std::sync::atomic::Ordering::SeqCst) {
        eprintln!("interrupted, partial results were persisted");
        return Ok(ExitCode::Interrupted);
    }

    match result {
        Ok(outcome) => {
            let failed = outcome.pages.iter().filter(|p| p.failed()).count();
            println!(
                "analyzed {} pages ({} failed), estimated cost ${:.4}",
                outcome.pages.len(),
                failed,
                outcome.cost_estimate.estimated_usd
            );
            if failed > 0 && failed == outcome.pages.len() {
                Ok(ExitCode::TerminalAnalysisError)
            } else {
                Ok(ExitCode::Success)
            }
        }
        Err(legacy_types::error::LegacyError::Discovery(err)) => {
            eprintln!("discovery failed: {err}");
            Ok(ExitCode::DiscoveryError)
        }
        Err(err) => {
            eprintln!("analysis failed: {err}");
            Ok(ExitCode::TerminalAnalysisError)
        }
    }
}
