//! `status` subcommand: reports progress for a project's analysis run
//! (spec §4.11 progress reporting) from its persisted artifacts.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use legacy_artifacts::ArtifactStore;
use legacy_types::analysis::ProjectMetadata;

#[derive(Args, Clone, Debug)]
pub struct StatusArgs {
    /// Project directory whose artifacts to report on
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Print the full metadata document as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: StatusArgs) -> Result<()> {
    let artifacts = ArtifactStore::new(&args.project_dir);
    let metadata: ProjectMetadata =
        serde_json::from_slice(&artifacts.read(&artifacts.metadata_path()).await?)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("project {} ({})", metadata.project_id, metadata.seed_url);
    println!(
        "  pages: {} total, {} completed, {} failed, {} skipped, {} pending",
        metadata.counts.total,
        metadata.counts.completed,
        metadata.counts.failed,
        metadata.counts.skipped,
        metadata.counts.pending
    );
    println!(
        "  quality: step1 avg {:.2}, step2 avg {:.2}, {} pages below threshold",
        metadata.quality_summary.average_step1_quality,
        metadata.quality_summary.average_step2_quality,
        metadata.quality_summary.pages_below_threshold
    );

    if let Ok(checkpoint) = artifacts.read_checkpoint().await {
        println!(
            "  checkpoint: {} completed, {} pending, {} failed, {} skipped (as of {})",
            checkpoint.completed_pages.len(),
            checkpoint.pending_pages.len(),
            checkpoint.failed_pages.len(),
            checkpoint.skipped_pages.len(),
            checkpoint.created_at
        );
    }

    Ok(())
}
