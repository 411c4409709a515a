//! `discover` subcommand: runs discovery only (spec §4.2-4.3) and prints
//! the resulting URL inventory, without navigating or analyzing anything.

use anyhow::Result;
use clap::Args;
use legacy_discovery::{discover_website, DiscoveryOptions, ReqwestFetcher};

#[derive(Args, Clone, Debug)]
pub struct DiscoverArgs {
    /// Seed URL to discover from
    pub seed_url: String,

    /// Maximum number of urls to discover
    #[arg(long, default_value = "500")]
    pub max_pages: usize,

    /// Only keep urls matching one of these glob patterns
    #[arg(long = "include")]
    pub include: Vec<String>,

    /// Drop urls matching any of these glob patterns
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Print the discovered urls as a JSON array
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: DiscoverArgs) -> Result<()> {
    let fetcher = ReqwestFetcher::new();
    let opts = DiscoveryOptions {
        max_pages: args.max_pages,
        include_patterns: args.include,
        exclude_patterns: args.exclude,
        ..Default::default()
    };

    let inventory = discover_website(&args.seed_url, &opts, &fetcher).await?;

    if args.json {
        let urls: Vec<&str> = inventory.iter().map(|e| e.normalized.url.as_str()).collect();
        println!("{}", serde_json::to_string_pretty(&urls)?);
        return Ok(());
    }

    println!("discovered {} urls from {}", inventory.len(), args.seed_url);
    for entry in inventory.iter().take(25) {
        println!(
            "  [{:?}] depth {} {}",
            entry.source, entry.depth, entry.normalized.url
        );
    }
    if inventory.len() > 25 {
        println!("  ... and {} more", inventory.len() - 25);
    }

    Ok(())
}
