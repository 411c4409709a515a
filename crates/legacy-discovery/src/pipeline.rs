//! Discovery pipeline (C3, spec §4.3): composes robots/sitemap/crawl into a
//! ranked, classified `UrlInventory`.

use legacy_types::{DiscoveredUrl, DiscoveryError, UrlInventory, UrlSource};
use tracing::{info, instrument, warn};

use crate::crawl::{self, CrawlOptions};
use crate::fetcher::HttpFetcher;
use crate::filters::{self, FilterMode};
use crate::robots;
use crate::sitemap;

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub max_depth: u32,
    pub max_pages: usize,
    pub min_sitemap_pages: usize,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub filter_mode: FilterMode,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 500,
            min_sitemap_pages: 5,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            filter_mode: FilterMode::Exclude,
        }
    }
}

/// Runs the full discovery pipeline for `seed`: robots -> sitemaps (explicit
/// default location plus any discovered via robots.txt) -> crawl as a
/// fallback when sitemap yield is below `min_sitemap_pages`.
#[instrument(skip(fetcher, opts), fields(seed = %seed))]
pub async fn discover_website(
    seed: &str,
    opts: &DiscoveryOptions,
    fetcher: &dyn HttpFetcher,
) -> Result<UrlInventory, DiscoveryError> {
    let seed_normalized =
        legacy_url::normalize(seed).map_err(|e| DiscoveryError::CrawlFailed {
            root: seed.to_string(),
            message: e.to_string(),
        })?;
    let root = format!("{}://{}", seed_normalized.scheme, seed_normalized.host);

    let robots_result = robots::analyze_robots(&root, fetcher).await;

    let mut sitemap_urls = robots_result.sitemap_urls.clone();
    let default_sitemap = format!("{root}/sitemap.xml");
    if !sitemap_urls.contains(&default_sitemap) {
        sitemap_urls.push(default_sitemap);
    }

    let discovered_from_sitemap = sitemap::fetch_sitemaps(&sitemap_urls, fetcher).await;
    info!(count = discovered_from_sitemap.len(), "sitemap discovery complete");

    let mut entries: Vec<DiscoveredUrl> = discovered_from_sitemap
        .iter()
        .map(|normalized| DiscoveredUrl {
            internal: legacy_url::is_internal(normalized, &seed_normalized.domain),
            is_asset: legacy_url::is_asset(normalized),
            normalized: normalized.clone(),
            source: UrlSource::Sitemap,
            depth: 0,
            title: None,
            description: None,
            complexity_estimate: None,
        })
        .collect();

    if discovered_from_sitemap.len() < opts.min_sitemap_pages {
        warn!(
            sitemap_pages = discovered_from_sitemap.len(),
            min = opts.min_sitemap_pages,
            "sitemap yield below threshold, augmenting with crawl"
        );
        let crawl_opts = CrawlOptions {
            max_depth: opts.max_depth,
            max_pages: opts.max_pages,
            respect_disallow: true,
        };
        let crawled = crawl::crawl(seed, &crawl_opts, &robots_result.robots_txt, fetcher).await;
        entries.extend(crawled.into_iter().map(|normalized| DiscoveredUrl {
            internal: legacy_url::is_internal(&normalized, &seed_normalized.domain),
            is_asset: legacy_url::is_asset(&normalized),
            normalized,
            source: UrlSource::Crawl,
            depth: 0,
            title: None,
            description: None,
            complexity_estimate: None,
        }));
    }

    if entries.is_empty() {
        entries.push(DiscoveredUrl {
            internal: true,
            is_asset: legacy_url::is_asset(&seed_normalized),
            normalized: seed_normalized.clone(),
            source: UrlSource::Seed,
            depth: 0,
            title: None,
            description: None,
            complexity_estimate: None,
        });
    }

    for entry in entries.iter_mut() {
        enrich(entry);
    }

    let mut inventory = UrlInventory::new();
    for entry in entries {
        inventory.insert(entry);
    }

    let filtered = apply_filters(inventory, opts);

    if filtered.is_empty() {
        return Err(DiscoveryError::EmptyInventory {
            seed: seed.to_string(),
        });
    }

    Ok(filtered)
}

/// Complexity estimate: integer 1-10 derived from path depth and query
/// parameter count, plus an asset bump (§4.3).
fn enrich(entry: &mut DiscoveredUrl) {
    let depth = entry
        .normalized
        .path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .count();
    let query_params = entry
        .normalized
        .url
        .split_once('?')
        .map(|(_, q)| q.split('&').filter(|s| !s.is_empty()).count())
        .unwrap_or(0);
    let mut score = 1 + depth as u32 + query_params as u32;
    if entry.is_asset {
        score += 1;
    }
    entry.complexity_estimate = Some(score.clamp(1, 10) as u8);
}

fn apply_filters(inventory: UrlInventory, opts: &DiscoveryOptions) -> UrlInventory {
    if opts.include_patterns.is_empty() && opts.exclude_patterns.is_empty() {
        return inventory;
    }
    let mut out = UrlInventory::new();
    for entry in inventory.into_vec() {
        if filters::passes_filters(
            &entry.normalized.path,
            &opts.include_patterns,
            &opts.exclude_patterns,
            opts.filter_mode,
        ) {
            out.insert(entry);
        }
    }
    out
}
