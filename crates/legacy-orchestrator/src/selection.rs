//! Priority-based page selection (spec §4.12 phase 2).

use legacy_types::url_types::DiscoveredUrl;

use crate::mode::AnalysisMode;

/// score = weighted sum of (journey-stage proxy from path depth, complexity
/// estimate, path-depth closeness to root, keyword match to focus areas).
/// Journey stage itself isn't known until Step 1 runs, so selection uses
/// path depth as a cheap proxy (shallower pages are more likely entry
/// points), matching the spec's intent without requiring an analysis pass
/// before page selection.
fn score(entry: &DiscoveredUrl, focus_areas: &[String]) -> f64 {
    let depth = entry
        .normalized
        .path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .count();
    let depth_closeness = 1.0 / (1.0 + depth as f64);
    let complexity = entry.complexity_estimate.unwrap_or(5) as f64 / 10.0;

    let keyword_match = if focus_areas.is_empty() {
        0.0
    } else {
        let path_lower = entry.normalized.path.to_ascii_lowercase();
        let hits = focus_areas
            .iter()
            .filter(|area| path_lower.contains(&area.to_ascii_lowercase()))
            .count();
        hits as f64 / focus_areas.len() as f64
    };

    0.4 * depth_closeness + 0.3 * complexity + 0.3 * keyword_match
}

/// Selects up to `max_pages` internal, non-asset pages ordered by score
/// descending, ties broken by discovery order (stable sort preserves
/// insertion order for equal scores).
pub fn select_pages<'a>(
    entries: &'a [DiscoveredUrl],
    mode: AnalysisMode,
    caller_max_pages: Option<usize>,
    focus_areas: &[String],
) -> Vec<&'a DiscoveredUrl> {
    let (max_pages, _) = mode.preset(caller_max_pages);

    let mut candidates: Vec<(&DiscoveredUrl, f64)> = entries
        .iter()
        .filter(|e| e.internal && !e.is_asset)
        .map(|e| (e, score(e, focus_areas)))
        .collect();

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    candidates.into_iter().take(max_pages).map(|(e, _)| e).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacy_types::url_types::{NormalizedUrl, UrlSource};

    fn entry(path: &str, complexity: u8) -> DiscoveredUrl {
        DiscoveredUrl {
            normalized: NormalizedUrl {
                url: format!("https://example.com{path}"),
                scheme: "https".to_string(),
                host: "example.com".to_string(),
                path: path.to_string(),
                domain: "example.com".to_string(),
            },
            source: UrlSource::Crawl,
            depth: 0,
            internal: true,
            is_asset: false,
            title: None,
            description: None,
            complexity_estimate: Some(complexity),
        }
    }

    #[test]
    fn shallow_pages_rank_above_deep_ones_at_equal_complexity() {
        let entries = vec![entry("/a/b/c", 5), entry("/", 5)];
        let selected = select_pages(&entries, AnalysisMode::Quick, None, &[]);
        assert_eq!(selected[0].normalized.path, "/");
    }

    #[test]
    fn respects_mode_max_pages_cap() {
        let entries: Vec<_> = (0..20).map(|i| entry(&format!("/p{i}"), 5)).collect();
        let selected = select_pages(&entries, AnalysisMode::Quick, None, &[]);
        assert_eq!(selected.len(), 10);
    }

    #[test]
    fn assets_and_external_entries_are_excluded() {
        let mut asset = entry("/logo.png", 1);
        asset.is_asset = true;
        let entries = vec![asset, entry("/home", 5)];
        let selected = select_pages(&entries, AnalysisMode::Quick, None, &[]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].normalized.path, "/home");
    }

    #[test]
    fn focus_area_keyword_match_boosts_score() {
        let entries = vec![entry("/checkout", 5), entry("/about", 5)];
        let selected = select_pages(&entries, AnalysisMode::Quick, None, &["checkout".to_string()]);
        assert_eq!(selected[0].normalized.path, "/checkout");
    }
}
