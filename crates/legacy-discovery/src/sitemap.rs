//! Sitemap and sitemap-index fetching (C2, spec §4.2).

use legacy_types::{DiscoveredUrl, NormalizedUrl, UrlSource};
use tracing::{debug, warn};
use xml::reader::{EventReader, XmlEvent};

use crate::fetcher::HttpFetcher;

const MAX_INDEX_DEPTH: u32 = 3;

/// Fetches each sitemap url, recursing into `<sitemapindex>` entries up to
/// `MAX_INDEX_DEPTH`, and returns the discovered page urls. `lastmod` is
/// ignored per §4.2.
pub async fn fetch_sitemaps(urls: &[String], fetcher: &dyn HttpFetcher) -> Vec<NormalizedUrl> {
    let mut out = Vec::new();
    let mut seen_sitemaps = std::collections::HashSet::new();
    for url in urls {
        fetch_one(url, fetcher, 0, &mut out, &mut seen_sitemaps).await;
    }
    out
}

/// Boxed-future recursion: `async fn` cannot call itself directly because the
/// compiler would need an infinitely-sized future, so the recursive case is
/// driven through a `Pin<Box<dyn Future>>`.
fn fetch_one<'a>(
    url: &'a str,
    fetcher: &'a dyn HttpFetcher,
    depth: u32,
    out: &'a mut Vec<NormalizedUrl>,
    seen: &'a mut std::collections::HashSet<String>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        if depth > MAX_INDEX_DEPTH || !seen.insert(url.to_string()) {
            return;
        }
        let body = match fetcher.get(url).await {
            Ok(b) if b.status < 400 => b,
            Ok(b) => {
                warn!(%url, status = b.status, "sitemap fetch returned error status");
                return;
            }
            Err(e) => {
                warn!(%url, error = %e, "sitemap fetch failed");
                return;
            }
        };

        let parsed = parse_sitemap(&body.body);
        debug!(%url, count = parsed.locs.len(), is_index = parsed.is_index, "parsed sitemap");

        if parsed.is_index {
            for loc in parsed.locs {
                fetch_one(&loc, fetcher, depth + 1, out, seen).await;
            }
        } else {
            for loc in parsed.locs {
                if let Ok(normalized) = legacy_url::normalize(&loc) {
                    out.push(normalized);
                }
            }
        }
    })
}

struct ParsedSitemap {
    is_index: bool,
    locs: Vec<String>,
}

/// Streams a sitemap or sitemap-index document, collecting `<loc>` element
/// text and noting whether the root element is `<sitemapindex>`.
fn parse_sitemap(xml: &str) -> ParsedSitemap {
    let mut locs = Vec::new();
    let mut is_index = false;
    let mut seen_root = false;
    let mut in_loc = false;

    for event in EventReader::from_str(xml) {
        match event {
            Ok(XmlEvent::StartElement { name, .. }) => {
                if !seen_root {
                    is_index = name.local_name == "sitemapindex";
                    seen_root = true;
                }
                in_loc = name.local_name == "loc";
            }
            Ok(XmlEvent::Characters(data)) if in_loc => {
                locs.push(data.trim().to_string());
            }
            Ok(XmlEvent::EndElement { name }) if name.local_name == "loc" => {
                in_loc = false;
            }
            Err(err) => {
                warn!(error = %err, "malformed sitemap xml, stopping parse");
                break;
            }
            _ => {}
        }
    }

    ParsedSitemap { is_index, locs }
}

/// Marker wrapper for sitemap-discovered urls carrying their provenance
/// (plain sitemap vs. one discovered via robots.txt's `Sitemap:` directive).
pub fn to_discovered(urls: Vec<NormalizedUrl>, source: UrlSource) -> Vec<DiscoveredUrl> {
    urls.into_iter()
        .map(|normalized| DiscoveredUrl {
            normalized,
            source,
            depth: 0,
            internal: true,
            is_asset: false,
            title: None,
            description: None,
            complexity_estimate: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchedBody;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapFetcher(Mutex<HashMap<String, FetchedBody>>);

    #[async_trait::async_trait]
    impl HttpFetcher for MapFetcher {
        async fn get(&self, url: &str) -> Result<FetchedBody, String> {
            self.0
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| "not found".to_string())
        }
    }

    #[test]
    fn parse_sitemap_parses_flat_locs() {
        let xml = "<urlset><url><loc>https://example.com/a</loc></url><url><loc>https://example.com/b</loc></url></urlset>";
        let parsed = parse_sitemap(xml);
        assert!(!parsed.is_index);
        assert_eq!(parsed.locs, vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[test]
    fn parse_sitemap_detects_index_root() {
        let xml = "<sitemapindex><sitemap><loc>https://example.com/sitemap1.xml</loc></sitemap></sitemapindex>";
        let parsed = parse_sitemap(xml);
        assert!(parsed.is_index);
        assert_eq!(parsed.locs, vec!["https://example.com/sitemap1.xml"]);
    }

    #[tokio::test]
    async fn recurses_into_sitemap_index() {
        let mut map = HashMap::new();
        map.insert(
            "https://example.com/sitemap_index.xml".to_string(),
            FetchedBody {
                status: 200,
                body: "<sitemapindex><sitemap><loc>https://example.com/sitemap1.xml</loc></sitemap></sitemapindex>".to_string(),
            },
        );
        map.insert(
            "https://example.com/sitemap1.xml".to_string(),
            FetchedBody {
                status: 200,
                body: "<urlset><url><loc>https://example.com/page</loc></url></urlset>"
                    .to_string(),
            },
        );
        let fetcher = MapFetcher(Mutex::new(map));
        let urls = fetch_sitemaps(
            &["https://example.com/sitemap_index.xml".to_string()],
            &fetcher,
        )
        .await;
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].url, "https://example.com/page");
    }
}
