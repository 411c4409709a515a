//! Breadth-first same-domain crawler, used as a fallback/augmentation when
//! sitemaps yield too few pages (C2, spec §4.2).

use std::collections::{HashSet, VecDeque};

use legacy_types::NormalizedUrl;
use scraper::{Html, Selector};
use tracing::debug;

use crate::fetcher::{HttpFetcher, USER_AGENT};
use crate::robots;

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub max_depth: u32,
    pub max_pages: usize,
    pub respect_disallow: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 200,
            respect_disallow: true,
        }
    }
}

/// Breadth-first crawl of `root`, staying on the same registrable domain,
/// skipping asset urls and respecting `robots_txt` when `respect_disallow`
/// is set. Returns normalized, deduplicated, fragment-free urls in
/// discovery order.
pub async fn crawl(
    root: &str,
    opts: &CrawlOptions,
    robots_txt: &str,
    fetcher: &dyn HttpFetcher,
) -> Vec<NormalizedUrl> {
    let Ok(root_normalized) = legacy_url::normalize(root) else {
        return Vec::new();
    };
    let root_domain = root_normalized.domain.clone();

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(NormalizedUrl, u32)> = VecDeque::new();
    let mut results: Vec<NormalizedUrl> = Vec::new();

    visited.insert(root_normalized.url.clone());
    queue.push_back((root_normalized, 0));

    let link_selector = Selector::parse("a[href]").expect("static selector parses");

    while let Some((current, depth)) = queue.pop_front() {
        if results.len() >= opts.max_pages {
            break;
        }
        results.push(current.clone());

        if depth >= opts.max_depth {
            continue;
        }

        let body = match fetcher.get(&current.url).await {
            Ok(b) if b.status < 400 => b.body,
            _ => continue,
        };

        let doc = Html::parse_document(&body);
        for elem in doc.select(&link_selector) {
            let Some(href) = elem.value().attr("href") else {
                continue;
            };
            let Ok(absolute) = resolve(&current.url, href) else {
                continue;
            };
            let Ok(normalized) = legacy_url::normalize(&absolute) else {
                continue;
            };
            if normalized.domain != root_domain {
                continue;
            }
            if legacy_url::is_asset(&normalized) {
                continue;
            }
            if opts.respect_disallow && !robots::is_allowed(robots_txt, USER_AGENT, &normalized.url) {
                continue;
            }
            if visited.insert(normalized.url.clone()) {
                debug!(url = %normalized.url, depth = depth + 1, "crawl frontier push");
                queue.push_back((normalized, depth + 1));
            }
            if visited.len() >= opts.max_pages {
                break;
            }
        }
    }

    results
}

fn resolve(base: &str, href: &str) -> Result<String, url::ParseError> {
    let base = url::Url::parse(base)?;
    let joined = base.join(href)?;
    Ok(joined.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchedBody;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapFetcher(Mutex<HashMap<String, String>>);

    #[async_trait::async_trait]
    impl HttpFetcher for MapFetcher {
        async fn get(&self, url: &str) -> Result<FetchedBody, String> {
            self.0
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .map(|body| FetchedBody { status: 200, body })
                .ok_or_else(|| "missing".to_string())
        }
    }

    #[tokio::test]
    async fn crawl_stays_on_domain_and_dedupes() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://example.com/".to_string(),
            r#"<a href="/about">about</a><a href="https://other.com/x">external</a><a href="/about">dup</a>"#.to_string(),
        );
        pages.insert("https://example.com/about".to_string(), "<p>about</p>".to_string());
        let fetcher = MapFetcher(Mutex::new(pages));

        let urls = crawl("https://example.com/", &CrawlOptions::default(), "", &fetcher).await;

        let hosts: Vec<&str> = urls.iter().map(|u| u.host.as_str()).collect();
        assert!(hosts.iter().all(|h| *h == "example.com"));
        assert_eq!(urls.len(), 2);
    }

    #[tokio::test]
    async fn crawl_respects_disallow_patterns() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://example.com/".to_string(),
            r#"<a href="/admin/secret">nope</a><a href="/public">ok</a>"#.to_string(),
        );
        pages.insert("https://example.com/public".to_string(), "<p>ok</p>".to_string());
        let fetcher = MapFetcher(Mutex::new(pages));
        let robots_txt = "User-agent: *\nDisallow: /admin\n";

        let urls = crawl("https://example.com/", &CrawlOptions::default(), robots_txt, &fetcher).await;

        assert!(urls.iter().all(|u| !u.path.starts_with("/admin")));
    }

    #[tokio::test]
    async fn crawl_respects_max_pages() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://example.com/".to_string(),
            r#"<a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>"#.to_string(),
        );
        let fetcher = MapFetcher(Mutex::new(pages));
        let opts = CrawlOptions {
            max_pages: 2,
            ..Default::default()
        };
        let urls = crawl("https://example.com/", &opts, "", &fetcher).await;
        assert_eq!(urls.len(), 2);
    }
}
