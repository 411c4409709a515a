//! Robots.txt analysis (C2, spec §4.2). A missing robots.txt is not an error —
//! it yields an empty result.

use robotstxt::DefaultMatcher;

use crate::fetcher::HttpFetcher;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsResult {
    pub robots_txt: String,
    pub sitemap_urls: Vec<String>,
}

/// Fetches `<root>/robots.txt`. Any fetch failure (404, network error)
/// yields `RobotsResult::default()` rather than an error, per §4.2. The raw
/// body is kept as-is; Disallow/Allow matching happens later, per-url, via
/// [`is_allowed`].
pub async fn analyze_robots(root: &str, fetcher: &dyn HttpFetcher) -> RobotsResult {
    let robots_url = format!("{}/robots.txt", root.trim_end_matches('/'));
    match fetcher.get(&robots_url).await {
        Ok(body) if body.status < 400 => RobotsResult {
            sitemap_urls: extract_sitemaps(&body.body),
            robots_txt: body.body,
        },
        _ => RobotsResult::default(),
    }
}

/// Collects `Sitemap:` directive values. These are global per the robots.txt
/// spec regardless of which `User-agent` block they appear under, so unlike
/// `Disallow` matching this needs no block grouping, just the directive
/// lines themselves.
fn extract_sitemaps(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or("").trim();
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case("sitemap").then(|| value.trim().to_string())
        })
        .collect()
}

/// Whether `user_agent` may fetch `url` under `robots_txt`, applying
/// Disallow/Allow precedence and wildcard matching per Google's robots.txt
/// reference matcher rather than a hand-rolled equivalent.
pub fn is_allowed(robots_txt: &str, user_agent: &str, url: &str) -> bool {
    let mut matcher = DefaultMatcher::default();
    matcher.one_agent_allowed_by_robots(robots_txt, user_agent, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
User-agent: Googlebot
Disallow: /private

User-agent: *
Disallow: /admin
Disallow: /tmp
Sitemap: https://example.com/sitemap.xml
";

    #[test]
    fn wildcard_block_disallow_is_honored() {
        assert!(!is_allowed(SAMPLE, "AnyBot", "https://example.com/admin/page"));
        assert!(!is_allowed(SAMPLE, "AnyBot", "https://example.com/tmp/file"));
        assert!(is_allowed(SAMPLE, "AnyBot", "https://example.com/public"));
    }

    #[test]
    fn sitemap_directives_are_collected_globally() {
        assert_eq!(extract_sitemaps(SAMPLE), vec!["https://example.com/sitemap.xml"]);
    }

    #[test]
    fn empty_text_allows_everything() {
        assert!(is_allowed("", "AnyBot", "https://example.com/anything"));
        assert_eq!(extract_sitemaps(""), Vec::<String>::new());
    }

    struct Always404;
    #[async_trait::async_trait]
    impl HttpFetcher for Always404 {
        async fn get(&self, _url: &str) -> Result<crate::fetcher::FetchedBody, String> {
            Ok(crate::fetcher::FetchedBody {
                status: 404,
                body: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn missing_robots_is_not_an_error() {
        let result = analyze_robots("https://example.com", &Always404).await;
        assert_eq!(result, RobotsResult::default());
    }
}
