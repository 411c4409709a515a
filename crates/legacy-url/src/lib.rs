//! URL parsing, normalization, classification and slugification (C1, spec §4.1).
//!
//! Deliberately does not resolve percent-encoding and does not consult a full
//! public-suffix list — see `DESIGN.md` for the reasoning behind both
//! simplifications.

use std::collections::HashMap;
use std::sync::Mutex;

use legacy_types::{InvalidUrlError, NormalizedUrl};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

/// File extensions treated as static assets (§4.1).
const ASSET_SUFFIXES: &[&str] = &[
    "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "woff", "woff2", "ttf", "map", "pdf",
];

/// Multi-label public-suffix exceptions. Not an exhaustive PSL; covers the
/// common two-label ccTLD suffixes so `is_internal` behaves sanely for sites
/// under them. Anything not listed here falls back to a last-two-labels
/// heuristic.
const MULTI_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "co.jp", "co.nz",
    "co.za", "com.br", "com.cn",
];

/// Normalizes a raw URL string per §4.1: requires `http`/`https` scheme and a
/// non-empty host, lowercases scheme and host, strips any fragment, preserves
/// the query string, and does not resolve percent-encoding.
pub fn normalize(raw: &str) -> Result<NormalizedUrl, InvalidUrlError> {
    let mut parsed =
        url::Url::parse(raw).map_err(|e| InvalidUrlError::ParseFailure(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(InvalidUrlError::UnsupportedScheme(other.to_string())),
    }

    if parsed.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(InvalidUrlError::EmptyHost);
    }

    parsed.set_fragment(None);
    let scheme = parsed.scheme().to_ascii_lowercase();
    let host = parsed.host_str().unwrap().to_ascii_lowercase();
    let path = parsed.path().to_string();
    let query = parsed.query().map(|q| format!("?{q}")).unwrap_or_default();
    let domain = registrable_domain(&host);

    let port_part = match (scheme.as_str(), parsed.port()) {
        ("http", Some(80)) | ("https", Some(443)) | (_, None) => String::new(),
        (_, Some(p)) => format!(":{p}"),
    };

    let url = format!("{scheme}://{host}{port_part}{path}{query}");

    Ok(NormalizedUrl {
        url,
        scheme,
        host,
        path,
        domain,
    })
}

/// Computes the registrable domain of a host: the apex domain used to decide
/// internal vs. external links. See `MULTI_LABEL_SUFFIXES` for the known
/// multi-label exceptions this accounts for.
pub fn registrable_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host.to_string();
    }
    for n in 1..=2 {
        if labels.len() > n {
            let candidate = labels[labels.len() - n..].join(".");
            if MULTI_LABEL_SUFFIXES.contains(&candidate.as_str()) && labels.len() > n {
                return labels[labels.len() - n - 1..].join(".");
            }
        }
    }
    labels[labels.len() - 2..].join(".")
}

/// Best-effort registrable domain of a full URL string (used outside the
/// normalization path, e.g. when classifying already-captured network events).
pub fn registrable_domain_of(raw_url: &str) -> Option<String> {
    let host = url::Url::parse(raw_url).ok()?.host_str()?.to_ascii_lowercase();
    Some(registrable_domain(&host))
}

/// `true` if `u`'s registrable domain matches the seed's.
pub fn is_internal(u: &NormalizedUrl, root_domain: &str) -> bool {
    u.domain.eq_ignore_ascii_case(root_domain)
}

/// `true` if `u`'s path ends with a recognized static-asset extension.
pub fn is_asset(u: &NormalizedUrl) -> bool {
    let path = u.path.to_ascii_lowercase();
    ASSET_SUFFIXES
        .iter()
        .any(|ext| path.ends_with(&format!(".{ext}")))
}

const MAX_SLUG_LEN: usize = 120;
const HASH_SUFFIX_LEN: usize = 6;

/// Registry used to resolve slug collisions deterministically across calls
/// within a process (§4.1: "collisions resolved with a 6-char suffix of a
/// stable hash of the full url").
static SLUG_REGISTRY: Lazy<Mutex<HashMap<String, String>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Produces a filesystem-safe identifier derived from `host + path`, capped
/// at 120 characters, with deterministic collision resolution.
pub fn slugify(u: &NormalizedUrl) -> String {
    let raw = format!("{}{}", u.host, u.path);
    let mut slug: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    let slug = slug.trim_matches('-').to_string();
    let slug = if slug.is_empty() {
        "root".to_string()
    } else {
        slug
    };
    let base = truncate_chars(&slug, MAX_SLUG_LEN);

    let mut registry = SLUG_REGISTRY.lock().expect("slug registry poisoned");
    if let Some(existing_url) = registry.get(&base) {
        if existing_url == &u.url {
            return base;
        }
        let suffixed = format!(
            "{}-{}",
            truncate_chars(&base, MAX_SLUG_LEN - HASH_SUFFIX_LEN - 1),
            hash_suffix(&u.url)
        );
        registry.insert(suffixed.clone(), u.url.clone());
        suffixed
    } else {
        registry.insert(base.clone(), u.url.clone());
        base
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn hash_suffix(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, HASH_SUFFIX_LEN)
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    let mut out = String::with_capacity(len);
    for b in bytes {
        if out.len() >= len {
            break;
        }
        out.push_str(&format!("{b:02x}"));
    }
    out.truncate(len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_scheme_and_host_and_strips_fragment() {
        let n = normalize("HTTPS://Example.COM/Path?x=1#frag").unwrap();
        assert_eq!(n.scheme, "https");
        assert_eq!(n.host, "example.com");
        assert_eq!(n.url, "https://example.com/Path?x=1");
    }

    #[test]
    fn normalize_is_idempotent() {
        let first = normalize("https://Example.com/a/b?q=1").unwrap();
        let second = normalize(&first.url).unwrap();
        assert_eq!(first.url, second.url);
    }

    #[test]
    fn normalize_rejects_non_http_scheme() {
        let err = normalize("ftp://example.com/").unwrap_err();
        assert!(matches!(err, InvalidUrlError::UnsupportedScheme(_)));
    }

    #[test]
    fn normalize_rejects_empty_host() {
        let err = normalize("file:///etc/passwd");
        assert!(err.is_err());
    }

    #[test]
    fn registrable_domain_handles_multi_label_suffix() {
        assert_eq!(registrable_domain("www.example.co.uk"), "example.co.uk");
        assert_eq!(registrable_domain("example.com"), "example.com");
        assert_eq!(registrable_domain("a.b.example.com"), "example.com");
    }

    #[test]
    fn is_internal_compares_registrable_domain() {
        let u = normalize("https://blog.example.com/post").unwrap();
        assert!(is_internal(&u, "example.com"));
        assert!(!is_internal(&u, "other.com"));
    }

    #[test]
    fn is_asset_matches_known_suffixes() {
        let u = normalize("https://example.com/static/app.js").unwrap();
        assert!(is_asset(&u));
        let u = normalize("https://example.com/about").unwrap();
        assert!(!is_asset(&u));
    }

    #[test]
    fn slugify_is_deterministic_and_safe() {
        let u = normalize("https://example.com/a/b?x=1").unwrap();
        let slug = slugify(&u);
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        assert!(slug.len() <= MAX_SLUG_LEN);
    }

    #[test]
    fn slugify_resolves_collisions_with_hash_suffix() {
        let a = NormalizedUrl {
            url: "https://example.com/page?id=1".to_string(),
            scheme: "https".to_string(),
            host: "example.com".to_string(),
            path: "/page".to_string(),
            domain: "example.com".to_string(),
        };
        let b = NormalizedUrl {
            url: "https://example.com/page?id=2".to_string(),
            ..a.clone()
        };
        let slug_a = slugify(&a);
        let slug_b = slugify(&b);
        assert_ne!(slug_a, slug_b);
        assert_eq!(slugify(&a), slug_a, "re-slugifying the same url is stable");
    }
}
