//! URL-related data model (§3: NormalizedURL, DiscoveredURL, URLInventory).

use serde::{Deserialize, Serialize};

/// A URL that has passed through [`crate::url_types`] normalization rules.
///
/// Invariant: `url == format!("{scheme}://{host}{path}")` (plus query, if any).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NormalizedUrl {
    pub url: String,
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub domain: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum UrlSource {
    Sitemap,
    RobotsSitemap,
    Crawl,
    Seed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredUrl {
    pub normalized: NormalizedUrl,
    pub source: UrlSource,
    pub depth: u32,
    pub internal: bool,
    pub is_asset: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub complexity_estimate: Option<u8>,
}

impl DiscoveredUrl {
    pub fn key(&self) -> &str {
        &self.normalized.url
    }
}

/// Ordered, deduplicated set of [`DiscoveredUrl`], first-seen order preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlInventory {
    entries: Vec<DiscoveredUrl>,
}

impl UrlInventory {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Inserts `entry` if its key is not already present. Returns `true` if inserted.
    pub fn insert(&mut self, entry: DiscoveredUrl) -> bool {
        if self.entries.iter().any(|e| e.key() == entry.key()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredUrl> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<DiscoveredUrl> {
        self.entries
    }

    pub fn as_slice(&self) -> &[DiscoveredUrl] {
        &self.entries
    }

    /// Groups entries by `(internal, is_asset)`, preserving first-seen order within groups.
    pub fn grouped(&self) -> Vec<((bool, bool), Vec<&DiscoveredUrl>)> {
        let mut groups: Vec<((bool, bool), Vec<&DiscoveredUrl>)> = Vec::new();
        for entry in &self.entries {
            let key = (entry.internal, entry.is_asset);
            if let Some((_, bucket)) = groups.iter_mut().find(|(k, _)| *k == key) {
                bucket.push(entry);
            } else {
                groups.push((key, vec![entry]));
            }
        }
        groups
    }
}
