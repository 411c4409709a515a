//! Page capture data model (§3: PageSnapshot, NetworkLog, NetworkEvent).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEvent {
    pub ts: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    pub req_headers: HashMap<String, String>,
    pub resp_headers: HashMap<String, String>,
    #[serde(default)]
    pub req_body: Option<String>,
    pub resp_size: u64,
    pub timing_ms: u64,
    pub is_third_party: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkLog {
    pub events: Vec<NetworkEvent>,
}

impl NetworkLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: NetworkEvent) {
        self.events.push(event);
    }

    /// Events whose response looks like an API call: JSON/XML content-type or a
    /// path matching `/api/`, `/graphql`, or `/v\d+/`.
    pub fn api_endpoints(&self) -> Vec<&NetworkEvent> {
        self.events
            .iter()
            .filter(|e| Self::looks_like_api(e))
            .collect()
    }

    fn looks_like_api(e: &NetworkEvent) -> bool {
        let content_type = e
            .resp_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.to_ascii_lowercase())
            .unwrap_or_default();
        if content_type.contains("json") || content_type.contains("xml") {
            return true;
        }
        let path = &e.url;
        path.contains("/api/")
            || path.contains("/graphql")
            || Self::matches_versioned_path(path)
    }

    fn matches_versioned_path(path: &str) -> bool {
        // matches `/v<digits>/` without pulling in `regex` for a single check.
        let bytes = path.as_bytes();
        let mut i = 0;
        while i + 1 < bytes.len() {
            if bytes[i] == b'/' && bytes[i + 1] == b'v' {
                let mut j = i + 2;
                let start = j;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j > start && j < bytes.len() && bytes[j] == b'/' {
                    return true;
                }
            }
            i += 1;
        }
        false
    }

    /// Third-party events grouped by host of the request url. Registrable-domain
    /// classification itself lives in `legacy-url`; this is a cheap regrouping
    /// over events already tagged `is_third_party` by the navigator.
    pub fn third_parties(&self) -> Vec<(String, Vec<&NetworkEvent>)> {
        let mut groups: Vec<(String, Vec<&NetworkEvent>)> = Vec::new();
        for e in self.events.iter().filter(|e| e.is_third_party) {
            let host = e
                .url
                .split("://")
                .nth(1)
                .and_then(|rest| rest.split('/').next())
                .unwrap_or(&e.url)
                .to_string();
            if let Some((_, bucket)) = groups.iter_mut().find(|(d, _)| *d == host) {
                bucket.push(e);
            } else {
                groups.push((host, vec![e]));
            }
        }
        groups
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomStats {
    pub node_count: usize,
    pub form_count: usize,
    pub link_count: usize,
    pub script_count: usize,
    pub image_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechSignals {
    pub frameworks: Vec<String>,
    pub analytics: Vec<String>,
    pub generator: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionStep {
    pub selector: String,
    pub action: String,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub final_url: String,
    pub status_code: u16,
    pub title: String,
    pub html: String,
    pub visible_text: String,
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub screenshot: Option<Vec<u8>>,
    pub network: NetworkLog,
    pub dom_stats: DomStats,
    pub tech_signals: TechSignals,
    #[serde(default)]
    pub interaction_log: Option<Vec<InteractionStep>>,
    pub load_time_ms: u64,
}
