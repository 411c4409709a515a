//! Page navigation and capture (C5, spec §4.5).

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use legacy_types::{
    DomStats, InteractionStep, NavigationError, NetworkEvent, NetworkLog, PageSnapshot,
    TechSignals,
};
use tracing::{instrument, warn};

use crate::engine::{InteractionAction, RawNetworkExchange};
use crate::pool::Session;

/// Destructive-action deny-list for interaction capture (spec §4.5, fixed as
/// authoritative per §9 Open Questions).
const DENY_KEYWORDS: &[&str] = &["delete", "remove", "cancel", "logout"];

#[derive(Debug, Clone)]
pub struct NavigateOptions {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub wait_for_network_idle: bool,
    pub enable_screenshot: bool,
    pub capture_network: bool,
    pub capture_interactions: bool,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 2,
            wait_for_network_idle: true,
            enable_screenshot: false,
            capture_network: true,
            capture_interactions: false,
        }
    }
}

/// Navigates `session` to `url` and extracts a full [`PageSnapshot`],
/// retrying transient failures with exponential backoff (1s/2s/4s).
#[instrument(skip(session, opts), fields(%url))]
pub async fn navigate_and_extract(
    session: &mut Session,
    url: &str,
    opts: &NavigateOptions,
) -> Result<PageSnapshot, NavigationError> {
    // Defensive re-normalization: the caller's URL may have drifted (redirect
    // chains, manual construction) since discovery produced it.
    let target = legacy_url::normalize(url)
        .map(|n| n.url)
        .unwrap_or_else(|_| url.to_string());

    let mut attempt = 0u32;
    let raw = loop {
        match try_navigate(session, &target, opts.timeout_ms).await {
            Ok(raw) => break raw,
            Err(err) if attempt < opts.max_retries => {
                let backoff_ms = 1000u64 * 2u64.pow(attempt);
                warn!(attempt, backoff_ms, error = %err, "navigation attempt failed, retrying");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    };

    if raw.status_code >= 400 {
        return Err(NavigationError::Failure {
            url: target,
            status: raw.status_code,
        });
    }

    let visible_text = session
        .handle
        .visible_text()
        .await
        .unwrap_or_default();
    let meta = session.handle.meta_tags().await.unwrap_or_default();
    let node_count = session.handle.dom_node_count().await.unwrap_or(0);

    let network = if opts.capture_network {
        classify_network(&raw.network, &target)
    } else {
        NetworkLog::new()
    };

    let dom_stats = DomStats {
        node_count,
        form_count: count_occurrences(&raw.html, "<form"),
        link_count: count_occurrences(&raw.html, "<a "),
        script_count: count_occurrences(&raw.html, "<script"),
        image_count: count_occurrences(&raw.html, "<img"),
    };

    let tech_signals = detect_tech_signals(&raw.html, &meta);

    let interaction_log = if opts.capture_interactions {
        Some(run_safe_interactions(session, &raw.html).await)
    } else {
        None
    };

    session.record_page(raw.load_time_ms);

    Ok(PageSnapshot {
        url: target,
        final_url: raw.final_url,
        status_code: raw.status_code,
        title: extract_title(&raw.html),
        html: raw.html,
        visible_text,
        meta,
        screenshot: None,
        network,
        dom_stats,
        tech_signals,
        interaction_log,
        load_time_ms: raw.load_time_ms,
    })
}

async fn try_navigate(
    session: &mut Session,
    url: &str,
    timeout_ms: u64,
) -> Result<crate::engine::RawNavigation, NavigationError> {
    tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        session.handle.navigate(url, timeout_ms),
    )
    .await
    .map_err(|_| NavigationError::Timeout {
        url: url.to_string(),
        timeout_ms,
    })?
    .map_err(|message| {
        if !session.handle.is_healthy() {
            NavigationError::BrowserCrash { message }
        } else {
            NavigationError::Failure { url: url.to_string(), status: 0 }
        }
    })
}

fn classify_network(raw_events: &[RawNetworkExchange], page_url: &str) -> NetworkLog {
    let page_domain = legacy_url::registrable_domain_of(page_url).unwrap_or_default();
    let mut log = NetworkLog::new();
    for e in raw_events {
        let event_domain = legacy_url::registrable_domain_of(&e.url).unwrap_or_default();
        let is_asset_url = ASSET_EXT
            .iter()
            .any(|ext| e.url.to_ascii_lowercase().ends_with(ext));
        if is_asset_url {
            continue;
        }
        log.push(NetworkEvent {
            ts: Utc::now(),
            method: e.method.clone(),
            url: e.url.clone(),
            status: e.status,
            req_headers: e.req_headers.clone(),
            resp_headers: e.resp_headers.clone(),
            req_body: e.req_body.clone(),
            resp_size: e.resp_size,
            timing_ms: e.timing_ms,
            is_third_party: !event_domain.is_empty() && event_domain != page_domain,
        });
    }
    log
}

const ASSET_EXT: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".woff", ".woff2", ".ttf",
];

fn extract_title(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let Some(start) = lower.find("<title>") else {
        return String::new();
    };
    let Some(end) = lower[start..].find("</title>") else {
        return String::new();
    };
    html[start + "<title>".len()..start + end].trim().to_string()
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    let lower = haystack.to_ascii_lowercase();
    lower.matches(&needle.to_ascii_lowercase()).count()
}

fn detect_tech_signals(html: &str, meta: &HashMap<String, String>) -> TechSignals {
    let lower = html.to_ascii_lowercase();
    let mut frameworks = Vec::new();
    for (needle, name) in [
        ("react", "React"),
        ("ng-app", "Angular"),
        ("vue", "Vue"),
        ("jquery", "jQuery"),
    ] {
        if lower.contains(needle) {
            frameworks.push(name.to_string());
        }
    }
    let mut analytics = Vec::new();
    for (needle, name) in [
        ("google-analytics", "Google Analytics"),
        ("gtag(", "Google Tag Manager"),
        ("segment.com", "Segment"),
    ] {
        if lower.contains(needle) {
            analytics.push(name.to_string());
        }
    }
    TechSignals {
        frameworks,
        analytics,
        generator: meta.get("generator").cloned(),
    }
}

/// Bounded, safe interaction plan (3-5 steps): hover/focus/click on selectors
/// that don't match the destructive-action deny-list. Rolled back via reload
/// if a navigation occurs mid-plan (spec §4.5).
async fn run_safe_interactions(session: &mut Session, html: &str) -> Vec<InteractionStep> {
    let candidates = extract_candidate_selectors(html);
    let mut log = Vec::new();
    for selector in candidates.into_iter().take(5) {
        if is_denied(&selector) {
            continue;
        }
        let result = session
            .handle
            .interact(&selector, InteractionAction::Click)
            .await;
        match result {
            Ok(r) => {
                if r.navigated_away {
                    let _ = session.handle.reload().await;
                }
                log.push(InteractionStep {
                    selector: r.selector,
                    action: "click".to_string(),
                    outcome: if r.navigated_away {
                        "navigated-rolled-back".to_string()
                    } else {
                        "ok".to_string()
                    },
                });
            }
            Err(message) => {
                log.push(InteractionStep {
                    selector,
                    action: "click".to_string(),
                    outcome: format!("error: {message}"),
                });
            }
        }
        if log.len() >= 5 {
            break;
        }
    }
    log
}

fn is_denied(selector: &str) -> bool {
    let lower = selector.to_ascii_lowercase();
    DENY_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn extract_candidate_selectors(html: &str) -> Vec<String> {
    let mut out = Vec::new();
    let lower = html.to_ascii_lowercase();
    let mut rest = lower.as_str();
    while let Some(pos) = rest.find("<button") {
        out.push(format!("button:nth-of-type({})", out.len() + 1));
        rest = &rest[pos + 7..];
        if out.len() >= 8 {
            break;
        }
    }
    out
}
