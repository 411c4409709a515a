//! Prompt construction for Step 1 (content summarization) and Step 2
//! (feature analysis), spec §4.9.

use legacy_types::analysis::ContentSummary;
use legacy_types::snapshot::PageSnapshot;

const VISIBLE_TEXT_LIMIT: usize = 8_000;

const STEP1_SCHEMA: &str = r#"{
  "purpose": string, "user_context": string, "business_logic": string,
  "navigation_role": string, "business_importance": number[0,1],
  "workflows": string[], "journey_stage": "entry"|"middle"|"conversion"|"exit",
  "keywords": string[]
}"#;

const STEP2_SCHEMA: &str = r#"{
  "functional_capabilities": string[], "business_rules": string[],
  "interactive_elements": [{"element_type": string, "selector": string, "purpose": string}],
  "api_integrations": [{"method": string, "endpoint": string, "purpose": string, "auth": "none"|"optional"|"required"}],
  "rebuild_specs": [{"title": string, "description": string, "feature_confidence": number[0,1], "complexity_inverse": number[0,1], "references_interactive_element": bool}]
}"#;

fn truncate_visible_text(text: &str) -> String {
    if text.chars().count() <= VISIBLE_TEXT_LIMIT {
        text.to_string()
    } else {
        text.chars().take(VISIBLE_TEXT_LIMIT).collect()
    }
}

pub fn step1_system_prompt() -> String {
    "You analyze legacy web pages and summarize their purpose for a rebuild team. \
     Respond with a single JSON object matching the required schema, no prose."
        .to_string()
}

pub fn step1_user_prompt(snapshot: &PageSnapshot) -> String {
    format!(
        "URL: {}\nTitle: {}\nMeta: {:?}\nDOM stats: {:?}\nTech signals: {:?}\n\nVisible text:\n{}\n\nRespond as JSON: {}",
        snapshot.url,
        snapshot.title,
        snapshot.meta,
        snapshot.dom_stats,
        snapshot.tech_signals,
        truncate_visible_text(&snapshot.visible_text),
        STEP1_SCHEMA,
    )
}

/// Hardened retry prompt: restates the schema explicitly and calls out the
/// prior failure reason, used on the same-model retry attempt.
pub fn step1_hardened_prompt(snapshot: &PageSnapshot, failure_reason: &str) -> String {
    format!(
        "{}\n\nYour previous response failed validation: {failure_reason}. \
         You MUST return ONLY a JSON object matching exactly this schema, with no \
         markdown fences and no extra keys:\n{}",
        step1_user_prompt(snapshot),
        STEP1_SCHEMA,
    )
}

pub fn step2_system_prompt() -> String {
    "You extract rebuild-ready feature specifications from an already-summarized \
     legacy web page. Respond with a single JSON object matching the required \
     schema, no prose."
        .to_string()
}

pub fn step2_user_prompt(snapshot: &PageSnapshot, summary: &ContentSummary) -> String {
    let api_endpoints: Vec<String> = snapshot
        .network
        .api_endpoints()
        .into_iter()
        .map(|e| format!("{} {}", e.method, e.url))
        .collect();

    let interactions = snapshot
        .interaction_log
        .as_ref()
        .map(|steps| {
            steps
                .iter()
                .map(|s| format!("{} {} -> {}", s.action, s.selector, s.outcome))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    format!(
        "Context (content summary, id={}):\nPurpose: {}\nUser context: {}\nBusiness logic: {}\nBusiness importance: {}\nJourney stage: {:?}\n\nAPI endpoints observed:\n{}\n\nInteraction log:\n{}\n\nRespond as JSON: {}",
        summary.id,
        summary.purpose,
        summary.user_context,
        summary.business_logic,
        summary.business_importance,
        summary.journey_stage,
        api_endpoints.join("\n"),
        interactions,
        STEP2_SCHEMA,
    )
}

pub fn step2_hardened_prompt(
    snapshot: &PageSnapshot,
    summary: &ContentSummary,
    failure_reason: &str,
) -> String {
    format!(
        "{}\n\nYour previous response failed validation: {failure_reason}. \
         You MUST return ONLY a JSON object matching exactly this schema, with no \
         markdown fences and no extra keys:\n{}",
        step2_user_prompt(snapshot, summary),
        STEP2_SCHEMA,
    )
}
