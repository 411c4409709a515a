//! Per-page markdown rendering (spec §4.13). Plain `String`/`fmt::Write`
//! formatting — the teacher carries no templating-engine dependency, and
//! neither does the rest of the pack, so this follows the same direct
//! approach used for report assembly elsewhere in the workspace.

use std::fmt::Write as _;

use legacy_types::analysis::{
    ApiIntegration, ContentSummary, FeatureAnalysis, InteractiveElement, StepOutcome,
};

pub fn render_page_markdown(
    page_id: &str,
    url: &str,
    step1: &StepOutcome<ContentSummary>,
    step2: &StepOutcome<FeatureAnalysis>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "---");
    let _ = writeln!(out, "page_id: {page_id}");
    let _ = writeln!(out, "url: {url}");
    let _ = writeln!(out, "---");
    let _ = writeln!(out);
    let _ = writeln!(out, "# {url}");
    let _ = writeln!(out);

    match step1 {
        StepOutcome::Ok(summary) => render_content_summary(&mut out, summary),
        StepOutcome::Partial { reason, .. } => {
            let _ = writeln!(out, "## Content Summary\n\n_Partial result: {reason}_\n");
        }
        StepOutcome::Failed { reason } => {
            let _ = writeln!(out, "## Content Summary\n\n_Failed: {reason}_\n");
        }
        StepOutcome::Skipped => {
            let _ = writeln!(out, "## Content Summary\n\n_Skipped._\n");
        }
    }

    match step2 {
        StepOutcome::Ok(analysis) => render_feature_analysis(&mut out, analysis),
        StepOutcome::Partial { reason, .. } => {
            let _ = writeln!(out, "## Feature Analysis\n\n_Partial result: {reason}_\n");
        }
        StepOutcome::Failed { reason } => {
            let _ = writeln!(out, "## Feature Analysis\n\n_Failed: {reason}_\n");
        }
        StepOutcome::Skipped => {
            let _ = writeln!(out, "## Feature Analysis\n\n_Skipped (no content summary)._\n");
        }
    }

    out
}

fn render_content_summary(out: &mut String, summary: &ContentSummary) {
    let _ = writeln!(out, "## Content Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Purpose:** {}", summary.purpose);
    let _ = writeln!(out, "- **User context:** {}", summary.user_context);
    let _ = writeln!(out, "- **Business logic:** {}", summary.business_logic);
    let _ = writeln!(out, "- **Navigation role:** {}", summary.navigation_role);
    let _ = writeln!(out, "- **Journey stage:** {:?}", summary.journey_stage);
    let _ = writeln!(
        out,
        "- **Business importance:** {:.2}",
        summary.business_importance
    );
    let _ = writeln!(out, "- **Quality:** {:.2}", summary.quality.overall);
    if !summary.keywords.is_empty() {
        let _ = writeln!(out, "- **Keywords:** {}", summary.keywords.join(", "));
    }
    let _ = writeln!(out);
}

fn render_feature_analysis(out: &mut String, analysis: &FeatureAnalysis) {
    let _ = writeln!(out, "## Feature Analysis");
    let _ = writeln!(out);

    if !analysis.interactive_elements.is_empty() {
        let _ = writeln!(out, "### Interactive Elements\n");
        let _ = writeln!(out, "| Type | Selector | Purpose |");
        let _ = writeln!(out, "|------|----------|---------|");
        for el in &analysis.interactive_elements {
            render_interactive_element_row(out, el);
        }
        let _ = writeln!(out);
    }

    if !analysis.functional_capabilities.is_empty() {
        let _ = writeln!(out, "### Functional Capabilities\n");
        for cap in &analysis.functional_capabilities {
            let _ = writeln!(out, "- {cap}");
        }
        let _ = writeln!(out);
    }

    if !analysis.api_integrations.is_empty() {
        let _ = writeln!(out, "### API Integrations\n");
        let _ = writeln!(out, "| Method | Endpoint | Purpose | Auth |");
        let _ = writeln!(out, "|--------|----------|---------|------|");
        for api in &analysis.api_integrations {
            render_api_integration_row(out, api);
        }
        let _ = writeln!(out);
    }

    if !analysis.business_rules.is_empty() {
        let _ = writeln!(out, "### Business Rules\n");
        for rule in &analysis.business_rules {
            let _ = writeln!(out, "- {rule}");
        }
        let _ = writeln!(out);
    }

    if !analysis.rebuild_specs.is_empty() {
        let _ = writeln!(out, "### Rebuild Specs\n");
        let _ = writeln!(out, "| Priority | Title | Description |");
        let _ = writeln!(out, "|----------|-------|--------------|");
        for spec in &analysis.rebuild_specs {
            let priority = spec
                .priority
                .map(|p| format!("{p:?}"))
                .unwrap_or_else(|| "unscored".to_string());
            let _ = writeln!(out, "| {} | {} | {} |", priority, spec.title, spec.description);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "**Overall confidence:** {:.2}", analysis.overall_confidence);
    let _ = writeln!(out, "**Quality score:** {:.2}", analysis.quality_score);
    let _ = writeln!(out);
}

fn render_interactive_element_row(out: &mut String, el: &InteractiveElement) {
    let _ = writeln!(out, "| {} | `{}` | {} |", el.element_type, el.selector, el.purpose);
}

fn render_api_integration_row(out: &mut String, api: &ApiIntegration) {
    let _ = writeln!(
        out,
        "| {} | `{}` | {} | {:?} |",
        api.method, api.endpoint, api.purpose, api.auth
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacy_types::analysis::{JourneyStage, QualityBreakdown};
    use uuid::Uuid;

    #[test]
    fn renders_ok_summary_with_frontmatter() {
        let summary = ContentSummary {
            id: Uuid::new_v4(),
            purpose: "Checkout review".to_string(),
            user_context: "Returning shoppers".to_string(),
            business_logic: "Totals plus promo codes".to_string(),
            navigation_role: "Intermediate".to_string(),
            business_importance: 0.8,
            confidence: 0.7,
            workflows: vec!["checkout".to_string()],
            journey_stage: JourneyStage::Middle,
            keywords: vec!["cart".to_string()],
            quality: QualityBreakdown {
                overall: 0.7,
                completeness: 0.8,
                depth: 0.6,
            },
        };

        let markdown = render_page_markdown(
            "p1",
            "https://example.com/cart",
            &StepOutcome::Ok(summary),
            &StepOutcome::Skipped,
        );

        assert!(markdown.starts_with("---\npage_id: p1"));
        assert!(markdown.contains("Checkout review"));
        assert!(markdown.contains("Skipped (no content summary)"));
    }

    #[test]
    fn renders_failed_step_with_reason() {
        let markdown = render_page_markdown(
            "p2",
            "https://example.com/contact",
            &StepOutcome::Failed {
                reason: "llm exhausted".to_string(),
            },
            &StepOutcome::Skipped,
        );
        assert!(markdown.contains("_Failed: llm exhausted_"));
    }
}
