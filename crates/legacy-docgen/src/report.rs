//! Master report assembly and incremental regeneration (spec §4.13).
//! `render_master_report` is a pure function of its inputs — same pages in
//! the same order always produce byte-identical output (§8 testable
//! property) — so "incremental update" just means calling it again with
//! the growing page list and re-publishing via one atomic rewrite.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use legacy_types::analysis::{Priority, ProjectMetadata, StepOutcome};
use legacy_types::analysis::{ContentSummary, FeatureAnalysis};
use serde::{Deserialize, Serialize};

/// Serializable as a page's `page-<slug>.json` artifact and reloaded from
/// disk to regenerate the master report, so "incremental" updates never
/// depend on in-memory state surviving a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_id: String,
    pub url: String,
    pub slug: String,
    pub step1: StepOutcome<ContentSummary>,
    pub step2: StepOutcome<FeatureAnalysis>,
}

/// Renders the full master report from scratch. Pages are sorted by slug
/// before rendering so output never depends on completion order.
pub fn render_master_report(metadata: &ProjectMetadata, pages: &[PageRecord]) -> String {
    let mut sorted: Vec<&PageRecord> = pages.iter().collect();
    sorted.sort_by(|a, b| a.slug.cmp(&b.slug));

    let mut out = String::new();
    render_executive_summary(&mut out, metadata);
    render_project_overview(&mut out, metadata);
    render_table_of_contents(&mut out, &sorted);
    render_api_integration_summary(&mut out, &sorted);
    render_business_logic(&mut out, &sorted);
    render_technical_specifications(&mut out, &sorted);
    out
}

fn render_executive_summary(out: &mut String, metadata: &ProjectMetadata) {
    let c = &metadata.counts;
    let q = &metadata.quality_summary;
    let _ = writeln!(out, "# Legacy Site Analysis Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "## Executive Summary");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "- Pages: {} total, {} completed, {} failed, {} skipped, {} pending",
        c.total, c.completed, c.failed, c.skipped, c.pending
    );
    let _ = writeln!(
        out,
        "- Average Step 1 quality: {:.2}",
        q.average_step1_quality
    );
    let _ = writeln!(
        out,
        "- Average Step 2 quality: {:.2}",
        q.average_step2_quality
    );
    let _ = writeln!(out, "- Pages below quality threshold: {}", q.pages_below_threshold);
    let _ = writeln!(out);
}

fn render_project_overview(out: &mut String, metadata: &ProjectMetadata) {
    let _ = writeln!(out, "## Project Overview");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Project ID: {}", metadata.project_id);
    let _ = writeln!(out, "- Seed URL: {}", metadata.seed_url);
    let _ = writeln!(out, "- Domain: {}", metadata.domain);
    let _ = writeln!(out, "- Created: {}", metadata.created_at.to_rfc3339());
    let _ = writeln!(out);
}

fn render_table_of_contents(out: &mut String, pages: &[&PageRecord]) {
    let _ = writeln!(out, "## Pages");
    let _ = writeln!(out);
    for page in pages {
        let _ = writeln!(out, "- [{}](pages/page-{}.md)", page.url, page.slug);
    }
    let _ = writeln!(out);
}

fn render_api_integration_summary(out: &mut String, pages: &[&PageRecord]) {
    let mut by_method: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for page in pages {
        if let StepOutcome::Ok(analysis) = &page.step2 {
            for api in &analysis.api_integrations {
                by_method
                    .entry(api.method.clone())
                    .or_default()
                    .push(format!("{} ({})", api.endpoint, page.url));
            }
        }
    }

    if by_method.is_empty() {
        return;
    }

    let _ = writeln!(out, "## API Integration Summary");
    let _ = writeln!(out);
    for (method, endpoints) in &by_method {
        let _ = writeln!(out, "### {method}\n");
        for endpoint in endpoints {
            let _ = writeln!(out, "- {endpoint}");
        }
        let _ = writeln!(out);
    }
}

fn render_business_logic(out: &mut String, pages: &[&PageRecord]) {
    let mut workflows: Vec<String> = Vec::new();
    for page in pages {
        if let StepOutcome::Ok(summary) = &page.step1 {
            for workflow in &summary.workflows {
                if !workflows.contains(workflow) {
                    workflows.push(workflow.clone());
                }
            }
        }
    }

    if workflows.is_empty() {
        return;
    }

    workflows.sort();
    let _ = writeln!(out, "## Business Logic Documentation");
    let _ = writeln!(out);
    for workflow in &workflows {
        let _ = writeln!(out, "- {workflow}");
    }
    let _ = writeln!(out);
}

fn render_technical_specifications(out: &mut String, pages: &[&PageRecord]) {
    let mut specs: Vec<(Priority, String, String, String)> = Vec::new();
    for page in pages {
        if let StepOutcome::Ok(analysis) = &page.step2 {
            for spec in &analysis.rebuild_specs {
                let priority = spec.priority.unwrap_or(Priority::Low);
                specs.push((priority, spec.title.clone(), spec.description.clone(), page.url.clone()));
            }
        }
    }

    if specs.is_empty() {
        return;
    }

    specs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let _ = writeln!(out, "## Technical Specifications");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Priority | Title | Page | Description |");
    let _ = writeln!(out, "|----------|-------|------|--------------|");
    for (priority, title, description, url) in &specs {
        let _ = writeln!(out, "| {priority:?} | {title} | {url} | {description} |");
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use legacy_types::analysis::{ApiIntegration, AuthRequirement, Counts, QualitySummary, RebuildSpec};

    fn metadata() -> ProjectMetadata {
        ProjectMetadata {
            project_id: "proj-1".to_string(),
            seed_url: "https://example.com".to_string(),
            domain: "example.com".to_string(),
            created_at: chrono::Utc::now(),
            settings: serde_json::json!({}),
            counts: Counts {
                total: 2,
                completed: 2,
                failed: 0,
                skipped: 0,
                pending: 0,
                running: 0,
            },
            quality_summary: QualitySummary {
                average_step1_quality: 0.8,
                average_step2_quality: 0.7,
                pages_below_threshold: 0,
            },
        }
    }

    fn feature_analysis_with(method: &str, priority: Priority) -> FeatureAnalysis {
        FeatureAnalysis {
            interactive_elements: vec![],
            functional_capabilities: vec![],
            api_integrations: vec![ApiIntegration {
                method: method.to_string(),
                endpoint: "/api/cart".to_string(),
                purpose: "checkout".to_string(),
                auth: AuthRequirement::Required,
            }],
            business_rules: vec![],
            rebuild_specs: vec![RebuildSpec {
                title: "Cart form".to_string(),
                description: "...".to_string(),
                references_interactive_element: false,
                feature_confidence: 0.8,
                complexity_inverse: 0.8,
                priority: Some(priority),
            }],
            overall_confidence: 0.8,
            quality_score: 0.8,
            context_ref: uuid::Uuid::new_v4(),
        }
    }

    #[test]
    fn same_pages_same_order_produce_identical_output() {
        let pages = vec![PageRecord {
            page_id: "p1".to_string(),
            url: "https://example.com/cart".to_string(),
            slug: "cart".to_string(),
            step1: StepOutcome::Skipped,
            step2: StepOutcome::Ok(feature_analysis_with("POST", Priority::High)),
        }];

        let first = render_master_report(&metadata(), &pages);
        let second = render_master_report(&metadata(), &pages);
        assert_eq!(first, second);
    }

    #[test]
    fn technical_specs_sorted_by_priority_descending() {
        let pages = vec![
            PageRecord {
                page_id: "p1".to_string(),
                url: "https://example.com/low".to_string(),
                slug: "low".to_string(),
                step1: StepOutcome::Skipped,
                step2: StepOutcome::Ok(feature_analysis_with("GET", Priority::Low)),
            },
            PageRecord {
                page_id: "p2".to_string(),
                url: "https://example.com/high".to_string(),
                slug: "high".to_string(),
                step1: StepOutcome::Skipped,
                step2: StepOutcome::Ok(feature_analysis_with("POST", Priority::High)),
            },
        ];

        let report = render_master_report(&metadata(), &pages);
        let high_pos = report.find("High").unwrap();
        let low_pos = report.find("Low").unwrap();
        assert!(high_pos < low_pos);
    }

    #[test]
    fn api_integrations_grouped_by_method() {
        let pages = vec![PageRecord {
            page_id: "p1".to_string(),
            url: "https://example.com/cart".to_string(),
            slug: "cart".to_string(),
            step1: StepOutcome::Skipped,
            step2: StepOutcome::Ok(feature_analysis_with("POST", Priority::Medium)),
        }];

        let report = render_master_report(&metadata(), &pages);
        assert!(report.contains("### POST"));
    }
}
