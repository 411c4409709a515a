//! Step 1 / Step 2 output data model and workflow result types (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum JourneyStage {
    Entry,
    Middle,
    Conversion,
    Exit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub overall: f64,
    pub completeness: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSummary {
    pub id: Uuid,
    pub purpose: String,
    pub user_context: String,
    pub business_logic: String,
    pub navigation_role: String,
    pub business_importance: f64,
    pub confidence: f64,
    pub workflows: Vec<String>,
    pub journey_stage: JourneyStage,
    pub keywords: Vec<String>,
    pub quality: QualityBreakdown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthRequirement {
    None,
    Optional,
    Required,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractiveElement {
    pub element_type: String,
    pub selector: String,
    pub purpose: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiIntegration {
    pub method: String,
    pub endpoint: String,
    pub purpose: String,
    pub auth: AuthRequirement,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildSpec {
    pub title: String,
    pub description: String,
    pub references_interactive_element: bool,
    pub feature_confidence: f64,
    pub complexity_inverse: f64,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureAnalysis {
    pub interactive_elements: Vec<InteractiveElement>,
    pub functional_capabilities: Vec<String>,
    pub api_integrations: Vec<ApiIntegration>,
    pub business_rules: Vec<String>,
    pub rebuild_specs: Vec<RebuildSpec>,
    pub overall_confidence: f64,
    pub quality_score: f64,
    pub context_ref: Uuid,
}

/// Outcome of a Step 1 / Step 2 analysis call: success, a preserved partial
/// result, or a terminal failure (§4.9 failure semantics).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepOutcome<T> {
    Ok(T),
    Partial { raw: String, reason: String },
    Failed { reason: String },
    Skipped,
}

impl<T> StepOutcome<T> {
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            StepOutcome::Ok(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageError {
    pub error_kind: String,
    pub error_code: String,
    pub message: String,
    pub retry_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub page_id: String,
    pub url: String,
    pub snapshot_ref: Option<String>,
    pub step1: StepOutcome<ContentSummary>,
    pub step2: StepOutcome<FeatureAnalysis>,
    pub errors: Vec<PageError>,
    pub processing_time_ms: u64,
}

impl PageResult {
    pub fn completed(&self) -> bool {
        matches!(self.step1, StepOutcome::Ok(_))
            && matches!(
                self.step2,
                StepOutcome::Ok(_) | StepOutcome::Skipped
            )
    }

    pub fn failed(&self) -> bool {
        self.step1.is_terminal_failure() || self.step2.is_terminal_failure()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub workflow_id: String,
    pub created_at: DateTime<Utc>,
    pub completed_pages: Vec<String>,
    pub pending_pages: Vec<String>,
    pub failed_pages: Vec<String>,
    pub skipped_pages: Vec<String>,
    pub resume_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counts {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
    pub running: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualitySummary {
    pub average_step1_quality: f64,
    pub average_step2_quality: f64,
    pub pages_below_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_id: String,
    pub seed_url: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub settings: serde_json::Value,
    pub counts: Counts,
    pub quality_summary: QualitySummary,
}
