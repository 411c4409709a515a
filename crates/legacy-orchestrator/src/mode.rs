//! Analysis mode presets and top-level run options (spec §4.12).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Quick,
    Recommended,
    Comprehensive,
    Targeted,
}

impl AnalysisMode {
    /// `(max_pages, include_step2)` preset, per spec §4.12. `Targeted`
    /// defers `max_pages` to the caller's explicit override.
    pub fn preset(self, caller_max_pages: Option<usize>) -> (usize, bool) {
        match self {
            AnalysisMode::Quick => (caller_max_pages.unwrap_or(10).min(10), false),
            AnalysisMode::Recommended => (caller_max_pages.unwrap_or(20).min(20), true),
            AnalysisMode::Comprehensive => (caller_max_pages.unwrap_or(50).min(50), true),
            AnalysisMode::Targeted => (caller_max_pages.unwrap_or(20), true),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CostPriority {
    Speed,
    Balanced,
    CostEfficient,
}

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub analysis_mode: AnalysisMode,
    pub max_pages: Option<usize>,
    pub include_step2: Option<bool>,
    pub interactive_mode: bool,
    pub project_id: String,
    pub cost_priority: CostPriority,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub focus_areas: Vec<String>,
}

impl AnalysisOptions {
    pub fn new(project_id: impl Into<String>, analysis_mode: AnalysisMode) -> Self {
        Self {
            analysis_mode,
            max_pages: None,
            include_step2: None,
            interactive_mode: false,
            project_id: project_id.into(),
            cost_priority: CostPriority::Balanced,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            focus_areas: Vec::new(),
        }
    }
}
