//! Progress event and workflow state model (§4.11).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Counts;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    Queued,
    Running,
    Step1Done,
    Step2Done,
    Completed,
    Step1Failed,
    Step2Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Running,
    Paused,
    Stopped,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub ts: DateTime<Utc>,
    pub workflow_id: String,
    pub page_url: String,
    pub from_state: PageState,
    pub to_state: PageState,
    pub counts: Counts,
    pub eta_ms: Option<u64>,
}

/// Exponential moving average of recent per-page durations, used to derive
/// `eta_ms` (§4.11, alpha = 0.3).
#[derive(Debug, Clone, Copy, Default)]
pub struct EtaEstimator {
    alpha: f64,
    average_ms: Option<f64>,
}

impl EtaEstimator {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            average_ms: None,
        }
    }

    pub fn observe(&mut self, duration_ms: u64) {
        let sample = duration_ms as f64;
        self.average_ms = Some(match self.average_ms {
            Some(prev) => self.alpha * sample + (1.0 - self.alpha) * prev,
            None => sample,
        });
    }

    pub fn eta_ms(&self, pending: usize) -> Option<u64> {
        self.average_ms.map(|avg| (avg * pending as f64) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_converges_toward_recent_samples() {
        let mut eta = EtaEstimator::new(0.3);
        eta.observe(1000);
        eta.observe(1000);
        eta.observe(1000);
        let estimate = eta.eta_ms(2).unwrap();
        assert!((estimate as i64 - 2000).abs() < 50);
    }

    #[test]
    fn eta_is_none_before_first_sample() {
        let eta = EtaEstimator::new(0.3);
        assert_eq!(eta.eta_ms(5), None);
    }
}
