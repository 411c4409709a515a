//! Pre-run cost estimate (spec §4.12 phase 3): a token-count heuristic times
//! a per-provider per-token rate, scaled by `cost_priority`.

use crate::mode::CostPriority;

/// Rough average tokens per page for each step, derived from the prompt
/// shapes in `legacy-analyzer::prompts` (visible text truncated to ~8k
/// chars ~= 2k tokens, plus schema and instructions overhead).
const STEP1_AVG_TOKENS: u64 = 2_500;
const STEP2_AVG_TOKENS: u64 = 3_000;

/// Per-1k-token USD rate, deliberately provider-agnostic and rough — this
/// is a pre-run estimate to inform `cost_priority`, not a billing figure.
const RATE_PER_1K_TOKENS: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub estimated_tokens: u64,
    pub estimated_usd: f64,
    pub page_count: usize,
}

pub fn estimate_cost(page_count: usize, include_step2: bool, cost_priority: CostPriority) -> CostEstimate {
    let per_page_tokens = if include_step2 {
        STEP1_AVG_TOKENS + STEP2_AVG_TOKENS
    } else {
        STEP1_AVG_TOKENS
    };

    let multiplier = match cost_priority {
        CostPriority::Speed => 1.1,
        CostPriority::Balanced => 1.0,
        CostPriority::CostEfficient => 0.85,
    };

    let estimated_tokens = (page_count as f64 * per_page_tokens as f64 * multiplier) as u64;
    let estimated_usd = estimated_tokens as f64 / 1000.0 * RATE_PER_1K_TOKENS;

    CostEstimate {
        estimated_tokens,
        estimated_usd,
        page_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step2_inclusion_increases_estimate() {
        let without = estimate_cost(10, false, CostPriority::Balanced);
        let with = estimate_cost(10, true, CostPriority::Balanced);
        assert!(with.estimated_tokens > without.estimated_tokens);
    }

    #[test]
    fn cost_efficient_priority_reduces_estimate() {
        let balanced = estimate_cost(10, true, CostPriority::Balanced);
        let efficient = estimate_cost(10, true, CostPriority::CostEfficient);
        assert!(efficient.estimated_tokens < balanced.estimated_tokens);
    }
}
