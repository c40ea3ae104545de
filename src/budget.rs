use crate::config::{FillerCosts, PipelineConfig};
use crate::source::SourceKind;

/// Crude deterministic token estimate: four characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Number of filler records that bring `current_tokens` up to `target`
/// without passing it. Zero once the payload is already at or over target;
/// real records are never dropped to fit.
pub fn filler_count(current_tokens: usize, target: usize, filler_cost: f64) -> usize {
    if !filler_cost.is_finite() || filler_cost <= 0.0 || current_tokens >= target {
        return 0;
    }
    ((target - current_tokens) as f64 / filler_cost).floor() as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetPlan {
    pub current_tokens: usize,
    pub filler_records: usize,
}

/// The target payload size plus the per-kind cost of one filler record.
///
/// Cache creation only accepts payloads above a minimum size, so small
/// statements are padded with empty rows until they approach the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBudget {
    target: usize,
    costs: FillerCosts,
}

impl TokenBudget {
    pub fn new(target: usize, costs: FillerCosts) -> Self {
        Self { target, costs }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.target_tokens, config.filler_costs)
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn filler_cost(&self, kind: SourceKind) -> f64 {
        self.costs.for_kind(kind)
    }

    /// Largest amount a padded payload may fall short of the target.
    pub fn margin(&self, kind: SourceKind) -> usize {
        self.filler_cost(kind).ceil() as usize
    }

    pub fn plan(&self, kind: SourceKind, payload: &str) -> BudgetPlan {
        let current_tokens = estimate_tokens(payload);
        BudgetPlan {
            current_tokens,
            filler_records: filler_count(current_tokens, self.target, self.filler_cost(kind)),
        }
    }
}
