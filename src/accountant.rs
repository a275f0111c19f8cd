//! Cost & context accountant (C3, §4.3): USD cost tracking and context-window
//! budget management, both of which can force a hand-off decision.

use crate::errors::BudgetError;
use crate::util::round_usd;
use serde::{Deserialize, Serialize};

/// Per-million-token USD pricing for a model, input/output split.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// A small built-in pricing table covering the models Ralph is commonly
/// configured against. Unknown model names fall back to `default_pricing`.
pub fn pricing_for(model: &str) -> ModelPricing {
    match model {
        "claude-opus-4" => ModelPricing {
            input_per_million: 15.0,
            output_per_million: 75.0,
        },
        "claude-sonnet-4" => ModelPricing {
            input_per_million: 3.0,
            output_per_million: 15.0,
        },
        "claude-haiku-4" => ModelPricing {
            input_per_million: 0.8,
            output_per_million: 4.0,
        },
        _ => default_pricing(),
    }
}

fn default_pricing() -> ModelPricing {
    ModelPricing {
        input_per_million: 3.0,
        output_per_million: 15.0,
    }
}

/// Compute the USD cost of one iteration's token usage, banker's-rounded
/// to four decimal places per §4.3.
pub fn iteration_cost_usd(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    let pricing = pricing_for(model);
    let input_cost = (input_tokens as f64 / 1_000_000.0) * pricing.input_per_million;
    let output_cost = (output_tokens as f64 / 1_000_000.0) * pricing.output_per_million;
    round_usd(input_cost + output_cost)
}

/// Configured cost ceilings, all optional (`None` = unlimited).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct CostLimits {
    pub per_iteration_usd: Option<f64>,
    pub per_session_usd: Option<f64>,
    pub total_usd: Option<f64>,
}

/// Check a proposed iteration cost against the configured limits, returning
/// the first limit breached (iteration, then session, then total).
pub fn check_cost_limits(
    limits: &CostLimits,
    iteration_cost: f64,
    session_cumulative: f64,
    total_cumulative: f64,
) -> Result<(), BudgetError> {
    if let Some(limit) = limits.per_iteration_usd {
        if iteration_cost > limit {
            return Err(BudgetError::iteration(iteration_cost, limit));
        }
    }
    if let Some(limit) = limits.per_session_usd {
        if session_cumulative > limit {
            return Err(BudgetError::session(session_cumulative, limit));
        }
    }
    if let Some(limit) = limits.total_usd {
        if total_cumulative > limit {
            return Err(BudgetError::total(total_cumulative, limit));
        }
    }
    Ok(())
}

/// Context window accounting, §4.3's "smart zone" model: the effective
/// capacity reserves a safety margin, and a further "smart zone" threshold
/// triggers proactive hand-off before the hard limit is hit.
#[derive(Debug, Clone, Copy)]
pub struct ContextBudget {
    pub total_capacity: u64,
    pub safety_margin: f64,
    pub smart_zone_fraction: f64,
}

impl ContextBudget {
    pub const DEFAULT_TOTAL_CAPACITY: u64 = 200_000;
    pub const DEFAULT_SAFETY_MARGIN: f64 = 0.20;
    pub const DEFAULT_SMART_ZONE_FRACTION: f64 = 0.60;

    pub fn new(total_capacity: u64, safety_margin: f64, smart_zone_fraction: f64) -> Self {
        Self {
            total_capacity,
            safety_margin,
            smart_zone_fraction,
        }
    }

    pub fn effective_capacity(&self) -> u64 {
        ((self.total_capacity as f64) * (1.0 - self.safety_margin)) as u64
    }

    pub fn smart_zone_max(&self) -> u64 {
        ((self.total_capacity as f64) * self.smart_zone_fraction) as u64
    }

    /// Whether the accumulated context usage warrants a proactive hand-off,
    /// i.e. usage has crossed into the smart zone.
    pub fn should_handoff(&self, used_tokens: u64) -> bool {
        used_tokens >= self.smart_zone_max()
    }

    /// Whether usage has exceeded the hard effective capacity.
    pub fn is_over_capacity(&self, used_tokens: u64) -> bool {
        used_tokens >= self.effective_capacity()
    }
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_TOTAL_CAPACITY,
            Self::DEFAULT_SAFETY_MARGIN,
            Self::DEFAULT_SMART_ZONE_FRACTION,
        )
    }
}
