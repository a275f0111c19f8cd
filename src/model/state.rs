//! Session-level state: `RalphState` and `CircuitBreakerState` (C2, §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::TaskStatus;
use crate::phase::Phase;

/// Closed/open/half-open circuit breaker state, owned by [`RalphState`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BreakerStatus {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub status: BreakerStatus,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub stagnation_count: u32,
    #[serde(default)]
    pub last_halt_reason: Option<String>,
    #[serde(default)]
    pub opened_at: Option<DateTime<Utc>>,
}

impl CircuitBreakerState {
    pub fn new() -> Self {
        Self {
            status: BreakerStatus::Closed,
            consecutive_failures: 0,
            stagnation_count: 0,
            last_halt_reason: None,
            opened_at: None,
        }
    }
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self::new()
    }
}

/// The top-level per-session record persisted to `.ralph/state.json`.
///
/// Cost and token usage are tracked two ways: `total_*` accumulates over the
/// whole project lifetime and survives a hand-off; `session_*` accumulates
/// only since the current `session_id` was minted and resets to zero on
/// hand-off (§8: `session_cost_usd <= total_cost_usd` and
/// `session_tokens_used <= total_tokens_used` always hold).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RalphState {
    pub session_id: String,
    pub phase: Phase,
    pub iteration: u64,
    pub paused: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_cost_usd: f64,
    #[serde(default)]
    pub session_cost_usd: f64,
    #[serde(default)]
    pub total_tokens_used: u64,
    #[serde(default)]
    pub session_tokens_used: u64,
    pub circuit_breaker: CircuitBreakerState,
    #[serde(default)]
    pub current_task_id: Option<String>,
    #[serde(default)]
    pub handoff_reason: Option<String>,
    #[serde(default)]
    pub has_discovery_notes: bool,
}

impl RalphState {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            phase: Phase::Discovery,
            iteration: 0,
            paused: false,
            created_at: now,
            updated_at: now,
            total_cost_usd: 0.0,
            session_cost_usd: 0.0,
            total_tokens_used: 0,
            session_tokens_used: 0,
            circuit_breaker: CircuitBreakerState::new(),
            current_task_id: None,
            handoff_reason: None,
            has_discovery_notes: false,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn advance_iteration(&mut self) {
        self.iteration += 1;
        self.touch();
    }

    /// Record one iteration's cost and token usage against both the
    /// session-scoped and lifetime counters.
    pub fn record_usage(&mut self, cost_usd: f64, input_tokens: u64, output_tokens: u64) {
        let tokens = input_tokens + output_tokens;
        self.total_cost_usd += cost_usd;
        self.session_cost_usd += cost_usd;
        self.total_tokens_used += tokens;
        self.session_tokens_used += tokens;
    }

    /// Zero the session-scoped counters on hand-off, preserving the lifetime
    /// totals (spec.md §8 scenario 4).
    pub fn reset_session_usage(&mut self) {
        self.session_cost_usd = 0.0;
        self.session_tokens_used = 0;
    }

    pub fn task_status_summary(tasks: &[TaskStatus]) -> (usize, usize, usize, usize) {
        let mut pending = 0;
        let mut in_progress = 0;
        let mut complete = 0;
        let mut blocked = 0;
        for s in tasks {
            match s {
                TaskStatus::Pending => pending += 1,
                TaskStatus::InProgress => in_progress += 1,
                TaskStatus::Complete => complete += 1,
                TaskStatus::Blocked => blocked += 1,
            }
        }
        (pending, in_progress, complete, blocked)
    }
}
