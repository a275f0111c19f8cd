//! Phase state machine (C9, §3, §4.9).
//!
//! Ralph drives every session through four ordered phases. Each phase
//! advances only when its completion predicate holds; there is no skipping
//! and no going back except through an explicit `regenerate-plan` reset
//! (handled by the orchestrator, not this module).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Planning,
    Building,
    Validation,
}

impl Phase {
    /// The phase that follows this one, or `None` if this is terminal.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Discovery => Some(Phase::Planning),
            Phase::Planning => Some(Phase::Building),
            Phase::Building => Some(Phase::Validation),
            Phase::Validation => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// The bidirectional `building <-> validation` edge (§4.9): a failed
    /// verification run sends the session back to building instead of
    /// stalling in a terminal validation phase. A no-op for every other
    /// phase.
    pub fn on_verification_failed(self) -> Phase {
        match self {
            Phase::Validation => Phase::Building,
            other => other,
        }
    }

    /// The tool names an executor call may invoke while in this phase (C7/C8).
    pub fn allowed_tools(self) -> &'static [&'static str] {
        match self {
            Phase::Discovery => &["append_learning", "get_state_summary"],
            Phase::Planning => &[
                "add_task",
                "get_plan_summary",
                "get_state_summary",
                "append_learning",
            ],
            Phase::Building => &[
                "get_next_task",
                "mark_task_in_progress",
                "mark_task_complete",
                "mark_task_blocked",
                "increment_retry",
                "append_learning",
                "get_plan_summary",
                "get_state_summary",
            ],
            Phase::Validation => &[
                "get_plan_summary",
                "get_state_summary",
                "append_learning",
                "mark_task_complete",
                "mark_task_blocked",
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Planning => "planning",
            Phase::Building => "building",
            Phase::Validation => "validation",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discovery" => Ok(Phase::Discovery),
            "planning" => Ok(Phase::Planning),
            "building" => Ok(Phase::Building),
            "validation" => Ok(Phase::Validation),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// Whether `plan` (given its task counts) satisfies the completion predicate
/// for `phase`, per §4.9:
/// - discovery completes once at least one learning/note has been recorded
/// - planning completes once the plan has at least one task
/// - building completes once every non-blocked task is complete
/// - validation completes once required verification has run and passed
pub fn completion_predicate(
    phase: Phase,
    has_discovery_notes: bool,
    task_count: usize,
    pending_or_in_progress_count: usize,
    verification_passed: bool,
) -> bool {
    match phase {
        Phase::Discovery => has_discovery_notes,
        Phase::Planning => task_count > 0,
        Phase::Building => task_count > 0 && pending_or_in_progress_count == 0,
        Phase::Validation => verification_passed,
    }
}
