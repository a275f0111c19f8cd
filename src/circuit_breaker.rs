//! Circuit breaker (C4, §4.4): halts the iteration loop on sustained failure,
//! stagnation, or cost overrun, and governs the closed/open/half-open cycle.

use crate::model::state::{BreakerStatus, CircuitBreakerState};
use chrono::Utc;

/// Consecutive iteration failures that trip the breaker open.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;
/// Consecutive no-progress iterations (no task advanced) that trip the breaker.
pub const MAX_STAGNATION: u32 = 5;
/// Iterations the breaker stays open before allowing a half-open probe.
pub const HALF_OPEN_AFTER_ITERATIONS: u32 = 1;

/// Record one iteration's outcome and recompute the breaker status.
///
/// `progressed` means at least one task changed status this iteration.
/// Returns `Some(reason)` when this call is the one that opens the breaker.
pub fn record_outcome(
    state: &mut CircuitBreakerState,
    success: bool,
    progressed: bool,
) -> Option<String> {
    if success {
        state.consecutive_failures = 0;
    } else {
        state.consecutive_failures += 1;
    }

    if progressed {
        state.stagnation_count = 0;
    } else {
        state.stagnation_count += 1;
    }

    if state.status == BreakerStatus::Closed {
        if state.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
            let reason = format!("consecutive_failures:{}", state.consecutive_failures);
            open(state, reason.clone());
            return Some(reason);
        }
        if state.stagnation_count >= MAX_STAGNATION {
            let reason = format!("stagnation:{}", state.stagnation_count);
            open(state, reason.clone());
            return Some(reason);
        }
    }

    None
}

/// Record a cost-limit breach (from the accountant). Opens the breaker
/// unconditionally, per §4.4's hard-stop semantics for budget exhaustion.
pub fn record_cost_breach(state: &mut CircuitBreakerState, reason: String) {
    open(state, reason);
}

fn open(state: &mut CircuitBreakerState, reason: String) {
    state.status = BreakerStatus::Open;
    state.last_halt_reason = Some(reason);
    state.opened_at = Some(Utc::now());
}

/// Transition an open breaker into half-open, allowing exactly one more
/// iteration as a probe. Called by the orchestrator on manual `resume`.
pub fn half_open(state: &mut CircuitBreakerState) {
    if state.status == BreakerStatus::Open {
        state.status = BreakerStatus::HalfOpen;
    }
}

/// Close the breaker and reset its counters, called after a successful
/// half-open probe or an explicit operator `reset`.
pub fn close(state: &mut CircuitBreakerState) {
    state.status = BreakerStatus::Closed;
    state.consecutive_failures = 0;
    state.stagnation_count = 0;
    state.last_halt_reason = None;
    state.opened_at = None;
}

/// Whether the loop may run another iteration right now.
pub fn may_proceed(state: &CircuitBreakerState) -> bool {
    state.status != BreakerStatus::Open
}
