//! `ralph status` — print the current session and circuit breaker state.

use crate::model::state::BreakerStatus;
use crate::store::Store;
use anyhow::Result;
use std::path::Path;

pub fn cmd_status(project_root: &Path) -> Result<()> {
    let store = Store::new(project_root);
    if !store.state_exists() {
        println!("No session found. Run 'ralph init' and 'ralph run' to start one.");
        return Ok(());
    }

    let state = store.load_state()?;
    let plan = store.load_plan().unwrap_or_default();

    println!("Session:  {}", state.session_id);
    println!("Phase:    {}", state.phase);
    println!("Iteration: {}", state.iteration);
    println!("Paused:   {}", state.paused);
    println!(
        "Cost:     ${:.4} total (${:.4} this session)",
        state.total_cost_usd, state.session_cost_usd
    );
    println!(
        "Tokens:   {} total ({} this session)",
        state.total_tokens_used, state.session_tokens_used
    );

    let breaker_label = match state.circuit_breaker.status {
        BreakerStatus::Closed => "closed",
        BreakerStatus::Open => "open",
        BreakerStatus::HalfOpen => "half_open",
    };
    println!("Breaker:  {breaker_label}");
    if let Some(reason) = &state.circuit_breaker.last_halt_reason {
        println!("  reason: {reason}");
    }

    println!(
        "Tasks:    {} total, {} complete, {} pending, {} blocked ({:.1}%)",
        plan.total_count(),
        plan.complete_count(),
        plan.pending_count(),
        plan.blocked_count(),
        plan.completion_percentage(),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn status_with_no_session_does_not_error() {
        let dir = tempdir().unwrap();
        assert!(cmd_status(dir.path()).is_ok());
    }

    #[test]
    fn status_prints_existing_session() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store
            .save_state(&crate::model::RalphState::new("s1"))
            .unwrap();
        assert!(cmd_status(dir.path()).is_ok());
    }
}
