//! `ralph regenerate-plan`/`reset`/`clean` — destructive session-maintenance
//! commands, each requires the caller to have already confirmed intent
//! (the CLI layer prompts; these functions perform the action unconditionally).

use crate::circuit_breaker;
use crate::model::ImplementationPlan;
use crate::store::Store;
use anyhow::{Context, Result};
use std::path::Path;

/// Discard the current plan and start planning over, preserving state
/// (iteration count, cost, phase) but resetting the task graph.
pub fn cmd_regenerate_plan(project_root: &Path) -> Result<()> {
    let store = Store::new(project_root);
    store.save_plan(&ImplementationPlan::new())?;
    println!("Implementation plan cleared; next planning iteration will regenerate it.");
    Ok(())
}

/// Close the circuit breaker and clear the paused flag, without touching
/// tasks — for recovering from a halt once the operator has addressed it.
pub fn cmd_reset(project_root: &Path) -> Result<()> {
    let store = Store::new(project_root);
    let mut state = store.load_state().context("no session to reset")?;
    circuit_breaker::close(&mut state.circuit_breaker);
    state.paused = false;
    state.touch();
    store.save_state(&state)?;
    println!("Circuit breaker reset to closed; session unpaused.");
    Ok(())
}

/// Remove the entire `.ralph/` directory, wiping all session state.
pub fn cmd_clean(project_root: &Path) -> Result<()> {
    let store = Store::new(project_root);
    if store.ralph_dir().exists() {
        std::fs::remove_dir_all(store.ralph_dir())
            .context("failed to remove .ralph directory")?;
    }
    println!("Removed {}", store.ralph_dir().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RalphState, Task};
    use tempfile::tempdir;

    #[test]
    fn regenerate_plan_clears_tasks() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let mut plan = ImplementationPlan::new();
        plan.add_task(Task::new("a", "x", 1)).unwrap();
        store.save_plan(&plan).unwrap();

        cmd_regenerate_plan(dir.path()).unwrap();
        assert!(store.load_plan().unwrap().is_empty());
    }

    #[test]
    fn reset_closes_breaker_and_unpauses() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let mut state = RalphState::new("s1");
        state.paused = true;
        circuit_breaker::record_cost_breach(&mut state.circuit_breaker, "manual".into());
        store.save_state(&state).unwrap();

        cmd_reset(dir.path()).unwrap();
        let reloaded = store.load_state().unwrap();
        assert!(!reloaded.paused);
        assert_eq!(
            reloaded.circuit_breaker.status,
            crate::model::BreakerStatus::Closed
        );
    }

    #[test]
    fn clean_removes_ralph_dir() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store.ensure_ralph_dir().unwrap();
        cmd_clean(dir.path()).unwrap();
        assert!(!store.ralph_dir().exists());
    }

    #[test]
    fn clean_on_missing_dir_is_a_no_op() {
        let dir = tempdir().unwrap();
        assert!(cmd_clean(dir.path()).is_ok());
    }
}
