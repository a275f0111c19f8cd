//! `ralph pause`/`resume`/`skip`/`inject`/`handoff` — operator interventions
//! on a live session.

use crate::circuit_breaker;
use crate::model::Injection;
use crate::store::Store;
use anyhow::{bail, Context, Result};
use uuid::Uuid;

pub fn cmd_pause(project_root: &std::path::Path) -> Result<()> {
    let store = Store::new(project_root);
    let mut state = store.load_state().context("no session to pause")?;
    state.paused = true;
    state.touch();
    store.save_state(&state)?;
    println!("Session paused.");
    Ok(())
}

pub fn cmd_resume(project_root: &std::path::Path) -> Result<()> {
    let store = Store::new(project_root);
    let mut state = store.load_state().context("no session to resume")?;
    state.paused = false;
    circuit_breaker::half_open(&mut state.circuit_breaker);
    state.touch();
    store.save_state(&state)?;
    println!("Session resumed.");
    Ok(())
}

pub fn cmd_skip(project_root: &std::path::Path, task_id: &str) -> Result<()> {
    let store = Store::new(project_root);
    let mut plan = store.load_plan().context("no implementation plan found")?;
    let task = plan
        .get_mut(task_id)
        .with_context(|| format!("unknown task '{task_id}'"))?;
    task.mark_blocked("skipped by operator")?;
    store.save_plan(&plan)?;
    println!("Task '{task_id}' marked blocked (skipped).");
    Ok(())
}

pub fn cmd_inject(project_root: &std::path::Path, message: &str) -> Result<()> {
    if message.trim().is_empty() {
        bail!("injection message must not be empty");
    }
    let store = Store::new(project_root);
    let mut injections = store.load_injections()?;
    injections.push(Injection::new(Uuid::new_v4().to_string(), message.to_string()));
    store.save_injections(&injections)?;
    println!("Injection recorded; it will be folded into the next iteration's prompt.");
    Ok(())
}

pub fn cmd_handoff(project_root: &std::path::Path, reason: &str) -> Result<()> {
    let store = Store::new(project_root);
    let mut state = store.load_state().context("no session to hand off")?;
    state.handoff_reason = Some(reason.to_string());
    state.session_id = Uuid::new_v4().to_string();
    state.reset_session_usage();
    state.touch();
    store.save_state(&state)?;
    println!("Hand-off recorded; new session id: {}", state.session_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RalphState;
    use tempfile::tempdir;

    #[test]
    fn pause_then_resume_round_trips() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store.save_state(&RalphState::new("s1")).unwrap();

        cmd_pause(dir.path()).unwrap();
        assert!(store.load_state().unwrap().paused);

        cmd_resume(dir.path()).unwrap();
        assert!(!store.load_state().unwrap().paused);
    }

    #[test]
    fn inject_rejects_empty_message() {
        let dir = tempdir().unwrap();
        assert!(cmd_inject(dir.path(), "   ").is_err());
    }

    #[test]
    fn inject_appends_to_injection_list() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        cmd_inject(dir.path(), "slow down").unwrap();
        let injections = store.load_injections().unwrap();
        assert_eq!(injections.len(), 1);
        assert_eq!(injections[0].message, "slow down");
    }

    #[test]
    fn handoff_regenerates_session_id() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store.save_state(&RalphState::new("original")).unwrap();

        cmd_handoff(dir.path(), "context pressure").unwrap();
        let state = store.load_state().unwrap();
        assert_ne!(state.session_id, "original");
        assert_eq!(state.handoff_reason.as_deref(), Some("context pressure"));
    }

    #[test]
    fn skip_marks_task_blocked() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let mut plan = crate::model::ImplementationPlan::new();
        plan.add_task(crate::model::Task::new("a", "x", 1)).unwrap();
        store.save_plan(&plan).unwrap();

        cmd_skip(dir.path(), "a").unwrap();
        let plan = store.load_plan().unwrap();
        assert_eq!(plan.get("a").unwrap().status, crate::model::TaskStatus::Blocked);
    }
}
