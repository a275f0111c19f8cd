//! `ralph run`/`discover`/`plan`/`build`/`validate` — drive the iteration
//! loop, either through every phase or pinned to a single one.

use crate::config::RalphConfig;
use crate::executor::ProcessExecutor;
use crate::lock::RalphLock;
use crate::orchestrator::{Orchestrator, RecoveryAction};
use crate::phase::Phase;
use anyhow::{Context, Result};
use std::path::Path;

/// Exit code conventions (spec.md §6, §8 scenario 3): 0 for a run that
/// reaches its natural stopping point (max iterations or, for a pinned
/// phase, phase completion), 3 for a hand-off, 4 for a halt that requires
/// manual intervention (open circuit breaker, stagnation).
pub const EXIT_OK: i32 = 0;
pub const EXIT_HANDOFF: i32 = 3;
pub const EXIT_HALTED: i32 = 4;

pub async fn cmd_run(project_root: &Path) -> Result<i32> {
    drive(project_root, None).await
}

pub async fn cmd_discover(project_root: &Path) -> Result<i32> {
    drive(project_root, Some(Phase::Discovery)).await
}

pub async fn cmd_plan(project_root: &Path) -> Result<i32> {
    drive(project_root, Some(Phase::Planning)).await
}

pub async fn cmd_build(project_root: &Path) -> Result<i32> {
    drive(project_root, Some(Phase::Building)).await
}

pub async fn cmd_validate(project_root: &Path) -> Result<i32> {
    drive(project_root, Some(Phase::Validation)).await
}

/// Run iterations until either: `pinned_phase` is given and the session
/// advances past it, the whole plan reaches the terminal phase, or a
/// `RecoveryAction` other than `Retry` is returned. Returns the process
/// exit code the caller should use.
async fn drive(project_root: &Path, pinned_phase: Option<Phase>) -> Result<i32> {
    let ralph_dir = project_root.join(crate::store::RALPH_DIR);
    let _lock = RalphLock::acquire(&ralph_dir)
        .context("failed to acquire .ralph/lock; is another run already in progress?")?;

    let config = RalphConfig::load(project_root)?;
    let executor = Box::new(ProcessExecutor::new(
        config.executor_cmd.clone(),
        project_root,
    ));
    let orchestrator = Orchestrator::new(project_root, config.clone(), executor);
    let (mut state, mut plan) = orchestrator.load_or_init()?;

    if let Some(phase) = pinned_phase {
        state.phase = phase;
    }

    let starting_phase = state.phase;
    let max_iterations = config.max_iterations;

    loop {
        if state.iteration >= max_iterations {
            println!("Reached max_iterations ({max_iterations}); stopping.");
            return Ok(EXIT_OK);
        }
        if pinned_phase.is_some() && state.phase != starting_phase {
            println!("Phase '{starting_phase}' complete; advanced to '{}'.", state.phase);
            return Ok(EXIT_OK);
        }

        let action = orchestrator.run_one_iteration(&mut state, &mut plan).await?;
        println!(
            "iteration {} phase={} cost=${:.4}",
            state.iteration, state.phase, state.total_cost_usd
        );

        match action {
            RecoveryAction::Retry => continue,
            RecoveryAction::SkipTask { task_id } => {
                println!("Skipping task '{task_id}' after exhausting retries.");
            }
            RecoveryAction::Handoff { reason } => {
                println!("Hand-off triggered: {reason}");
                return Ok(EXIT_HANDOFF);
            }
            RecoveryAction::ManualIntervention { reason } => {
                println!("Halted, manual intervention required: {reason}");
                return Ok(EXIT_HALTED);
            }
        }
    }
}
