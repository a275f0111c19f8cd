//! Typed error hierarchy for the Ralph orchestrator core.
//!
//! Four top-level enums cover the subsystems named in the error handling
//! design (SPEC_FULL.md §7):
//! - `StoreError` — state-store persistence failures
//! - `ModelError` — data-model invariant violations
//! - `BudgetError` — cost/context budget breaches, fed into the circuit breaker
//! - `ExecutorError` — executor transport failures

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the durable state store (C1).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state not found at {path}")]
    StateNotFound { path: PathBuf },

    #[error("corrupted state at {path}: {message}")]
    CorruptedState { path: PathBuf, message: String },

    #[error("permission denied accessing {path}")]
    PermissionDenied { path: PathBuf },

    #[error("disk full writing {path}")]
    DiskFull { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from the data model's guarded mutators (C2).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ModelError {
    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: String,
        to: String,
    },

    #[error("duplicate task id: {0}")]
    DuplicateId(String),

    #[error("unknown dependency '{dependency}' referenced by task '{task_id}'")]
    UnknownDependency { task_id: String, dependency: String },

    #[error("introducing task '{task_id}' would create a dependency cycle")]
    CycleIntroduced { task_id: String },

    #[error("invalid plan: {0}")]
    InvalidPlan(String),
}

/// Errors from the cost/context accountant (C3), fed into the circuit breaker.
#[derive(Debug, Error, PartialEq, Clone, Copy)]
pub enum BudgetKind {
    #[error("iteration")]
    Iteration,
    #[error("session")]
    Session,
    #[error("total")]
    Total,
}

#[derive(Debug, Error, PartialEq, Clone)]
#[error("{kind} budget exceeded: ${spent:.4} > ${limit:.4}")]
pub struct BudgetError {
    pub kind: BudgetKind,
    pub spent: f64,
    pub limit: f64,
}

impl BudgetError {
    pub fn iteration(spent: f64, limit: f64) -> Self {
        Self {
            kind: BudgetKind::Iteration,
            spent,
            limit,
        }
    }

    pub fn session(spent: f64, limit: f64) -> Self {
        Self {
            kind: BudgetKind::Session,
            spent,
            limit,
        }
    }

    pub fn total(spent: f64, limit: f64) -> Self {
        Self {
            kind: BudgetKind::Total,
            spent,
            limit,
        }
    }

    /// The halt-reason string fed into the circuit breaker, per §4.4.
    pub fn reason(&self) -> String {
        format!("cost_limit:${:.2}", self.spent)
    }
}

/// Errors surfaced by an executor port implementation.
///
/// Per the error handling design these are never propagated as a hard
/// failure directly; the orchestrator wraps them into
/// `IterationResult { success: false, error: Some(..) }` and counts them
/// as a circuit-breaker failure.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to spawn executor process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("executor transport error: {0}")]
    Transport(String),

    #[error("executor call cancelled")]
    Cancelled,

    #[error("executor call timed out after {0:?}")]
    TimedOut(std::time::Duration),
}
