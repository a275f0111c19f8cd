//! Tool surface (C8, §4.8): the fixed set of structured operations an
//! executor iteration may invoke against the state store and plan.

use crate::errors::ModelError;
use crate::model::{ImplementationPlan, RalphState, Task};
use crate::scheduler;
use serde::{Deserialize, Serialize};

/// One call from an executor iteration, tagged by variant rather than a
/// dynamic string-keyed attribute map, so dispatch is exhaustive-checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    GetNextTask,
    MarkTaskInProgress { task_id: String },
    MarkTaskComplete {
        task_id: String,
        notes: Option<String>,
        tokens: Option<u64>,
    },
    MarkTaskBlocked { task_id: String, reason: String },
    IncrementRetry { task_id: String },
    AddTask {
        id: String,
        description: String,
        priority: i32,
        #[serde(default)]
        dependencies: Vec<String>,
        #[serde(default)]
        verification_criteria: Vec<String>,
    },
    AppendLearning { note: String },
    GetPlanSummary,
    GetStateSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ToolResult {
    NextTask { task: Option<Task> },
    Ack,
    PlanSummary {
        total: usize,
        pending: usize,
        complete: usize,
        blocked: usize,
        completion_percentage: f64,
    },
    StateSummary {
        phase: String,
        iteration: u64,
        total_cost_usd: f64,
        session_cost_usd: f64,
    },
}

/// Dispatch one tool call against the plan/state, mutating them in place.
/// Pure with respect to everything but `plan`/`state`: no I/O here, the
/// caller is responsible for persisting afterward.
pub fn dispatch(
    call: ToolCall,
    plan: &mut ImplementationPlan,
    state: &mut RalphState,
) -> Result<ToolResult, ModelError> {
    match call {
        ToolCall::GetNextTask => {
            let task = scheduler::next_task(plan).cloned();
            Ok(ToolResult::NextTask { task })
        }
        ToolCall::MarkTaskInProgress { task_id } => {
            let task = plan
                .get_mut(&task_id)
                .ok_or_else(|| ModelError::UnknownTask(task_id.clone()))?;
            task.mark_in_progress()?;
            state.current_task_id = Some(task_id);
            Ok(ToolResult::Ack)
        }
        ToolCall::MarkTaskComplete {
            task_id,
            notes,
            tokens,
        } => {
            let task = plan
                .get_mut(&task_id)
                .ok_or_else(|| ModelError::UnknownTask(task_id.clone()))?;
            task.mark_complete(notes, tokens)?;
            if state.current_task_id.as_deref() == Some(task_id.as_str()) {
                state.current_task_id = None;
            }
            Ok(ToolResult::Ack)
        }
        ToolCall::MarkTaskBlocked { task_id, reason } => {
            let task = plan
                .get_mut(&task_id)
                .ok_or_else(|| ModelError::UnknownTask(task_id.clone()))?;
            task.mark_blocked(reason)?;
            Ok(ToolResult::Ack)
        }
        ToolCall::IncrementRetry { task_id } => {
            let task = plan
                .get_mut(&task_id)
                .ok_or_else(|| ModelError::UnknownTask(task_id.clone()))?;
            task.increment_retry();
            Ok(ToolResult::Ack)
        }
        ToolCall::AddTask {
            id,
            description,
            priority,
            dependencies,
            verification_criteria,
        } => {
            let task = Task::new(id, description, priority)
                .with_dependencies(dependencies)
                .with_verification_criteria(verification_criteria);
            plan.add_task(task)?;
            Ok(ToolResult::Ack)
        }
        ToolCall::AppendLearning { .. } => {
            // Persisted by the orchestrator via the memory subsystem, not here.
            Ok(ToolResult::Ack)
        }
        ToolCall::GetPlanSummary => Ok(ToolResult::PlanSummary {
            total: plan.total_count(),
            pending: plan.pending_count(),
            complete: plan.complete_count(),
            blocked: plan.blocked_count(),
            completion_percentage: plan.completion_percentage(),
        }),
        ToolCall::GetStateSummary => Ok(ToolResult::StateSummary {
            phase: state.phase.to_string(),
            iteration: state.iteration,
            total_cost_usd: state.total_cost_usd,
            session_cost_usd: state.session_cost_usd,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (ImplementationPlan, RalphState) {
        (ImplementationPlan::new(), RalphState::new("s1"))
    }

    #[test]
    fn add_task_then_get_next_task() {
        let (mut plan, mut state) = fresh();
        dispatch(
            ToolCall::AddTask {
                id: "a".into(),
                description: "do a".into(),
                priority: 1,
                dependencies: vec![],
                verification_criteria: vec![],
            },
            &mut plan,
            &mut state,
        )
        .unwrap();

        let result = dispatch(ToolCall::GetNextTask, &mut plan, &mut state).unwrap();
        match result {
            ToolResult::NextTask { task: Some(task) } => assert_eq!(task.id, "a"),
            _ => panic!("expected a next task"),
        }
    }

    #[test]
    fn mark_task_complete_clears_current_task() {
        let (mut plan, mut state) = fresh();
        plan.add_task(Task::new("a", "x", 1)).unwrap();
        dispatch(
            ToolCall::MarkTaskInProgress { task_id: "a".into() },
            &mut plan,
            &mut state,
        )
        .unwrap();
        assert_eq!(state.current_task_id.as_deref(), Some("a"));

        dispatch(
            ToolCall::MarkTaskComplete {
                task_id: "a".into(),
                notes: None,
                tokens: None,
            },
            &mut plan,
            &mut state,
        )
        .unwrap();
        assert!(state.current_task_id.is_none());
    }

    #[test]
    fn unknown_task_id_surfaces_model_error() {
        let (mut plan, mut state) = fresh();
        let err = dispatch(
            ToolCall::MarkTaskBlocked {
                task_id: "nope".into(),
                reason: "x".into(),
            },
            &mut plan,
            &mut state,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::UnknownTask(id) if id == "nope"));
    }

    #[test]
    fn get_plan_summary_reflects_counts() {
        let (mut plan, mut state) = fresh();
        plan.add_task(Task::new("a", "x", 1)).unwrap();
        plan.add_task(Task::new("b", "y", 1)).unwrap();

        let result = dispatch(ToolCall::GetPlanSummary, &mut plan, &mut state).unwrap();
        match result {
            ToolResult::PlanSummary { total, pending, .. } => {
                assert_eq!(total, 2);
                assert_eq!(pending, 2);
            }
            _ => panic!("expected plan summary"),
        }
    }
}
