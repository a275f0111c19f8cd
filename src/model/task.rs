//! Task entity and its guarded status transitions (C2, §3).

use crate::errors::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task may only ever be in one of these four states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Complete,
    Blocked,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Complete => "complete",
            TaskStatus::Blocked => "blocked",
        };
        write!(f, "{s}")
    }
}

/// The maximum retry count before a task is force-blocked by the scheduler.
pub const MAX_RETRIES_BEFORE_BLOCK: u32 = 3;

/// A single unit of work in an [`ImplementationPlan`](super::plan::ImplementationPlan).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub priority: i32,
    pub status: TaskStatus,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub verification_criteria: Vec<String>,
    #[serde(default)]
    pub spec_refs: Vec<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub estimated_tokens: u64,
    #[serde(default)]
    pub actual_tokens: Option<u64>,
    #[serde(default)]
    pub completion_notes: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub block_reasons: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, description: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            priority,
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            verification_criteria: Vec::new(),
            spec_refs: Vec::new(),
            retry_count: 0,
            estimated_tokens: 0,
            actual_tokens: None,
            completion_notes: None,
            completed_at: None,
            block_reasons: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_verification_criteria(mut self, criteria: Vec<String>) -> Self {
        self.verification_criteria = criteria;
        self
    }

    pub fn with_estimated_tokens(mut self, tokens: u64) -> Self {
        self.estimated_tokens = tokens;
        self
    }

    /// pending -> in_progress
    pub fn mark_in_progress(&mut self) -> Result<(), ModelError> {
        self.transition_guard(TaskStatus::InProgress, &[TaskStatus::Pending])?;
        self.status = TaskStatus::InProgress;
        Ok(())
    }

    /// in_progress -> complete. Terminal.
    pub fn mark_complete(
        &mut self,
        notes: Option<String>,
        tokens: Option<u64>,
    ) -> Result<(), ModelError> {
        self.transition_guard(TaskStatus::Complete, &[TaskStatus::InProgress])?;
        self.status = TaskStatus::Complete;
        self.completion_notes = notes;
        self.actual_tokens = tokens;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// {pending, in_progress} -> blocked.
    pub fn mark_blocked(&mut self, reason: impl Into<String>) -> Result<(), ModelError> {
        self.transition_guard(
            TaskStatus::Blocked,
            &[TaskStatus::Pending, TaskStatus::InProgress],
        )?;
        self.status = TaskStatus::Blocked;
        self.block_reasons.push(reason.into());
        Ok(())
    }

    /// blocked -> pending, the only legal way back out of `Blocked`.
    pub fn unblock(&mut self) -> Result<(), ModelError> {
        self.transition_guard(TaskStatus::Pending, &[TaskStatus::Blocked])?;
        self.status = TaskStatus::Pending;
        Ok(())
    }

    /// Demote an in_progress task back to pending (session-start stale recovery, §4.2).
    /// Not gated by `transition_guard` since it is a supervisory reset, not an
    /// executor-driven transition.
    pub fn reset_stale(&mut self) -> bool {
        if self.status == TaskStatus::InProgress {
            self.status = TaskStatus::Pending;
            true
        } else {
            false
        }
    }

    /// Increment the retry counter. Forces `Blocked` once the retry cap is
    /// reached and the task is not already complete, per §4.5.
    pub fn increment_retry(&mut self) {
        self.retry_count += 1;
        if self.retry_count >= MAX_RETRIES_BEFORE_BLOCK && self.status != TaskStatus::Complete {
            self.status = TaskStatus::Blocked;
            self.block_reasons.push("max retries exceeded".to_string());
        }
    }

    fn transition_guard(
        &self,
        to: TaskStatus,
        allowed_from: &[TaskStatus],
    ) -> Result<(), ModelError> {
        if allowed_from.contains(&self.status) {
            Ok(())
        } else {
            Err(ModelError::InvalidTransition {
                task_id: self.id.clone(),
                from: self.status.to_string(),
                to: to.to_string(),
            })
        }
    }
}
