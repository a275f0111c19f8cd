//! Implementation plan: an ordered task list plus dependency-graph invariants (C2, §3).
//!
//! Cycle detection reuses the teacher's phase-graph approach
//! (`examples/jdsingh122918-forge/src/dag/builder.rs::validate_no_cycles`),
//! adapted from phase nodes to task nodes: build an index map, compute
//! in-degrees from `dependencies`, and run Kahn's algorithm. If not every
//! node is processed, a cycle exists.

use super::task::{Task, TaskStatus};
use crate::errors::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementationPlan {
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl ImplementationPlan {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            tasks: Vec::new(),
            created_at: now,
            last_modified: now,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .count()
    }

    pub fn complete_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Complete)
            .count()
    }

    pub fn blocked_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Blocked)
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn completion_percentage(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        (self.complete_count() as f64 / self.tasks.len() as f64) * 100.0
    }

    /// Tasks with status=pending whose every dependency has status=complete.
    pub fn runnable_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending && self.dependencies_complete(t))
            .collect()
    }

    fn dependencies_complete(&self, task: &Task) -> bool {
        task.dependencies.iter().all(|dep| {
            self.get(dep)
                .map(|d| d.status == TaskStatus::Complete)
                .unwrap_or(false)
        })
    }

    /// Insert a task, enforcing id uniqueness, dependency existence, and acyclicity.
    pub fn add_task(&mut self, task: Task) -> Result<(), ModelError> {
        if self.get(&task.id).is_some() {
            return Err(ModelError::DuplicateId(task.id));
        }

        for dep in &task.dependencies {
            if dep == &task.id {
                return Err(ModelError::CycleIntroduced {
                    task_id: task.id.clone(),
                });
            }
            if self.get(dep).is_none() {
                return Err(ModelError::UnknownDependency {
                    task_id: task.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        let mut candidate_tasks = self.tasks.clone();
        candidate_tasks.push(task.clone());
        if Self::has_cycle(&candidate_tasks) {
            return Err(ModelError::CycleIntroduced { task_id: task.id });
        }

        self.tasks.push(task);
        self.last_modified = Utc::now();
        Ok(())
    }

    /// Kahn's-algorithm cycle check over the full task set, grounded on
    /// the phase-graph builder's `validate_no_cycles`.
    fn has_cycle(tasks: &[Task]) -> bool {
        let index_map: HashMap<&str, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();

        let mut in_degree = vec![0usize; tasks.len()];
        let mut forward_edges: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];

        for (to_idx, task) in tasks.iter().enumerate() {
            for dep in &task.dependencies {
                if let Some(&from_idx) = index_map.get(dep.as_str()) {
                    forward_edges[from_idx].push(to_idx);
                    in_degree[to_idx] += 1;
                }
                // Unknown dependencies are validated separately in add_task;
                // here we only care about cycles among known edges.
            }
        }

        let mut queue: Vec<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, deg)| *deg == 0)
            .map(|(i, _)| i)
            .collect();

        let mut processed = 0;
        while let Some(node) = queue.pop() {
            processed += 1;
            for &dependent in &forward_edges[node] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push(dependent);
                }
            }
        }

        processed != tasks.len()
    }

    /// Demote every `in_progress` task to `pending`. Called once at session
    /// start. Returns the number of tasks reset.
    pub fn reset_stale_in_progress_tasks(&mut self) -> usize {
        let mut count = 0;
        for task in &mut self.tasks {
            if task.reset_stale() {
                count += 1;
            }
        }
        if count > 0 {
            self.last_modified = Utc::now();
        }
        count
    }

    /// Validate acyclicity and dependency-existence of the whole plan.
    /// Used to surface `InvalidPlan` for plans loaded from disk.
    pub fn validate(&self) -> Result<(), ModelError> {
        let known: HashSet<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        for task in &self.tasks {
            for dep in &task.dependencies {
                if !known.contains(dep.as_str()) {
                    return Err(ModelError::InvalidPlan(format!(
                        "task '{}' depends on unknown task '{}'",
                        task.id, dep
                    )));
                }
            }
        }
        if Self::has_cycle(&self.tasks) {
            return Err(ModelError::InvalidPlan(
                "dependency graph contains a cycle".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ImplementationPlan {
    fn default() -> Self {
        Self::new()
    }
}
