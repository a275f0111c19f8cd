//! Task scheduler (C5, §4.5): deterministic next-task selection over an
//! [`ImplementationPlan`].

use crate::model::plan::ImplementationPlan;
use crate::model::task::Task;

/// Select the next runnable task, breaking ties by `(priority, id)` ascending
/// — lower priority number runs first, then lexicographic id order. This is
/// the single tie-break rule Ralph uses everywhere task order matters, so
/// re-running the same plan always produces the same schedule.
pub fn next_task(plan: &ImplementationPlan) -> Option<&Task> {
    plan.runnable_tasks()
        .into_iter()
        .min_by(|a, b| (a.priority, &a.id).cmp(&(b.priority, &b.id)))
}

/// Reset any `in_progress` tasks left over from a crashed or hand-off session
/// back to `pending`. Must run once at session start before scheduling.
pub fn recover_stale_tasks(plan: &mut ImplementationPlan) -> usize {
    plan.reset_stale_in_progress_tasks()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskStatus;

    fn task(id: &str, priority: i32) -> Task {
        Task::new(id, format!("task {id}"), priority)
    }

    #[test]
    fn picks_lowest_priority_then_id() {
        let mut plan = ImplementationPlan::new();
        plan.add_task(task("b", 1)).unwrap();
        plan.add_task(task("a", 1)).unwrap();
        plan.add_task(task("c", 0)).unwrap();

        assert_eq!(next_task(&plan).unwrap().id, "c");
    }

    #[test]
    fn ties_broken_by_id_ascending() {
        let mut plan = ImplementationPlan::new();
        plan.add_task(task("z", 5)).unwrap();
        plan.add_task(task("a", 5)).unwrap();

        assert_eq!(next_task(&plan).unwrap().id, "a");
    }

    #[test]
    fn no_runnable_task_returns_none() {
        let plan = ImplementationPlan::new();
        assert!(next_task(&plan).is_none());
    }

    #[test]
    fn skips_blocked_and_in_progress_tasks() {
        let mut plan = ImplementationPlan::new();
        plan.add_task(task("a", 0)).unwrap();
        plan.add_task(task("b", 1)).unwrap();
        plan.get_mut("a").unwrap().mark_in_progress().unwrap();

        assert_eq!(next_task(&plan).unwrap().id, "b");
    }

    #[test]
    fn recover_stale_tasks_returns_count_and_unblocks_scheduling() {
        let mut plan = ImplementationPlan::new();
        plan.add_task(task("a", 0)).unwrap();
        plan.get_mut("a").unwrap().mark_in_progress().unwrap();

        assert_eq!(recover_stale_tasks(&mut plan), 1);
        assert_eq!(plan.get("a").unwrap().status, TaskStatus::Pending);
        assert_eq!(next_task(&plan).unwrap().id, "a");
    }
}
