//! `ralph tasks` — list every task in the current implementation plan.

use crate::store::Store;
use anyhow::Result;
use std::path::Path;

pub fn cmd_tasks(project_root: &Path) -> Result<()> {
    let store = Store::new(project_root);
    let plan = store.load_plan().unwrap_or_default();

    if plan.is_empty() {
        println!("No tasks yet. Run 'ralph plan' to generate an implementation plan.");
        return Ok(());
    }

    println!("{:<12} {:<10} {:<8} {:<30} Dependencies", "ID", "Status", "Retries", "Description");
    for task in &plan.tasks {
        println!(
            "{:<12} {:<10} {:<8} {:<30} {}",
            task.id,
            task.status,
            task.retry_count,
            truncate(&task.description, 30),
            task.dependencies.join(", "),
        );
    }
    println!();
    println!(
        "{} total, {} complete, {} pending, {} blocked ({:.1}%)",
        plan.total_count(),
        plan.complete_count(),
        plan.pending_count(),
        plan.blocked_count(),
        plan.completion_percentage(),
    );
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}…", &s[..max.saturating_sub(1)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;
    use tempfile::tempdir;

    #[test]
    fn tasks_with_empty_plan_does_not_error() {
        let dir = tempdir().unwrap();
        assert!(cmd_tasks(dir.path()).is_ok());
    }

    #[test]
    fn tasks_lists_existing_plan() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let mut plan = crate::model::ImplementationPlan::new();
        plan.add_task(Task::new("a", "do the thing", 1)).unwrap();
        store.save_plan(&plan).unwrap();

        assert!(cmd_tasks(dir.path()).is_ok());
    }
}
