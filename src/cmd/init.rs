//! `ralph init` — scaffold `.ralph/` in a project directory.

use crate::config::RalphConfig;
use crate::store::Store;
use anyhow::{Context, Result};
use std::path::Path;
use uuid::Uuid;

/// Exit code conventions (spec.md §6): 0 on success, 2 when refusing to
/// reinitialize an already-initialized project without `--force`.
pub const EXIT_OK: i32 = 0;
pub const EXIT_ALREADY_INITIALIZED: i32 = 2;

pub fn cmd_init(project_root: &Path, force: bool) -> Result<i32> {
    let store = Store::new(project_root);
    if store.state_exists() && !force {
        println!(
            "Ralph is already initialized in {}; pass --force to reinitialize.",
            store.ralph_dir().display()
        );
        return Ok(EXIT_ALREADY_INITIALIZED);
    }

    store
        .ensure_ralph_dir()
        .context("failed to create .ralph directory")?;

    let config = RalphConfig::default();
    config
        .save(project_root)
        .context("failed to write .ralph/config.yaml")?;

    store
        .initialize_state(Uuid::new_v4().to_string())
        .context("failed to seed .ralph/state.json")?;
    store
        .initialize_plan()
        .context("failed to seed .ralph/implementation_plan.json")?;

    println!("Initialized Ralph in {}", store.ralph_dir().display());
    println!("Edit .ralph/config.yaml to configure cost limits, models, and safety rules.");
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_ralph_dir_state_and_plan() {
        let dir = tempdir().unwrap();
        let code = cmd_init(dir.path(), false).unwrap();
        assert_eq!(code, EXIT_OK);
        assert!(dir.path().join(".ralph/config.yaml").exists());
        assert!(dir.path().join(".ralph/state.json").exists());
        assert!(dir.path().join(".ralph/implementation_plan.json").exists());
    }

    #[test]
    fn init_without_force_refuses_reinit() {
        let dir = tempdir().unwrap();
        cmd_init(dir.path(), false).unwrap();
        let code = cmd_init(dir.path(), false).unwrap();
        assert_eq!(code, EXIT_ALREADY_INITIALIZED);
    }

    #[test]
    fn init_with_force_reinitializes() {
        let dir = tempdir().unwrap();
        cmd_init(dir.path(), false).unwrap();
        let code = cmd_init(dir.path(), true).unwrap();
        assert_eq!(code, EXIT_OK);
    }
}
