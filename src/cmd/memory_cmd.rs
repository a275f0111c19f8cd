//! `ralph memory` — print the active memory block that would be folded
//! into the next iteration's prompt.

use crate::config::RalphConfig;
use crate::memory::MemoryStore;
use anyhow::Result;
use std::path::Path;

pub fn cmd_memory(project_root: &Path) -> Result<()> {
    let config = RalphConfig::load(project_root)?;
    let memory = MemoryStore::new(project_root);
    let active = memory.build_active_memory(config.context.max_active_memory_chars)?;

    if active.trim().is_empty() {
        println!("No memory recorded yet.");
        return Ok(());
    }
    println!("{active}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_with_nothing_recorded_does_not_error() {
        let dir = tempdir().unwrap();
        assert!(cmd_memory(dir.path()).is_ok());
    }

    #[test]
    fn memory_prints_recorded_note() {
        let dir = tempdir().unwrap();
        let memory = MemoryStore::new(dir.path());
        memory
            .write(&crate::memory::MemoryRecord::iteration(1, "note".into()))
            .unwrap();
        assert!(cmd_memory(dir.path()).is_ok());
    }
}
