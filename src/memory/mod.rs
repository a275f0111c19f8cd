//! Memory subsystem (C6, §4.6): structured markdown notes that double as
//! both a human-readable log and the text Ralph folds back into the next
//! iteration's prompt.

mod record;

pub use record::MemoryRecord;

use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub const MAX_ITERATION_MEMORIES: usize = 20;
pub const MAX_SESSION_MEMORIES: usize = 10;
pub const ARCHIVE_RETENTION_DAYS: i64 = 30;
pub const DEFAULT_MAX_ACTIVE_MEMORY_CHARS: usize = 8000;

/// A handle over `<project_root>/.ralph/memory`.
pub struct MemoryStore {
    root: PathBuf,
}

impl MemoryStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root: project_root.as_ref().join(".ralph").join("memory"),
        }
    }

    fn dir(&self, sub: &str) -> PathBuf {
        self.root.join(sub)
    }

    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        for sub in ["iterations", "phases", "sessions", "archive"] {
            std::fs::create_dir_all(self.dir(sub))?;
        }
        Ok(())
    }

    /// Write one memory record to its type-specific directory, then rotate
    /// older records of the same type past the retention cap into `archive/`.
    pub fn write(&self, record: &MemoryRecord) -> Result<(), StoreError> {
        self.ensure_dirs()?;
        let (sub, cap) = match record {
            MemoryRecord::Iteration { .. } => ("iterations", MAX_ITERATION_MEMORIES),
            MemoryRecord::Phase { .. } => ("phases", usize::MAX),
            MemoryRecord::Session { .. } => ("sessions", MAX_SESSION_MEMORIES),
        };
        let dir = self.dir(sub);
        let filename = record.filename();
        std::fs::write(dir.join(&filename), record.render_markdown())?;
        self.rotate(sub, cap)?;
        self.prune_archive()?;
        Ok(())
    }

    /// Delete `archive/` entries older than [`ARCHIVE_RETENTION_DAYS`],
    /// judged by filesystem modification time (§4.6/§3).
    fn prune_archive(&self) -> Result<(), StoreError> {
        let archive_dir = self.dir("archive");
        if !archive_dir.exists() {
            return Ok(());
        }
        let cutoff = Utc::now() - chrono::Duration::days(ARCHIVE_RETENTION_DAYS);
        for entry in std::fs::read_dir(&archive_dir)?.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let modified: DateTime<Utc> = entry.metadata()?.modified()?.into();
            if modified < cutoff {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Move the oldest files in `sub` beyond `cap` into `archive/`.
    fn rotate(&self, sub: &str, cap: usize) -> Result<(), StoreError> {
        if cap == usize::MAX {
            return Ok(());
        }
        let dir = self.dir(sub);
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        entries.sort();

        if entries.len() <= cap {
            return Ok(());
        }
        let overflow = entries.len() - cap;
        let archive_dir = self.dir("archive");
        std::fs::create_dir_all(&archive_dir)?;
        for path in entries.into_iter().take(overflow) {
            if let Some(name) = path.file_name() {
                let dest = archive_dir.join(name);
                std::fs::rename(&path, dest)?;
            }
        }
        Ok(())
    }

    /// Compose the "active memory" block folded into the next prompt:
    /// the most recent records across all three types, concatenated newest
    /// first, truncated to `max_chars`.
    pub fn build_active_memory(&self, max_chars: usize) -> Result<String, StoreError> {
        let mut sections = Vec::new();
        for sub in ["sessions", "phases", "iterations"] {
            let dir = self.dir(sub);
            if !dir.exists() {
                continue;
            }
            let mut entries: Vec<PathBuf> = std::fs::read_dir(&dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect();
            entries.sort();
            entries.reverse();
            for path in entries {
                sections.push(std::fs::read_to_string(&path)?);
            }
        }

        let mut combined = sections.join("\n---\n");
        if combined.len() > max_chars {
            combined.truncate(max_chars);
        }
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_creates_file_and_directories() {
        let dir = tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        let record = MemoryRecord::iteration(1, "learned the schema uses snake_case".into());
        store.write(&record).unwrap();

        let iter_dir = dir.path().join(".ralph/memory/iterations");
        assert_eq!(std::fs::read_dir(&iter_dir).unwrap().count(), 1);
    }

    #[test]
    fn rotate_archives_oldest_iteration_memories_past_cap() {
        let dir = tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        for i in 0..(MAX_ITERATION_MEMORIES + 3) {
            let record = MemoryRecord::iteration(i as u64, format!("note {i}"));
            store.write(&record).unwrap();
        }

        let iter_dir = dir.path().join(".ralph/memory/iterations");
        let archive_dir = dir.path().join(".ralph/memory/archive");
        assert_eq!(
            std::fs::read_dir(&iter_dir).unwrap().count(),
            MAX_ITERATION_MEMORIES
        );
        assert_eq!(std::fs::read_dir(&archive_dir).unwrap().count(), 3);
    }

    #[test]
    fn prune_archive_deletes_entries_older_than_retention() {
        let dir = tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        store.ensure_dirs().unwrap();

        let archive_dir = dir.path().join(".ralph/memory/archive");
        let old_path = archive_dir.join("old.md");
        std::fs::write(&old_path, "old").unwrap();
        let old_time =
            std::time::SystemTime::now() - std::time::Duration::from_secs(31 * 24 * 3600);
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(&old_path)
            .unwrap();
        file.set_modified(old_time).unwrap();

        store
            .write(&MemoryRecord::iteration(1, "new".into()))
            .unwrap();

        assert!(!old_path.exists());
    }

    #[test]
    fn build_active_memory_truncates_to_max_chars() {
        let dir = tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        store
            .write(&MemoryRecord::iteration(1, "a".repeat(100)))
            .unwrap();

        let active = store.build_active_memory(10).unwrap();
        assert_eq!(active.len(), 10);
    }
}
