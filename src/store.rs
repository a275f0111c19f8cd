//! Durable state store (C1, §4.1): atomic JSON persistence under `.ralph/`.
//!
//! Every write goes through the same pattern — serialize, write to a
//! same-directory temp file, fsync, then atomically rename over the target —
//! so a crash mid-write never leaves a corrupted `state.json` behind.

use crate::errors::StoreError;
use crate::model::{ImplementationPlan, Injection, RalphState};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{BufRead, Write as _};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const RALPH_DIR: &str = ".ralph";
const STATE_FILE: &str = "state.json";
const PLAN_FILE: &str = "implementation_plan.json";
const INJECTIONS_FILE: &str = "injections.json";
const SESSIONS_FILE: &str = "sessions.jsonl";

/// A thin handle over `<project_root>/.ralph`.
#[derive(Debug, Clone)]
pub struct Store {
    ralph_dir: PathBuf,
}

impl Store {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            ralph_dir: project_root.as_ref().join(RALPH_DIR),
        }
    }

    pub fn ralph_dir(&self) -> &Path {
        &self.ralph_dir
    }

    pub fn ensure_ralph_dir(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.ralph_dir)?;
        Ok(())
    }

    fn path(&self, file: &str) -> PathBuf {
        self.ralph_dir.join(file)
    }

    pub fn state_exists(&self) -> bool {
        self.path(STATE_FILE).exists()
    }

    pub fn load_state(&self) -> Result<RalphState, StoreError> {
        load_json(&self.path(STATE_FILE))
    }

    pub fn save_state(&self, state: &RalphState) -> Result<(), StoreError> {
        self.ensure_ralph_dir()?;
        atomic_write_json(&self.ralph_dir, &self.path(STATE_FILE), state)
    }

    /// Seed a fresh `state.json` for `session_id` and persist it.
    pub fn initialize_state(&self, session_id: impl Into<String>) -> Result<RalphState, StoreError> {
        let state = RalphState::new(session_id);
        self.save_state(&state)?;
        Ok(state)
    }

    pub fn exists_plan(&self) -> bool {
        self.path(PLAN_FILE).exists()
    }

    pub fn load_plan(&self) -> Result<ImplementationPlan, StoreError> {
        load_json(&self.path(PLAN_FILE))
    }

    pub fn save_plan(&self, plan: &ImplementationPlan) -> Result<(), StoreError> {
        self.ensure_ralph_dir()?;
        atomic_write_json(&self.ralph_dir, &self.path(PLAN_FILE), plan)
    }

    /// Seed an empty `implementation_plan.json` and persist it.
    pub fn initialize_plan(&self) -> Result<ImplementationPlan, StoreError> {
        let plan = ImplementationPlan::new();
        self.save_plan(&plan)?;
        Ok(plan)
    }

    pub fn load_injections(&self) -> Result<Vec<Injection>, StoreError> {
        if !self.path(INJECTIONS_FILE).exists() {
            return Ok(Vec::new());
        }
        load_json(&self.path(INJECTIONS_FILE))
    }

    pub fn save_injections(&self, injections: &[Injection]) -> Result<(), StoreError> {
        self.ensure_ralph_dir()?;
        atomic_write_json(&self.ralph_dir, &self.path(INJECTIONS_FILE), &injections)
    }

    /// Append one newline-delimited JSON record to `sessions.jsonl`. Unlike
    /// the other state files this is append-only and not rewritten
    /// atomically — a partial trailing line is tolerated by the reader.
    pub fn append_session_record<T: Serialize>(&self, record: &T) -> Result<(), StoreError> {
        self.ensure_ralph_dir()?;
        let line = serde_json::to_string(record)
            .map_err(|e| StoreError::CorruptedState {
                path: self.path(SESSIONS_FILE),
                message: e.to_string(),
            })?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(SESSIONS_FILE))?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    pub fn load_session_records<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        let path = self.path(SESSIONS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&path)?;
        let reader = std::io::BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(_) => continue, // tolerate a partial trailing write
            }
        }
        Ok(records)
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Err(StoreError::StateNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| StoreError::CorruptedState {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write-temp-in-same-directory, fsync, atomic rename.
fn atomic_write_json<T: Serialize>(
    dir: &Path,
    target: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::CorruptedState {
        path: target.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_load_state_round_trips() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let state = RalphState::new("session-1");
        store.save_state(&state).unwrap();

        let loaded = store.load_state().unwrap();
        assert_eq!(loaded.session_id, "session-1");
        assert_eq!(loaded.iteration, 0);
    }

    #[test]
    fn load_state_missing_file_is_state_not_found() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let err = store.load_state().unwrap_err();
        assert!(matches!(err, StoreError::StateNotFound { .. }));
    }

    #[test]
    fn load_state_corrupted_file_is_corrupted_state() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store.ensure_ralph_dir().unwrap();
        std::fs::write(store.ralph_dir().join(STATE_FILE), "{ not json").unwrap();
        let err = store.load_state().unwrap_err();
        assert!(matches!(err, StoreError::CorruptedState { .. }));
    }

    #[test]
    fn save_plan_is_atomic_and_survives_reload() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let mut plan = ImplementationPlan::new();
        plan.add_task(crate::model::Task::new("a", "do a", 1)).unwrap();
        store.save_plan(&plan).unwrap();

        let loaded = store.load_plan().unwrap();
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.tasks[0].id, "a");
    }

    #[test]
    fn session_records_append_and_reload_in_order() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store.append_session_record(&"first").unwrap();
        store.append_session_record(&"second").unwrap();

        let records: Vec<String> = store.load_session_records().unwrap();
        assert_eq!(records, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn initialize_state_seeds_and_persists() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let state = store.initialize_state("s1").unwrap();
        assert_eq!(state.session_id, "s1");
        assert!(store.state_exists());
    }

    #[test]
    fn initialize_plan_seeds_empty_plan() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let plan = store.initialize_plan().unwrap();
        assert_eq!(plan.total_count(), 0);
        assert!(store.exists_plan());
    }

    #[test]
    fn load_injections_defaults_to_empty_when_absent() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        assert!(store.load_injections().unwrap().is_empty());
    }
}
