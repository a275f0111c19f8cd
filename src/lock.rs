//! Advisory session lock (§5, ADDED): a single `.ralph/lock` file prevents
//! two orchestrator runs from mutating the same project concurrently.

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct LockBody {
    pid: u32,
    started_at: DateTime<Utc>,
}

/// RAII guard: holding one means this process has the exclusive lock.
/// The lock is released automatically when the guard drops.
pub struct RalphLock {
    file: File,
    path: PathBuf,
}

impl RalphLock {
    /// Acquire the lock at `<ralph_dir>/lock`, failing immediately if another
    /// process already holds it (no blocking wait — a stuck lock is an
    /// operator-visible error, not something to wait out).
    pub fn acquire(ralph_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(ralph_dir)?;
        let path = ralph_dir.join("lock");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        file.try_lock_exclusive()?;

        let body = LockBody {
            pid: std::process::id(),
            started_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&body)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        Ok(Self { file, path })
    }
}

impl Drop for RalphLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_creates_lock_file_with_pid() {
        let dir = tempdir().unwrap();
        let lock = RalphLock::acquire(dir.path()).unwrap();
        let content = std::fs::read_to_string(dir.path().join("lock")).unwrap();
        assert!(content.contains(&std::process::id().to_string()));
        drop(lock);
    }

    #[test]
    fn second_acquire_in_same_process_fails_while_first_is_held() {
        let dir = tempdir().unwrap();
        let _first = RalphLock::acquire(dir.path()).unwrap();
        let second = RalphLock::acquire(dir.path());
        assert!(second.is_err());
    }

    #[test]
    fn drop_releases_lock_file() {
        let dir = tempdir().unwrap();
        {
            let _lock = RalphLock::acquire(dir.path()).unwrap();
        }
        assert!(!dir.path().join("lock").exists());
        let reacquired = RalphLock::acquire(dir.path());
        assert!(reacquired.is_ok());
    }
}
