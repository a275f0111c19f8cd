//! The three memory record variants (C6, §3): iteration, phase, and session.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum MemoryRecord {
    Iteration {
        iteration: u64,
        note: String,
        recorded_at: DateTime<Utc>,
    },
    Phase {
        phase: String,
        summary: String,
        recorded_at: DateTime<Utc>,
    },
    Session {
        session_id: String,
        summary: String,
        recorded_at: DateTime<Utc>,
    },
}

impl MemoryRecord {
    pub fn iteration(iteration: u64, note: String) -> Self {
        MemoryRecord::Iteration {
            iteration,
            note,
            recorded_at: Utc::now(),
        }
    }

    pub fn phase(phase: impl Into<String>, summary: String) -> Self {
        MemoryRecord::Phase {
            phase: phase.into(),
            summary,
            recorded_at: Utc::now(),
        }
    }

    pub fn session(session_id: impl Into<String>, summary: String) -> Self {
        MemoryRecord::Session {
            session_id: session_id.into(),
            summary,
            recorded_at: Utc::now(),
        }
    }

    /// A filename that sorts chronologically within its directory — except
    /// for `Phase`, which is keyed only by phase name so that re-entering a
    /// phase overwrites its prior record rather than accumulating one file
    /// per transition (§4.6).
    pub fn filename(&self) -> String {
        match self {
            MemoryRecord::Iteration {
                iteration,
                recorded_at,
                ..
            } => format!("{}-iter-{:06}.md", recorded_at.timestamp(), iteration),
            MemoryRecord::Phase { phase, .. } => format!("{phase}.md"),
            MemoryRecord::Session {
                session_id,
                recorded_at,
                ..
            } => format!("{}-{}.md", recorded_at.timestamp(), session_id),
        }
    }

    /// Render as the structured markdown folded into prompts, per §4.6.
    pub fn render_markdown(&self) -> String {
        match self {
            MemoryRecord::Iteration {
                iteration,
                note,
                recorded_at,
            } => format!(
                "## Iteration {iteration} ({recorded_at})\n\n{note}\n",
                recorded_at = recorded_at.to_rfc3339()
            ),
            MemoryRecord::Phase {
                phase,
                summary,
                recorded_at,
            } => format!(
                "## Phase: {phase} ({recorded_at})\n\n{summary}\n",
                recorded_at = recorded_at.to_rfc3339()
            ),
            MemoryRecord::Session {
                session_id,
                summary,
                recorded_at,
            } => format!(
                "## Session {session_id} ({recorded_at})\n\n{summary}\n",
                recorded_at = recorded_at.to_rfc3339()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_record_renders_heading_and_note() {
        let record = MemoryRecord::iteration(3, "fixed the parser".into());
        let rendered = record.render_markdown();
        assert!(rendered.starts_with("## Iteration 3"));
        assert!(rendered.contains("fixed the parser"));
    }

    #[test]
    fn filenames_differ_across_variants() {
        let iteration = MemoryRecord::iteration(1, "x".into());
        let phase = MemoryRecord::phase("building", "x".into());
        assert_ne!(iteration.filename(), phase.filename());
    }

    #[test]
    fn phase_filename_is_stable_across_recordings() {
        let first = MemoryRecord::phase("building", "entered building".into());
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = MemoryRecord::phase("building", "re-entered building".into());
        assert_eq!(first.filename(), second.filename());
    }
}
