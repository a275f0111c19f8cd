//! Safety validator (C7, §4.7): a pure function from a proposed tool call to
//! an allow/deny decision. No I/O, no state — every rule is a fixed literal
//! prefix check so the validator stays trivially unit-testable.

use crate::phase::Phase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Destructive version-control verbs that are always denied regardless of
/// phase or configuration (§4.7 point 2: commit, push, pull, merge, rebase,
/// checkout, reset, stash, cherry-pick, revert, branch deletion).
const DESTRUCTIVE_VCS_PREFIXES: &[&str] = &[
    "git commit",
    "git push",
    "git pull",
    "git merge",
    "git rebase",
    "git checkout",
    "git reset",
    "git stash",
    "git cherry-pick",
    "git revert",
    "git branch -D",
    "git branch -d",
];

/// git subcommands that are always allowed — read-only inspection, listing
/// only for `branch` (§4.7 point 3).
const READ_ONLY_GIT_PREFIXES: &[&str] = &[
    "git status",
    "git log",
    "git diff",
    "git show",
    "git ls-files",
    "git blame",
    "git branch",
];

/// Package-manager invocations that mutate the Python dependency
/// environment (§4.7 point 2).
const FORBIDDEN_PACKAGE_MANAGER_PREFIXES: &[&str] = &[
    "pip install",
    "pip uninstall",
    "pip freeze",
    "python -m pip",
    "python -m venv",
    "virtualenv",
    "conda install",
    "conda create",
    "poetry install",
    "poetry add",
    "pipenv install",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default)]
    pub extra_blocked_prefixes: Vec<String>,
}

/// Validate a proposed tool call. `tool_name` identifies the Tool Surface
/// (C8) operation; `command` is the literal shell command when the tool is
/// `run_command`-like, and empty otherwise.
pub fn validate(
    tool_name: &str,
    command: &str,
    phase: Phase,
    config: &SafetyConfig,
) -> Decision {
    if !phase.allowed_tools().contains(&tool_name) {
        return Decision::Deny {
            reason: format!("tool '{tool_name}' is not permitted in phase '{phase}'"),
        };
    }

    if command.is_empty() {
        return Decision::Allow;
    }

    // Destructive verbs are checked before the read-only allowlist: e.g.
    // "git branch -D" must not fall through to the "git branch" allowance.
    if has_prefix(command, DESTRUCTIVE_VCS_PREFIXES) {
        return Decision::Deny {
            reason: "version-control state changes not permitted".to_string(),
        };
    }

    if has_prefix(command, READ_ONLY_GIT_PREFIXES) {
        return Decision::Allow;
    }

    if has_prefix(command, FORBIDDEN_PACKAGE_MANAGER_PREFIXES) {
        return Decision::Deny {
            reason: "use the designated package manager instead".to_string(),
        };
    }

    let extra: Vec<&str> = config
        .extra_blocked_prefixes
        .iter()
        .map(|s| s.as_str())
        .collect();
    if has_prefix(command, &extra) {
        return Decision::Deny {
            reason: "command in configured blocklist".to_string(),
        };
    }

    Decision::Allow
}

fn has_prefix(command: &str, prefixes: &[&str]) -> bool {
    let normalized = command.trim();
    prefixes.iter().any(|prefix| normalized.starts_with(prefix))
}
