//! Verification runner (C12, ADDED): sequences user-configured backpressure
//! commands (tests/lint/types) one at a time, each with its own timeout.
//! Deliberately dumber than the Executor port — it captures output whole and
//! reports only an exit status, never parsing it.

use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct VerificationCommand {
    pub label: String,
    pub shell_command: String,
}

#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub label: String,
    pub passed: bool,
    pub output: String,
}

/// Run each command in order, stopping at the first failure (including
/// timeout). Returns every outcome observed, so a caller can report what ran
/// before the failure alongside the failure itself.
pub async fn run_sequence(
    commands: &[VerificationCommand],
    per_command_timeout: Duration,
) -> Vec<VerificationOutcome> {
    let mut outcomes = Vec::new();
    for command in commands {
        let outcome = run_one(command, per_command_timeout).await;
        let passed = outcome.passed;
        outcomes.push(outcome);
        if !passed {
            break;
        }
    }
    outcomes
}

async fn run_one(command: &VerificationCommand, per_command_timeout: Duration) -> VerificationOutcome {
    let child = Command::new("sh")
        .arg("-c")
        .arg(&command.shell_command)
        .output();

    match timeout(per_command_timeout, child).await {
        Ok(Ok(output)) => VerificationOutcome {
            label: command.label.clone(),
            passed: output.status.success(),
            output: format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            ),
        },
        Ok(Err(e)) => VerificationOutcome {
            label: command.label.clone(),
            passed: false,
            output: format!("failed to run: {e}"),
        },
        Err(_) => VerificationOutcome {
            label: command.label.clone(),
            passed: false,
            output: format!("timed out after {per_command_timeout:?}"),
        },
    }
}
