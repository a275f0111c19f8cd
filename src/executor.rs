//! Executor port (C11, §4.11): the abstract boundary between the
//! orchestrator and whatever drives the actual LLM coding agent.
//!
//! `Executor` is the contract; `ProcessExecutor` is the one concrete adapter
//! shipped here, grounded in the subprocess-spawning pattern from
//! `orchestrator/runner.rs` — it spawns a configurable CLI, writes the
//! assembled prompt to stdin, and reads newline-delimited JSON events from
//! stdout.

use crate::errors::ExecutorError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

/// One completed executor call.
#[derive(Debug, Clone, Default)]
pub struct IterationResult {
    pub success: bool,
    pub output: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub error: Option<String>,
}

/// A single request to run one iteration.
pub struct IterationRequest {
    pub prompt: String,
    pub allowed_tools: Vec<String>,
    pub max_turns: u32,
    pub timeout: Duration,
}

/// The abstract contract the orchestrator drives. Implementations are
/// stateless from call to call — all state lives in the orchestrator and
/// the store.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn run_iteration(&self, request: IterationRequest) -> Result<IterationResult, ExecutorError>;
}

/// Newline-delimited JSON event shape read from the executor process's
/// stdout, grounded on `stream::StreamEvent`'s tagged-variant parsing.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ExecutorEvent {
    #[serde(rename = "assistant")]
    Assistant { message: AssistantMessage },
    #[serde(rename = "result")]
    Result {
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        usage: Option<Usage>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Spawns `cmd` as a child process per iteration.
pub struct ProcessExecutor {
    cmd: String,
    working_dir: std::path::PathBuf,
}

impl ProcessExecutor {
    pub fn new(cmd: impl Into<String>, working_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            working_dir: working_dir.into(),
        }
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn run_iteration(
        &self,
        request: IterationRequest,
    ) -> Result<IterationResult, ExecutorError> {
        let iteration_timeout = request.timeout;
        match timeout(iteration_timeout, self.spawn_and_read(request)).await {
            Ok(result) => result,
            Err(_) => Err(ExecutorError::TimedOut(iteration_timeout)),
        }
    }
}

impl ProcessExecutor {
    async fn spawn_and_read(
        &self,
        request: IterationRequest,
    ) -> Result<IterationResult, ExecutorError> {
        let mut child = Command::new(&self.cmd)
            .arg("--print")
            .arg("--output-format")
            .arg("stream-json")
            .arg("--max-turns")
            .arg(request.max_turns.to_string())
            .arg("--allowed-tools")
            .arg(request.allowed_tools.join(","))
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .current_dir(&self.working_dir)
            .spawn()
            .map_err(ExecutorError::SpawnFailed)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.prompt.as_bytes())
                .await
                .map_err(|e| ExecutorError::Transport(e.to_string()))?;
            stdin
                .shutdown()
                .await
                .map_err(|e| ExecutorError::Transport(e.to_string()))?;
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExecutorError::Transport("missing stdout".to_string()))?;
        let mut reader = BufReader::new(stdout).lines();

        let mut output = String::new();
        let mut success = true;
        let mut error = None;
        let mut input_tokens = 0;
        let mut output_tokens = 0;

        while let Some(line) = reader
            .next_line()
            .await
            .map_err(|e| ExecutorError::Transport(e.to_string()))?
        {
            if line.trim().is_empty() {
                continue;
            }
            let Ok(event) = serde_json::from_str::<ExecutorEvent>(&line) else {
                continue;
            };
            match event {
                ExecutorEvent::Assistant { message } => {
                    for block in message.content {
                        if let ContentBlock::Text { text } = block {
                            output.push_str(&text);
                            output.push('\n');
                        }
                    }
                }
                ExecutorEvent::Result {
                    is_error,
                    result,
                    usage,
                } => {
                    success = !is_error;
                    if is_error {
                        error = result;
                    }
                    if let Some(usage) = usage {
                        input_tokens = usage.input_tokens;
                        output_tokens = usage.output_tokens;
                    }
                }
                ExecutorEvent::Other => {}
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;
        if !status.success() && error.is_none() {
            success = false;
            error = Some(format!("executor process exited with status {status}"));
        }

        Ok(IterationResult {
            success,
            output,
            input_tokens,
            output_tokens,
            error,
        })
    }
}
