use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ralph::cmd;

#[derive(Parser)]
#[command(name = "ralph")]
#[command(version, about = "Deterministic supervisory harness for an LLM coding agent")]
pub struct Cli {
    /// Project root; defaults to the current directory.
    #[arg(long, global = true)]
    pub project_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold `.ralph/` in the project directory.
    Init {
        /// Reinitialize even if `.ralph/` already holds a session.
        #[arg(long)]
        force: bool,
    },
    /// Drive the iteration loop through every phase until hand-off or halt.
    Run,
    /// Run iterations pinned to the discovery phase.
    Discover,
    /// Run iterations pinned to the planning phase.
    Plan,
    /// Run iterations pinned to the building phase.
    Build,
    /// Run iterations pinned to the validation phase.
    Validate,
    /// Print the current session and circuit breaker status.
    Status,
    /// List every task in the current implementation plan.
    Tasks,
    /// Print the append-only session history log.
    History,
    /// Pause the session before its next iteration.
    Pause,
    /// Resume a paused or halted session.
    Resume,
    /// Mark a task blocked, skipping it.
    Skip {
        task_id: String,
    },
    /// Queue a message to be folded into the next iteration's prompt.
    Inject {
        message: String,
    },
    /// Force a hand-off: rotate the session id and record the reason.
    Handoff {
        #[arg(long, default_value = "manual hand-off")]
        reason: String,
    },
    /// Discard the current implementation plan and regenerate it.
    RegeneratePlan,
    /// Close the circuit breaker and unpause the session.
    Reset,
    /// Remove `.ralph/`, wiping all session state.
    Clean,
    /// Print the active memory block folded into the next prompt.
    Memory,
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_env("RALPH_LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let project_root = match cli.project_root.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to get current directory")?,
    };

    let exit_code = match &cli.command {
        Commands::Init { force } => cmd::cmd_init(&project_root, *force)?,
        Commands::Run => cmd::cmd_run(&project_root).await?,
        Commands::Discover => cmd::cmd_discover(&project_root).await?,
        Commands::Plan => cmd::cmd_plan(&project_root).await?,
        Commands::Build => cmd::cmd_build(&project_root).await?,
        Commands::Validate => cmd::cmd_validate(&project_root).await?,
        Commands::Status => {
            cmd::cmd_status(&project_root)?;
            0
        }
        Commands::Tasks => {
            cmd::cmd_tasks(&project_root)?;
            0
        }
        Commands::History => {
            cmd::cmd_history(&project_root)?;
            0
        }
        Commands::Pause => {
            cmd::cmd_pause(&project_root)?;
            0
        }
        Commands::Resume => {
            cmd::cmd_resume(&project_root)?;
            0
        }
        Commands::Skip { task_id } => {
            cmd::cmd_skip(&project_root, task_id)?;
            0
        }
        Commands::Inject { message } => {
            cmd::cmd_inject(&project_root, message)?;
            0
        }
        Commands::Handoff { reason } => {
            cmd::cmd_handoff(&project_root, reason)?;
            0
        }
        Commands::RegeneratePlan => {
            cmd::cmd_regenerate_plan(&project_root)?;
            0
        }
        Commands::Reset => {
            cmd::cmd_reset(&project_root)?;
            0
        }
        Commands::Clean => {
            cmd::cmd_clean(&project_root)?;
            0
        }
        Commands::Memory => {
            cmd::cmd_memory(&project_root)?;
            0
        }
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
