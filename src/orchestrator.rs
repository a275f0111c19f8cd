//! Iteration orchestrator (C10, §4.10): the single loop that ties every
//! other component together — pre-iteration setup, prompt assembly, the
//! executor call, post-iteration accounting, and the recovery/halt decision.

use crate::accountant::{self, ContextBudget, CostLimits};
use crate::circuit_breaker;
use crate::config::RalphConfig;
use crate::errors::BudgetError;
use crate::executor::{Executor, IterationRequest, IterationResult};
use crate::memory::{MemoryRecord, MemoryStore};
use crate::model::{ImplementationPlan, RalphState};
use crate::phase::{self, Phase};
use crate::scheduler;
use crate::store::Store;
use crate::verify::{self, VerificationCommand};
use std::time::Duration;
use uuid::Uuid;

/// What the orchestrator should do after an iteration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    Retry,
    SkipTask { task_id: String },
    Handoff { reason: String },
    ManualIntervention { reason: String },
}

/// Pure decision function, per §4.10 / SPEC_FULL.md §9's recorded Open
/// Question decision. `failure_reason` is `None` on success.
pub fn recovery_action(
    failure_reason: Option<&str>,
    current_task_id: Option<&str>,
    retry_count: u32,
    max_retries: u32,
    circuit_breaker_open: bool,
    context_over_smart_zone: bool,
) -> RecoveryAction {
    if circuit_breaker_open {
        return RecoveryAction::ManualIntervention {
            reason: failure_reason.unwrap_or("circuit breaker open").to_string(),
        };
    }
    if context_over_smart_zone {
        return RecoveryAction::Handoff {
            reason: "context budget crossed smart zone".to_string(),
        };
    }
    if failure_reason.is_some() && retry_count >= max_retries {
        if let Some(task_id) = current_task_id {
            return RecoveryAction::SkipTask {
                task_id: task_id.to_string(),
            };
        }
    }
    RecoveryAction::Retry
}

pub struct Orchestrator {
    project_root: std::path::PathBuf,
    store: Store,
    memory: MemoryStore,
    config: RalphConfig,
    executor: Box<dyn Executor>,
}

impl Orchestrator {
    pub fn new(
        project_root: impl Into<std::path::PathBuf>,
        config: RalphConfig,
        executor: Box<dyn Executor>,
    ) -> Self {
        let project_root = project_root.into();
        Self {
            store: Store::new(&project_root),
            memory: MemoryStore::new(&project_root),
            project_root,
            config,
            executor,
        }
    }

    /// Load or initialize session state, resetting any stale in-progress
    /// tasks left over from a crash or hand-off.
    pub fn load_or_init(&self) -> anyhow::Result<(RalphState, ImplementationPlan)> {
        self.store.ensure_ralph_dir()?;
        let mut plan = self.store.load_plan().unwrap_or_else(|_| ImplementationPlan::new());
        scheduler::recover_stale_tasks(&mut plan);

        let state = if self.store.state_exists() {
            self.store.load_state()?
        } else {
            RalphState::new(Uuid::new_v4().to_string())
        };

        Ok((state, plan))
    }

    fn context_budget(&self) -> ContextBudget {
        ContextBudget::new(
            self.config.context.total_capacity,
            self.config.context.safety_margin,
            self.config.context.smart_zone_fraction,
        )
    }

    fn cost_limits(&self) -> CostLimits {
        self.config.cost_limits
    }

    /// Assemble the prompt for one iteration: active memory plus a plan/phase
    /// summary. The actual prompt template text is out of scope (§1); this
    /// produces the structured context the template would be filled with.
    pub fn build_prompt(&self, state: &RalphState, plan: &ImplementationPlan) -> anyhow::Result<String> {
        let active_memory = self
            .memory
            .build_active_memory(self.config.context.max_active_memory_chars)?;
        let next_task = scheduler::next_task(plan);
        Ok(format!(
            "phase={phase}\niteration={iteration}\nnext_task={next_task:?}\n\n{memory}",
            phase = state.phase,
            iteration = state.iteration,
            next_task = next_task.map(|t| t.id.as_str()),
            memory = active_memory,
        ))
    }

    /// Run exactly one iteration: assemble the prompt, call the executor,
    /// account for cost/context, update the circuit breaker, and persist
    /// everything. Returns the recovery action the caller should act on.
    pub async fn run_one_iteration(
        &self,
        state: &mut RalphState,
        plan: &mut ImplementationPlan,
    ) -> anyhow::Result<RecoveryAction> {
        if state.paused {
            return Ok(RecoveryAction::ManualIntervention {
                reason: "session is paused".to_string(),
            });
        }
        if !circuit_breaker::may_proceed(&state.circuit_breaker) {
            return Ok(RecoveryAction::ManualIntervention {
                reason: state
                    .circuit_breaker
                    .last_halt_reason
                    .clone()
                    .unwrap_or_else(|| "circuit breaker open".to_string()),
            });
        }

        let prompt = self.build_prompt(state, plan)?;
        let request = IterationRequest {
            prompt,
            allowed_tools: state
                .phase
                .allowed_tools()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_turns: 30,
            timeout: Duration::from_secs(600),
        };

        let result = self.executor.run_iteration(request).await;
        let iteration_result = match result {
            Ok(r) => r,
            Err(e) => IterationResult {
                success: false,
                error: Some(e.to_string()),
                ..Default::default()
            },
        };

        let tasks_before = plan.complete_count();
        let cost = accountant::iteration_cost_usd(
            &self.config.primary_model,
            iteration_result.input_tokens,
            iteration_result.output_tokens,
        );
        state.record_usage(cost, iteration_result.input_tokens, iteration_result.output_tokens);
        state.advance_iteration();

        if state.phase == Phase::Discovery && !iteration_result.output.trim().is_empty() {
            state.has_discovery_notes = true;
        }

        self.memory.write(&MemoryRecord::iteration(
            state.iteration,
            iteration_result.output.clone(),
        ))?;

        let progressed = plan.complete_count() > tasks_before;
        let mut halt_reason = circuit_breaker::record_outcome(
            &mut state.circuit_breaker,
            iteration_result.success,
            progressed,
        );

        if let Err(budget_err) = self.check_budget(state, cost) {
            circuit_breaker::record_cost_breach(&mut state.circuit_breaker, budget_err.reason());
            halt_reason = Some(budget_err.reason());
        }

        let context_over_smart_zone = self.context_budget().should_handoff(state.session_tokens_used);
        if context_over_smart_zone {
            self.perform_handoff(state, "context budget crossed smart zone")?;
        }

        if self.phase_complete(state, plan).await? {
            if let Some(next) = state.phase.next() {
                state.phase = next;
            }
        } else if state.phase == Phase::Validation {
            state.phase = state.phase.on_verification_failed();
        }

        self.store.save_state(state)?;
        self.store.save_plan(plan)?;

        Ok(recovery_action(
            halt_reason.as_deref().or(iteration_result.error.as_deref()),
            state.current_task_id.as_deref(),
            plan
                .get(state.current_task_id.as_deref().unwrap_or_default())
                .map(|t| t.retry_count)
                .unwrap_or(0),
            crate::model::task::MAX_RETRIES_BEFORE_BLOCK,
            !circuit_breaker::may_proceed(&state.circuit_breaker),
            context_over_smart_zone,
        ))
    }

    fn check_budget(&self, state: &RalphState, iteration_cost: f64) -> Result<(), BudgetError> {
        accountant::check_cost_limits(
            &self.cost_limits(),
            iteration_cost,
            state.session_cost_usd,
            state.total_cost_usd,
        )
    }

    async fn phase_complete(&self, state: &RalphState, plan: &ImplementationPlan) -> anyhow::Result<bool> {
        let pending_or_in_progress = plan.pending_count()
            + plan
                .tasks
                .iter()
                .filter(|t| t.status == crate::model::TaskStatus::InProgress)
                .count();
        let verification_passed = if state.phase == Phase::Validation {
            self.run_verification().await?
        } else {
            false
        };
        Ok(phase::completion_predicate(
            state.phase,
            state.has_discovery_notes,
            plan.total_count(),
            pending_or_in_progress,
            verification_passed,
        ))
    }

    /// Run the configured validation-phase commands (C12). With no commands
    /// configured there is nothing to verify, so validation passes
    /// vacuously.
    async fn run_verification(&self) -> anyhow::Result<bool> {
        let commands: Vec<VerificationCommand> = self
            .config
            .phases
            .validation
            .commands
            .iter()
            .map(|c| VerificationCommand {
                label: c.label.clone(),
                shell_command: c.command.clone(),
            })
            .collect();
        if commands.is_empty() {
            return Ok(true);
        }
        let outcomes = verify::run_sequence(&commands, verify::DEFAULT_TIMEOUT).await;
        Ok(outcomes.len() == commands.len() && outcomes.iter().all(|o| o.passed))
    }

    /// Rotate the session id, archive a record of the closing session, and
    /// zero the session-scoped usage counters, preserving lifetime totals
    /// (spec.md §8 scenario 4).
    fn perform_handoff(&self, state: &mut RalphState, reason: &str) -> anyhow::Result<()> {
        let record = serde_json::json!({
            "session_id": state.session_id,
            "ended_at": chrono::Utc::now().to_rfc3339(),
            "iteration": state.iteration,
            "phase": state.phase.to_string(),
            "session_cost_usd": state.session_cost_usd,
            "session_tokens_used": state.session_tokens_used,
            "handoff_reason": reason,
        });
        self.store.append_session_record(&record)?;
        state.handoff_reason = Some(reason.to_string());
        state.session_id = Uuid::new_v4().to_string();
        state.reset_session_usage();
        state.touch();
        Ok(())
    }

    pub fn project_root(&self) -> &std::path::Path {
        &self.project_root
    }
}
