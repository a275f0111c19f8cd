//! Configuration (ADDED ambient stack, §6): `.ralph/config.yaml`, loaded with
//! `serde_yaml` into a typed struct with a sensible `Default`, the same
//! shape the teacher's configuration layer uses for its own TOML file.

use crate::accountant::CostLimits;
use crate::safety::SafetyConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    #[serde(default = "default_max_stagnation")]
    pub max_stagnation: u32,
}

fn default_max_consecutive_failures() -> u32 {
    crate::circuit_breaker::MAX_CONSECUTIVE_FAILURES
}

fn default_max_stagnation() -> u32 {
    crate::circuit_breaker::MAX_STAGNATION
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: default_max_consecutive_failures(),
            max_stagnation: default_max_stagnation(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_total_capacity")]
    pub total_capacity: u64,
    #[serde(default = "default_safety_margin")]
    pub safety_margin: f64,
    #[serde(default = "default_smart_zone_fraction")]
    pub smart_zone_fraction: f64,
    #[serde(default = "default_max_active_memory_chars")]
    pub max_active_memory_chars: usize,
}

fn default_total_capacity() -> u64 {
    crate::accountant::ContextBudget::DEFAULT_TOTAL_CAPACITY
}
fn default_safety_margin() -> f64 {
    crate::accountant::ContextBudget::DEFAULT_SAFETY_MARGIN
}
fn default_smart_zone_fraction() -> f64 {
    crate::accountant::ContextBudget::DEFAULT_SMART_ZONE_FRACTION
}
fn default_max_active_memory_chars() -> usize {
    crate::memory::DEFAULT_MAX_ACTIVE_MEMORY_CHARS
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            total_capacity: default_total_capacity(),
            safety_margin: default_safety_margin(),
            smart_zone_fraction: default_smart_zone_fraction(),
            max_active_memory_chars: default_max_active_memory_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationPhaseConfig {
    #[serde(default)]
    pub require_human_approval: bool,
    #[serde(default)]
    pub commands: Vec<VerificationCommandConfig>,
}

impl Default for ValidationPhaseConfig {
    fn default() -> Self {
        Self {
            require_human_approval: true,
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCommandConfig {
    pub label: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhasesConfig {
    #[serde(default)]
    pub validation: ValidationPhaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RalphConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    #[serde(default = "default_planning_model")]
    pub planning_model: String,
    #[serde(default = "default_executor_cmd")]
    pub executor_cmd: String,
    #[serde(default)]
    pub cost_limits: CostLimits,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub phases: PhasesConfig,
}

fn default_max_iterations() -> u64 {
    100
}
fn default_primary_model() -> String {
    "claude-sonnet-4".to_string()
}
fn default_planning_model() -> String {
    "claude-opus-4".to_string()
}
fn default_executor_cmd() -> String {
    "claude".to_string()
}

impl Default for RalphConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            primary_model: default_primary_model(),
            planning_model: default_planning_model(),
            executor_cmd: default_executor_cmd(),
            cost_limits: CostLimits::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            context: ContextConfig::default(),
            safety: SafetyConfig::default(),
            phases: PhasesConfig::default(),
        }
    }
}

impl RalphConfig {
    /// Load `<project_root>/.ralph/config.yaml`, falling back to defaults
    /// when the file does not exist.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = config_path(project_root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    pub fn save(&self, project_root: &Path) -> Result<()> {
        let path = config_path(project_root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let yaml = serde_yaml::to_string(self).context("failed to serialize config")?;
        std::fs::write(&path, yaml)
            .with_context(|| format!("failed to write config at {}", path.display()))?;
        Ok(())
    }
}

fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(crate::store::RALPH_DIR).join(CONFIG_FILE)
}
