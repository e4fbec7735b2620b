// crates/faultline-config/src/config.rs
// ============================================================================
// Module: Faultline Configuration
// Description: Configuration loading and validation for Faultline.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: faultline-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys are rejected and every numeric limit is bounds-checked, so a
//! typo in a safety setting fails the load instead of weakening the gate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use faultline_core::BudgetThresholds;
use faultline_core::Environment;
use faultline_core::OrchestratorConfig;
use faultline_core::OrchestratorLimits;
use faultline_core::RiskLevel;
use faultline_core::SafetyPolicy;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "faultline.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "FAULTLINE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum allowed investigation iterations.
pub(crate) const MIN_ITERATIONS: u32 = 1;
/// Maximum allowed investigation iterations.
pub(crate) const MAX_ITERATIONS: u32 = 100;
/// Minimum allowed investigation timeout in milliseconds.
pub(crate) const MIN_INVESTIGATION_TIMEOUT_MS: u64 = 1_000;
/// Maximum allowed investigation timeout in milliseconds.
pub(crate) const MAX_INVESTIGATION_TIMEOUT_MS: u64 = 3_600_000;
/// Maximum allowed root hypotheses.
pub(crate) const MAX_HYPOTHESES_LIMIT: usize = 10;
/// Maximum allowed branch factor.
pub(crate) const MAX_BRANCH_FACTOR: usize = 5;
/// Maximum allowed hypothesis tree depth.
pub(crate) const MAX_TREE_DEPTH: u32 = 10;
/// Maximum allowed knowledge documents per search.
pub(crate) const MAX_KNOWLEDGE_LIMIT: usize = 50;
/// Maximum allowed probes per iteration.
pub(crate) const MAX_PROBES_LIMIT: usize = 20;
/// Minimum allowed per-call tool timeout in milliseconds.
pub(crate) const MIN_TOOL_TIMEOUT_MS: u64 = 100;
/// Maximum allowed per-call tool timeout in milliseconds.
pub(crate) const MAX_TOOL_TIMEOUT_MS: u64 = 600_000;
/// Maximum allowed concurrent probe workers.
pub(crate) const MAX_CONCURRENT_PROBES: usize = 32;
/// Default concurrent probe workers.
pub(crate) const DEFAULT_CONCURRENT_PROBES: usize = 4;
/// Maximum allowed context ceiling in tokens.
pub(crate) const MAX_CONTEXT_CEILING_TOKENS: u64 = 10_000_000;
/// Maximum allowed mutations per session.
pub(crate) const MAX_SESSION_MUTATIONS: u32 = 100;
/// Maximum allowed critical cooldown in milliseconds.
pub(crate) const MAX_COOLDOWN_MS: u64 = 86_400_000;
/// Minimum allowed approval timeout in milliseconds.
pub(crate) const MIN_APPROVAL_TIMEOUT_MS: u64 = 1_000;
/// Maximum allowed approval timeout in milliseconds.
pub(crate) const MAX_APPROVAL_TIMEOUT_MS: u64 = 3_600_000;
/// Maximum entries in any policy list.
pub(crate) const MAX_POLICY_LIST_ENTRIES: usize = 128;
/// Maximum length of one policy list entry.
pub(crate) const MAX_POLICY_ENTRY_LENGTH: usize = 256;
/// Maximum allowed audit channel capacity.
pub(crate) const MAX_CHANNEL_CAPACITY: usize = 65_536;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Faultline configuration root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaultlineConfig {
    /// Investigation loop limits.
    #[serde(default)]
    pub investigation: InvestigationConfig,
    /// Context budget thresholds.
    #[serde(default)]
    pub budget: BudgetConfig,
    /// Safety gate policy.
    #[serde(default)]
    pub safety: SafetyConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl FaultlineConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, `FAULTLINE_CONFIG`, then
    /// `faultline.toml` in the working directory.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.investigation.validate()?;
        self.budget.validate()?;
        self.safety.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Builds the orchestrator configuration from validated settings.
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            limits: self.investigation.limits(self.budget.thresholds()),
            policy: self.safety.policy(),
        }
    }
}

/// Investigation loop limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvestigationConfig {
    /// Maximum probe-and-evaluate iterations.
    pub max_iterations: u32,
    /// Wall budget in milliseconds before forced conclusion.
    pub investigation_timeout_ms: u64,
    /// Confidence at which a hypothesis is confirmed.
    pub confidence_threshold: f64,
    /// Maximum root hypotheses formed at triage.
    pub max_hypotheses: usize,
    /// Maximum children created per branch.
    pub branch_factor: usize,
    /// Maximum hypothesis tree depth.
    pub max_depth: u32,
    /// Knowledge documents retrieved per search.
    pub knowledge_limit: usize,
    /// Probes executed per iteration.
    pub max_probes_per_iteration: usize,
    /// Millisecond budget carried by every tool call.
    #[serde(default = "default_tool_timeout_ms")]
    pub tool_timeout_ms: u64,
    /// Worker cap for concurrent probe execution at the host edge.
    #[serde(default = "default_concurrent_probes")]
    pub max_concurrent_probes: usize,
    /// Whether a confirmed conclusion proceeds to gated remediation.
    pub auto_remediate: bool,
    /// Environment operations are proposed against.
    pub environment: Environment,
}

/// Default per-call tool timeout.
fn default_tool_timeout_ms() -> u64 {
    OrchestratorLimits::default().tool_timeout_ms
}

/// Default concurrent probe worker cap.
const fn default_concurrent_probes() -> usize {
    DEFAULT_CONCURRENT_PROBES
}

impl Default for InvestigationConfig {
    fn default() -> Self {
        let limits = OrchestratorLimits::default();
        Self {
            max_iterations: limits.max_iterations,
            investigation_timeout_ms: limits.investigation_timeout_ms,
            confidence_threshold: limits.confidence_threshold,
            max_hypotheses: limits.max_hypotheses,
            branch_factor: limits.branch_factor,
            max_depth: limits.max_depth,
            knowledge_limit: limits.knowledge_limit,
            max_probes_per_iteration: limits.max_probes_per_iteration,
            tool_timeout_ms: limits.tool_timeout_ms,
            max_concurrent_probes: DEFAULT_CONCURRENT_PROBES,
            auto_remediate: limits.auto_remediate,
            environment: limits.environment,
        }
    }
}

impl InvestigationConfig {
    /// Validates investigation limits against hard bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.max_iterations) {
            return Err(ConfigError::Invalid(format!(
                "investigation.max_iterations must be in {MIN_ITERATIONS}..={MAX_ITERATIONS}",
            )));
        }
        if !(MIN_INVESTIGATION_TIMEOUT_MS..=MAX_INVESTIGATION_TIMEOUT_MS)
            .contains(&self.investigation_timeout_ms)
        {
            return Err(ConfigError::Invalid(
                "investigation.investigation_timeout_ms out of range".to_string(),
            ));
        }
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold <= 0.99) {
            return Err(ConfigError::Invalid(
                "investigation.confidence_threshold must be in (0, 0.99]".to_string(),
            ));
        }
        if self.max_hypotheses == 0 || self.max_hypotheses > MAX_HYPOTHESES_LIMIT {
            return Err(ConfigError::Invalid(
                "investigation.max_hypotheses out of range".to_string(),
            ));
        }
        if self.branch_factor == 0 || self.branch_factor > MAX_BRANCH_FACTOR {
            return Err(ConfigError::Invalid(
                "investigation.branch_factor out of range".to_string(),
            ));
        }
        if self.max_depth == 0 || self.max_depth > MAX_TREE_DEPTH {
            return Err(ConfigError::Invalid(
                "investigation.max_depth out of range".to_string(),
            ));
        }
        if self.knowledge_limit == 0 || self.knowledge_limit > MAX_KNOWLEDGE_LIMIT {
            return Err(ConfigError::Invalid(
                "investigation.knowledge_limit out of range".to_string(),
            ));
        }
        if self.max_probes_per_iteration == 0 || self.max_probes_per_iteration > MAX_PROBES_LIMIT {
            return Err(ConfigError::Invalid(
                "investigation.max_probes_per_iteration out of range".to_string(),
            ));
        }
        if !(MIN_TOOL_TIMEOUT_MS..=MAX_TOOL_TIMEOUT_MS).contains(&self.tool_timeout_ms) {
            return Err(ConfigError::Invalid(
                "investigation.tool_timeout_ms out of range".to_string(),
            ));
        }
        if self.max_concurrent_probes == 0 || self.max_concurrent_probes > MAX_CONCURRENT_PROBES {
            return Err(ConfigError::Invalid(
                "investigation.max_concurrent_probes out of range".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds orchestrator limits from validated settings.
    #[must_use]
    fn limits(&self, budget: BudgetThresholds) -> OrchestratorLimits {
        OrchestratorLimits {
            max_iterations: self.max_iterations,
            investigation_timeout_ms: self.investigation_timeout_ms,
            confidence_threshold: self.confidence_threshold,
            max_hypotheses: self.max_hypotheses,
            branch_factor: self.branch_factor,
            max_depth: self.max_depth,
            knowledge_limit: self.knowledge_limit,
            max_probes_per_iteration: self.max_probes_per_iteration,
            tool_timeout_ms: self.tool_timeout_ms,
            auto_remediate: self.auto_remediate,
            environment: self.environment,
            budget,
        }
    }
}

/// Context budget thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    /// Total usage at which compaction triggers.
    pub context_threshold_tokens: u64,
    /// Hard ceiling on total context tokens.
    pub max_context_tokens: u64,
    /// Tokens withheld for the final response.
    pub reserve_tokens: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        let thresholds = BudgetThresholds::default();
        Self {
            context_threshold_tokens: thresholds.context_threshold_tokens,
            max_context_tokens: thresholds.max_context_tokens,
            reserve_tokens: thresholds.reserve_tokens,
        }
    }
}

impl BudgetConfig {
    /// Validates budget thresholds for internal consistency.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_context_tokens == 0 || self.max_context_tokens > MAX_CONTEXT_CEILING_TOKENS {
            return Err(ConfigError::Invalid("budget.max_context_tokens out of range".to_string()));
        }
        if self.context_threshold_tokens == 0
            || self.context_threshold_tokens >= self.max_context_tokens
        {
            return Err(ConfigError::Invalid(
                "budget.context_threshold_tokens must be below max_context_tokens".to_string(),
            ));
        }
        if self.reserve_tokens >= self.max_context_tokens {
            return Err(ConfigError::Invalid(
                "budget.reserve_tokens must be below max_context_tokens".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds budget thresholds from validated settings.
    #[must_use]
    const fn thresholds(&self) -> BudgetThresholds {
        BudgetThresholds {
            context_threshold_tokens: self.context_threshold_tokens,
            max_context_tokens: self.max_context_tokens,
            reserve_tokens: self.reserve_tokens,
        }
    }
}

/// Safety gate policy configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafetyConfig {
    /// Risk levels requiring an approval decision (critical always does).
    pub require_approval: Vec<RiskLevel>,
    /// Read-only verbs allowed to bypass the approval channel.
    #[serde(default)]
    pub skip_approval: Vec<String>,
    /// Denylisted operation patterns rejected before classification.
    #[serde(default)]
    pub blocked_operations: Vec<String>,
    /// Maximum approved mutations per session.
    pub max_mutations_per_session: u32,
    /// Minimum milliseconds between consecutive critical operations.
    pub cooldown_between_critical_ms: u64,
    /// Milliseconds to wait for an approval decision.
    pub approval_timeout_ms: u64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        let policy = SafetyPolicy::default();
        Self {
            require_approval: policy.require_approval.iter().copied().collect(),
            skip_approval: Vec::new(),
            blocked_operations: Vec::new(),
            max_mutations_per_session: policy.max_mutations_per_session,
            cooldown_between_critical_ms: policy.cooldown_between_critical_ms,
            approval_timeout_ms: policy.approval_timeout_ms,
        }
    }
}

impl SafetyConfig {
    /// Validates safety settings against hard bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_mutations_per_session == 0
            || self.max_mutations_per_session > MAX_SESSION_MUTATIONS
        {
            return Err(ConfigError::Invalid(
                "safety.max_mutations_per_session out of range".to_string(),
            ));
        }
        if self.cooldown_between_critical_ms > MAX_COOLDOWN_MS {
            return Err(ConfigError::Invalid(
                "safety.cooldown_between_critical_ms out of range".to_string(),
            ));
        }
        if !(MIN_APPROVAL_TIMEOUT_MS..=MAX_APPROVAL_TIMEOUT_MS)
            .contains(&self.approval_timeout_ms)
        {
            return Err(ConfigError::Invalid(
                "safety.approval_timeout_ms out of range".to_string(),
            ));
        }
        validate_policy_list("safety.skip_approval", &self.skip_approval)?;
        validate_policy_list("safety.blocked_operations", &self.blocked_operations)?;
        Ok(())
    }

    /// Builds the gate policy from validated settings.
    #[must_use]
    fn policy(&self) -> SafetyPolicy {
        SafetyPolicy {
            require_approval: self.require_approval.iter().copied().collect(),
            skip_approval: self.skip_approval.iter().cloned().collect::<BTreeSet<_>>(),
            blocked_operations: self.blocked_operations.iter().cloned().collect::<BTreeSet<_>>(),
            max_mutations_per_session: self.max_mutations_per_session,
            cooldown_between_critical_ms: self.cooldown_between_critical_ms,
            approval_timeout_ms: self.approval_timeout_ms,
        }
    }
}

/// Audit sink configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Optional JSON-lines audit log path.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    /// Bounded capacity of the live event channel.
    pub channel_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            channel_capacity: 256,
        }
    }
}

impl AuditConfig {
    /// Validates audit settings against hard bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(ConfigError::Invalid("audit.channel_capacity out of range".to_string()));
        }
        if let Some(path) = &self.log_path
            && path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH
        {
            return Err(ConfigError::Invalid("audit.log_path exceeds max length".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates entries of a policy string list.
fn validate_policy_list(field: &str, entries: &[String]) -> Result<(), ConfigError> {
    if entries.len() > MAX_POLICY_LIST_ENTRIES {
        return Err(ConfigError::Invalid(format!("{field} has too many entries")));
    }
    for entry in entries {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Invalid(format!("{field} entries must be non-empty")));
        }
        if trimmed.len() > MAX_POLICY_ENTRY_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} entry exceeds max length")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::io::Write;

    use super::*;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_validate() {
        let config = FaultlineConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn load_accepts_minimal_config() {
        let file = write_config("[investigation]\nmax_iterations = 10\ninvestigation_timeout_ms = 60000\nconfidence_threshold = 0.8\nmax_hypotheses = 5\nbranch_factor = 3\nmax_depth = 3\nknowledge_limit = 5\nmax_probes_per_iteration = 3\nauto_remediate = false\nenvironment = \"staging\"\n");
        let config = FaultlineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.investigation.max_iterations, 10);
        assert_eq!(config.investigation.environment, Environment::Staging);
    }

    #[test]
    fn load_recognizes_tool_timeout_and_probe_cap() {
        let file = write_config("[investigation]\nmax_iterations = 10\ninvestigation_timeout_ms = 60000\nconfidence_threshold = 0.8\nmax_hypotheses = 5\nbranch_factor = 3\nmax_depth = 3\nknowledge_limit = 5\nmax_probes_per_iteration = 3\ntool_timeout_ms = 30000\nmax_concurrent_probes = 8\nauto_remediate = false\nenvironment = \"staging\"\n");
        let config = FaultlineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.investigation.tool_timeout_ms, 30_000);
        assert_eq!(config.investigation.max_concurrent_probes, 8);
        assert_eq!(config.orchestrator_config().limits.tool_timeout_ms, 30_000);
    }

    #[test]
    fn tool_timeout_defaults_when_omitted() {
        let config = FaultlineConfig::default();
        assert_eq!(config.investigation.tool_timeout_ms, 30_000);
        assert_eq!(config.investigation.max_concurrent_probes, DEFAULT_CONCURRENT_PROBES);
    }

    #[test]
    fn validate_rejects_tool_timeout_out_of_range() {
        let mut config = FaultlineConfig::default();
        config.investigation.tool_timeout_ms = 0;
        assert!(config.validate().is_err());
        config.investigation.tool_timeout_ms = MAX_TOOL_TIMEOUT_MS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrent_probes() {
        let mut config = FaultlineConfig::default();
        config.investigation.max_concurrent_probes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_rejects_unknown_keys() {
        let file = write_config("[investigation]\nmax_iterationz = 10\n");
        let err = FaultlineConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_rejects_missing_file() {
        let err = FaultlineConfig::load(Some(Path::new("/nonexistent/faultline.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn validate_rejects_zero_mutation_cap() {
        let mut config = FaultlineConfig::default();
        config.safety.max_mutations_per_session = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn validate_rejects_threshold_above_ceiling() {
        let mut config = FaultlineConfig::default();
        config.budget.context_threshold_tokens = config.budget.max_context_tokens;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn validate_rejects_confidence_above_ceiling() {
        let mut config = FaultlineConfig::default();
        config.investigation.confidence_threshold = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn orchestrator_config_carries_policy_lists() {
        let mut config = FaultlineConfig::default();
        config.safety.blocked_operations = vec!["drop table".to_string()];
        config.safety.skip_approval = vec!["get-logs".to_string()];
        let built = config.orchestrator_config();
        assert!(built.policy.blocked_operations.contains("drop table"));
        assert!(built.policy.skip_approval.contains("get-logs"));
    }
}
