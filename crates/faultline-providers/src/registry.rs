// crates/faultline-providers/src/registry.rs
// ============================================================================
// Module: Tool Registry
// Description: Registry for built-in and external diagnostic tools.
// Purpose: Route tool calls by name with allowlist/denylist policy checks.
// Dependencies: faultline-core
// ============================================================================

//! ## Overview
//! The tool registry resolves tool calls by name and enforces allowlist and
//! denylist policies before any handler runs. It implements the core
//! [`faultline_core::ToolExecutor`] interface so the orchestrator routes all
//! probes and remediation actions through one policy point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use faultline_core::ToolDescriptor;
use faultline_core::ToolExecutionError;
use faultline_core::ToolExecutor;
use faultline_core::ToolName;
use serde_json::Value;

// ============================================================================
// SECTION: Access Policy
// ============================================================================

/// Access policy controlling which tools may be invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolAccessPolicy {
    /// Optional allowlist of tool names.
    pub allowlist: Option<BTreeSet<String>>,
    /// Explicit denylist of tool names.
    pub denylist: BTreeSet<String>,
}

impl ToolAccessPolicy {
    /// Returns a policy that permits all registered tools.
    #[must_use]
    pub const fn allow_all() -> Self {
        Self {
            allowlist: None,
            denylist: BTreeSet::new(),
        }
    }

    /// Returns true when the tool is allowed by policy.
    #[must_use]
    pub fn is_allowed(&self, tool: &str) -> bool {
        if self.denylist.contains(tool) {
            return false;
        }
        if let Some(allowlist) = &self.allowlist {
            return allowlist.contains(tool);
        }
        true
    }
}

impl Default for ToolAccessPolicy {
    fn default() -> Self {
        Self::allow_all()
    }
}

// ============================================================================
// SECTION: Tool Handler
// ============================================================================

/// One registered tool implementation.
pub trait ToolHandler {
    /// Returns the descriptor advertised for this tool.
    fn descriptor(&self) -> ToolDescriptor;

    /// Invokes the tool with structured arguments and a millisecond budget.
    ///
    /// # Errors
    ///
    /// Returns [`ToolExecutionError`] when the call times out or fails.
    fn call(&self, args: &Value, timeout_ms: u64) -> Result<Value, ToolExecutionError>;
}

// ============================================================================
// SECTION: Tool Registry
// ============================================================================

/// Tool registry with policy enforcement.
pub struct ToolRegistry {
    /// Tool implementations keyed by tool name.
    tools: BTreeMap<String, Box<dyn ToolHandler + Send + Sync>>,
    /// Access control policy for tool usage.
    policy: ToolAccessPolicy,
}

impl ToolRegistry {
    /// Creates a new registry with the provided policy.
    #[must_use]
    pub fn new(policy: ToolAccessPolicy) -> Self {
        Self {
            tools: BTreeMap::new(),
            policy,
        }
    }

    /// Registers a tool under its advertised name.
    pub fn register(&mut self, tool: impl ToolHandler + Send + Sync + 'static) {
        let name = tool.descriptor().name.to_string();
        self.tools.insert(name, Box::new(tool));
    }

    /// Returns the configured policy.
    #[must_use]
    pub const fn policy(&self) -> &ToolAccessPolicy {
        &self.policy
    }
}

impl ToolExecutor for ToolRegistry {
    fn execute(
        &self,
        name: &ToolName,
        args: &Value,
        timeout_ms: u64,
    ) -> Result<Value, ToolExecutionError> {
        let tool = name.as_str();
        if !self.policy.is_allowed(tool) {
            return Err(ToolExecutionError::Blocked(tool.to_string()));
        }
        let Some(handler) = self.tools.get(tool) else {
            return Err(ToolExecutionError::UnknownTool(tool.to_string()));
        };
        handler.call(args, timeout_ms)
    }

    fn descriptor(&self, name: &ToolName) -> Option<ToolDescriptor> {
        if !self.policy.is_allowed(name.as_str()) {
            return None;
        }
        self.tools.get(name.as_str()).map(|handler| handler.descriptor())
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .filter(|(name, _)| self.policy.is_allowed(name))
            .map(|(_, handler)| handler.descriptor())
            .collect()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
