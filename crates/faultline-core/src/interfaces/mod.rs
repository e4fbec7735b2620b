// crates/faultline-core/src/interfaces/mod.rs
// ============================================================================
// Module: Faultline Interfaces
// Description: Backend-agnostic interfaces for models, tools, and audit.
// Purpose: Define the contract surfaces consumed by the Faultline runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how Faultline integrates with external systems without
//! embedding backend-specific details. The core treats the completion provider
//! as a black box, tool implementations as opaque callables behind a uniform
//! execute contract, and the audit sink as the sole owner of durability.
//! Implementations must fail closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::audit::AuditRecord;
use crate::core::identifiers::ToolName;
use crate::core::operation::ApprovalDecision;
use crate::core::operation::Operation;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: LLM Provider
// ============================================================================

/// Completion provider errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider reported an error.
    #[error("llm provider error: {0}")]
    Provider(String),
}

/// Black-box completion provider: prompt in, text out.
///
/// The runtime extracts structured JSON from the returned text itself; the
/// provider has no schema obligations.
pub trait LlmProvider {
    /// Completes a prompt pair into raw model text.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] when the provider cannot produce a completion.
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

// ============================================================================
// SECTION: Tool Executor
// ============================================================================

/// Describes a registered tool and its argument shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name routed through the registry.
    pub name: ToolName,
    /// Human-readable tool description.
    pub description: String,
    /// JSON schema describing the accepted arguments.
    pub parameter_schema: Value,
    /// True when the tool mutates external state.
    pub mutating: bool,
}

/// One planned tool invocation within a probe batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// Tool to invoke.
    pub tool: ToolName,
    /// Structured arguments for the call.
    pub args: Value,
}

/// Tool execution errors.
#[derive(Debug, Error)]
pub enum ToolExecutionError {
    /// Tool name is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Tool is blocked by access policy.
    #[error("tool blocked by policy: {0}")]
    Blocked(String),
    /// Tool call exceeded its timeout.
    #[error("tool call timed out: {0}")]
    Timeout(String),
    /// Tool reported a failure.
    #[error("tool execution failed: {0}")]
    Failed(String),
}

/// Uniform tool execution contract.
///
/// The orchestrator only knows tool names and argument shapes; it does not
/// know what a tool does. Unknown names are an error, never a crash.
pub trait ToolExecutor {
    /// Executes a tool by name with structured arguments.
    ///
    /// Every call carries its own millisecond budget; implementations that
    /// can enforce it report [`ToolExecutionError::Timeout`] for a call that
    /// exceeds it.
    ///
    /// # Errors
    ///
    /// Returns [`ToolExecutionError`] when the tool is unknown, blocked,
    /// timed out, or failed.
    fn execute(
        &self,
        name: &ToolName,
        args: &Value,
        timeout_ms: u64,
    ) -> Result<Value, ToolExecutionError>;

    /// Executes independent calls as one batch, each bounded by `timeout_ms`.
    ///
    /// Results come back in submission order regardless of completion order.
    /// The default implementation runs calls sequentially; concurrent
    /// implementations treat `timeout_ms` as a collection deadline and report
    /// unfinished calls as [`ToolExecutionError::Timeout`].
    fn execute_batch(
        &self,
        calls: &[ToolCall],
        timeout_ms: u64,
    ) -> Vec<Result<Value, ToolExecutionError>> {
        calls
            .iter()
            .map(|call| self.execute(&call.tool, &call.args, timeout_ms))
            .collect()
    }

    /// Returns the descriptor for a tool name, if registered.
    fn descriptor(&self, name: &ToolName) -> Option<ToolDescriptor>;

    /// Returns descriptors for all registered tools in name order.
    fn descriptors(&self) -> Vec<ToolDescriptor>;
}

// ============================================================================
// SECTION: Knowledge Retriever
// ============================================================================

/// Ranked document returned by knowledge retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDoc {
    /// Document title.
    pub title: String,
    /// Document body or excerpt.
    pub body: String,
    /// Relevance score in `[0, 1]`, higher is better.
    pub score: f64,
    /// True when the document records a known historical incident pattern.
    pub historical_pattern: bool,
}

/// Knowledge retrieval errors.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// Retriever reported an error.
    #[error("knowledge retrieval error: {0}")]
    Retrieval(String),
}

/// Full-text/semantic search over runbooks and prior incidents.
pub trait KnowledgeRetriever {
    /// Searches for documents relevant to the query.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeError`] when the search backend fails.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeDoc>, KnowledgeError>;
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Audit sink errors.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Sink failed to append the record.
    #[error("audit sink append failed: {0}")]
    Append(String),
    /// Sink is unavailable.
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Append-only, ordered audit sink keyed by investigation id.
///
/// The core's only durability obligation is to attempt exactly one append per
/// transition, in transition order; the sink owns persistence guarantees.
/// Sink failure is fatal to the run.
pub trait AuditSink {
    /// Appends one record to the ordered log.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the append cannot be performed.
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

// ============================================================================
// SECTION: Approval Channel
// ============================================================================

/// Approval channel errors.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// No decision arrived within the timeout window.
    #[error("approval timed out after {0} ms")]
    Timeout(u64),
    /// The wait was aborted by the caller.
    #[error("approval wait aborted: {0}")]
    Aborted(String),
    /// Channel transport failure.
    #[error("approval channel error: {0}")]
    Channel(String),
}

/// External approval channel for gated operations.
///
/// May be backed by an interactive prompt or an asynchronous out-of-band
/// callback; either way the call blocks until a decision, timeout, or abort.
/// Timeout and abort both resolve to denial at the gate.
pub trait ApprovalChannel {
    /// Requests an approval decision for the operation.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError`] on timeout, abort, or transport failure.
    fn request(
        &self,
        operation: &Operation,
        timeout_ms: u64,
    ) -> Result<ApprovalDecision, ApprovalError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Time source injected into the runtime.
///
/// The core never reads wall-clock time directly; hosts provide either real
/// time or a deterministic logical clock for replay.
pub trait Clock {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Deterministic logical clock advancing by a fixed step per reading.
///
/// Intended for tests and replay harnesses.
#[derive(Debug)]
pub struct LogicalClock {
    /// Next logical value to hand out.
    next: std::sync::atomic::AtomicU64,
    /// Step added per reading.
    step: u64,
}

impl LogicalClock {
    /// Creates a logical clock starting at `start` and advancing by `step`.
    #[must_use]
    pub const fn new(start: u64, step: u64) -> Self {
        Self {
            next: std::sync::atomic::AtomicU64::new(start),
            step,
        }
    }
}

impl Clock for LogicalClock {
    fn now(&self) -> Timestamp {
        let value = self.next.fetch_add(self.step, std::sync::atomic::Ordering::Relaxed);
        Timestamp::Logical(value)
    }
}
