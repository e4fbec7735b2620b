// crates/faultline-providers/tests/investigation_probes.rs
// ============================================================================
// Module: Probe Wiring Tests
// Description: Drives the orchestrator through the parallel probe runner.
// ============================================================================
//! ## Overview
//! Composes the provider stack the way a host does: a policy-enforcing tool
//! registry wrapped in the probe runner, handed to the orchestrator as its
//! tool executor. The scripted run must conclude exactly as it would with a
//! plain sequential executor.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::cell::RefCell;
use std::collections::VecDeque;

use faultline_core::ApprovalChannel;
use faultline_core::ApprovalDecision;
use faultline_core::ApprovalError;
use faultline_core::AuditError;
use faultline_core::AuditRecord;
use faultline_core::AuditSink;
use faultline_core::HypothesisStatus;
use faultline_core::InvestigationId;
use faultline_core::InvestigationPhase;
use faultline_core::LlmError;
use faultline_core::LlmProvider;
use faultline_core::LogicalClock;
use faultline_core::Operation;
use faultline_core::Orchestrator;
use faultline_core::OrchestratorConfig;
use faultline_core::ToolDescriptor;
use faultline_core::ToolName;
use faultline_providers::InMemoryKnowledge;
use faultline_providers::ProbeRunner;
use faultline_providers::StaticTool;
use faultline_providers::ToolAccessPolicy;
use faultline_providers::ToolRegistry;
use serde_json::json;

// ============================================================================
// SECTION: Test Fixtures
// ============================================================================

/// Model that replays scripted completions in order.
struct ScriptedLlm {
    responses: RefCell<VecDeque<String>>,
}

impl ScriptedLlm {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: RefCell::new(responses.iter().map(ToString::to_string).collect()),
        }
    }
}

impl LlmProvider for ScriptedLlm {
    fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String, LlmError> {
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| LlmError::Provider("script exhausted".to_string()))
    }
}

/// Sink that drops records; these runs assert on the result only.
struct NullSink;

impl AuditSink for NullSink {
    fn append(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Channel that approves everything.
struct ApproveAll;

impl ApprovalChannel for ApproveAll {
    fn request(
        &self,
        _operation: &Operation,
        _timeout_ms: u64,
    ) -> Result<ApprovalDecision, ApprovalError> {
        Ok(ApprovalDecision {
            approved: true,
            approver: Some("oncall".to_string()),
            reason: None,
        })
    }
}

const TRIAGE: &str = r#"{"summary": "API errors from database connection pool saturation",
    "affected_systems": ["api", "db"]}"#;

const HYPOTHESES: &str = r#"{"hypotheses": [
    {"statement": "database connection pool exhausted", "category": "infrastructure",
     "base_probability": 0.6},
    {"statement": "recent deploy introduced a regression", "category": "deployment",
     "base_probability": 0.3}
]}"#;

const PROBE_PLAN: &str = r#"{"probes": [
    {"hypothesis_id": "h1", "tool": "metrics", "args": {"resource": "db-pool"}}
]}"#;

const CONCLUSION: &str = r#"{"root_cause": "The api service exhausted the database connection pool",
    "affected_resources": ["db-pool", "api"]}"#;

fn metrics_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new(ToolAccessPolicy::allow_all());
    registry.register(StaticTool::new(
        ToolDescriptor {
            name: ToolName::from("metrics"),
            description: "connection pool gauge".to_string(),
            parameter_schema: json!({"type": "object"}),
            mutating: false,
        },
        json!({"connections": 98, "limit": 100}),
    ));
    registry
}

fn pool_knowledge() -> InMemoryKnowledge {
    let mut knowledge = InMemoryKnowledge::new();
    knowledge.load(
        "Database connection pool exhaustion",
        "api pods exhausted the database connection pool during peak traffic",
        true,
    );
    knowledge
}

// ============================================================================
// SECTION: Wired Runs
// ============================================================================

#[test]
fn runner_wrapped_registry_drives_a_run_to_conclusion() {
    let tools = ProbeRunner::new(metrics_registry(), 4);
    let mut orchestrator = Orchestrator::new(
        ScriptedLlm::new(&[TRIAGE, HYPOTHESES, PROBE_PLAN, CONCLUSION]),
        tools,
        pool_knowledge(),
        NullSink,
        ApproveAll,
        LogicalClock::new(0, 1),
        OrchestratorConfig::default(),
    );

    let result = orchestrator
        .investigate(InvestigationId::new("inv-wired"), "api returning 500s, db timeouts")
        .expect("wired run should reach a terminal phase");

    assert_eq!(result.phase, InvestigationPhase::Complete);
    assert_eq!(
        result.root_cause.as_deref(),
        Some("The api service exhausted the database connection pool"),
    );
    let confirmed: Vec<_> = result
        .hypotheses
        .iter()
        .filter(|summary| summary.status == HypothesisStatus::Confirmed)
        .collect();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].statement, "database connection pool exhausted");
    assert_eq!(confirmed[0].evidence_count, 1);
}
