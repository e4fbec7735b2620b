// crates/faultline-core/tests/investigation.rs
// ============================================================================
// Module: Investigation Tests
// Description: End-to-end orchestrator runs against scripted providers.
// ============================================================================
//! ## Overview
//! Drives full investigations with a scripted model, fixture tools, and a
//! logical clock, then checks the terminal result and the audit trail.

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
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::rc::Rc;

use faultline_core::ApprovalChannel;
use faultline_core::ApprovalDecision;
use faultline_core::ApprovalError;
use faultline_core::AuditError;
use faultline_core::AuditEvent;
use faultline_core::AuditRecord;
use faultline_core::AuditSink;
use faultline_core::HypothesisStatus;
use faultline_core::InvestigationId;
use faultline_core::InvestigationPhase;
use faultline_core::KnowledgeDoc;
use faultline_core::KnowledgeError;
use faultline_core::KnowledgeRetriever;
use faultline_core::LlmError;
use faultline_core::LlmProvider;
use faultline_core::LogicalClock;
use faultline_core::Operation;
use faultline_core::Orchestrator;
use faultline_core::OrchestratorConfig;
use faultline_core::OrchestratorLimits;
use faultline_core::RemediationOutcome;
use faultline_core::ToolDescriptor;
use faultline_core::ToolExecutionError;
use faultline_core::ToolExecutor;
use faultline_core::ToolName;
use serde_json::Value;
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

/// Model that always fails.
struct FailingLlm;

impl LlmProvider for FailingLlm {
    fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Provider("model unavailable".to_string()))
    }
}

/// Scripted outcome for one fixture tool.
enum FixtureOutcome {
    Ok(Value),
    Fail(String),
    TimedOut,
}

/// Tool set backed by a fixed name-to-outcome map.
struct FixtureTools {
    tools: BTreeMap<String, FixtureOutcome>,
    seen_timeouts: Rc<RefCell<Vec<u64>>>,
}

impl FixtureTools {
    fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
            seen_timeouts: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Shared log of the per-call budgets this executor has seen.
    fn timeout_log(&self) -> Rc<RefCell<Vec<u64>>> {
        Rc::clone(&self.seen_timeouts)
    }

    fn with_ok(mut self, name: &str, result: Value) -> Self {
        self.tools.insert(name.to_string(), FixtureOutcome::Ok(result));
        self
    }

    fn with_failure(mut self, name: &str, error: &str) -> Self {
        self.tools.insert(name.to_string(), FixtureOutcome::Fail(error.to_string()));
        self
    }

    fn with_timeout(mut self, name: &str) -> Self {
        self.tools.insert(name.to_string(), FixtureOutcome::TimedOut);
        self
    }
}

impl ToolExecutor for FixtureTools {
    fn execute(&self, name: &ToolName, _args: &Value, timeout_ms: u64) -> Result<Value, ToolExecutionError> {
        self.seen_timeouts.borrow_mut().push(timeout_ms);
        match self.tools.get(name.as_str()) {
            Some(FixtureOutcome::Ok(result)) => Ok(result.clone()),
            Some(FixtureOutcome::Fail(error)) => Err(ToolExecutionError::Failed(error.clone())),
            Some(FixtureOutcome::TimedOut) => Err(ToolExecutionError::Timeout(format!(
                "tool call did not complete: {name}"
            ))),
            None => Err(ToolExecutionError::UnknownTool(name.as_str().to_string())),
        }
    }

    fn descriptor(&self, name: &ToolName) -> Option<ToolDescriptor> {
        self.tools.get(name.as_str()).map(|_| descriptor(name.as_str()))
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.keys().map(|name| descriptor(name)).collect()
    }
}

fn descriptor(name: &str) -> ToolDescriptor {
    ToolDescriptor {
        name: ToolName::new(name),
        description: format!("fixture tool {name}"),
        parameter_schema: json!({"type": "object"}),
        mutating: false,
    }
}

/// Retriever over a fixed document list.
struct StaticKnowledge {
    docs: Vec<KnowledgeDoc>,
}

impl KnowledgeRetriever for StaticKnowledge {
    fn search(&self, _query: &str, limit: usize) -> Result<Vec<KnowledgeDoc>, KnowledgeError> {
        Ok(self.docs.iter().take(limit).cloned().collect())
    }
}

fn pool_knowledge() -> StaticKnowledge {
    StaticKnowledge {
        docs: vec![KnowledgeDoc {
            title: "Database connection pool exhaustion".to_string(),
            body: "api pods exhausted the database connection pool during peak traffic"
                .to_string(),
            score: 0.9,
            historical_pattern: true,
        }],
    }
}

/// Sink sharing its record list with the test body.
#[derive(Clone)]
struct SharedSink {
    records: Rc<RefCell<Vec<AuditRecord>>>,
}

impl SharedSink {
    fn new() -> Self {
        Self {
            records: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn records(&self) -> Vec<AuditRecord> {
        self.records.borrow().clone()
    }
}

impl AuditSink for SharedSink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.borrow_mut().push(record.clone());
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

/// Channel that denies everything with a fixed reason.
struct DenyAll;

impl ApprovalChannel for DenyAll {
    fn request(
        &self,
        _operation: &Operation,
        _timeout_ms: u64,
    ) -> Result<ApprovalDecision, ApprovalError> {
        Ok(ApprovalDecision {
            approved: false,
            approver: Some("oncall".to_string()),
            reason: Some("denied by runbook".to_string()),
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

const REMEDIATION: &str = r#"{"steps": [
    {"command": "restart-service api", "affected_resources": ["api"],
     "rollback_command": null, "mutating": true, "max_retries": 0}
]}"#;

// ============================================================================
// SECTION: End-to-End Runs
// ============================================================================

#[test]
fn confirmed_run_concludes_with_root_cause() {
    let sink = SharedSink::new();
    let mut orchestrator = Orchestrator::new(
        ScriptedLlm::new(&[TRIAGE, HYPOTHESES, PROBE_PLAN, CONCLUSION]),
        FixtureTools::new().with_ok("metrics", json!({"connections": 98, "limit": 100})),
        pool_knowledge(),
        sink.clone(),
        ApproveAll,
        LogicalClock::new(0, 1),
        OrchestratorConfig::default(),
    );

    let result = orchestrator
        .investigate(InvestigationId::new("inv-1"), "api returning 500s, db timeouts")
        .unwrap();

    assert_eq!(result.phase, InvestigationPhase::Complete);
    assert_eq!(
        result.root_cause.as_deref(),
        Some("The api service exhausted the database connection pool"),
    );
    assert!(result.confidence > 0.8);
    assert_eq!(result.iterations, 1);
    assert!(result.degradations.is_empty());
    assert_eq!(result.affected_resources, vec!["db-pool".to_string(), "api".to_string()]);

    let confirmed: Vec<_> = result
        .hypotheses
        .iter()
        .filter(|summary| summary.status == HypothesisStatus::Confirmed)
        .collect();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].statement, "database connection pool exhausted");
    assert_eq!(confirmed[0].evidence_count, 1);
}

#[test]
fn every_tool_call_carries_the_configured_budget() {
    let tools = FixtureTools::new().with_ok("metrics", json!({"connections": 98, "limit": 100}));
    let timeouts = tools.timeout_log();
    let config = OrchestratorConfig {
        limits: OrchestratorLimits {
            tool_timeout_ms: 12_500,
            ..OrchestratorLimits::default()
        },
        ..OrchestratorConfig::default()
    };
    let mut orchestrator = Orchestrator::new(
        ScriptedLlm::new(&[TRIAGE, HYPOTHESES, PROBE_PLAN, CONCLUSION]),
        tools,
        pool_knowledge(),
        SharedSink::new(),
        ApproveAll,
        LogicalClock::new(0, 1),
        config,
    );

    orchestrator
        .investigate(InvestigationId::new("inv-1"), "api returning 500s, db timeouts")
        .unwrap();

    let seen = timeouts.borrow();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|&budget| budget == 12_500));
}

#[test]
fn audit_trail_is_ordered_and_hash_verified() {
    let sink = SharedSink::new();
    let mut orchestrator = Orchestrator::new(
        ScriptedLlm::new(&[TRIAGE, HYPOTHESES, PROBE_PLAN, CONCLUSION]),
        FixtureTools::new().with_ok("metrics", json!({"connections": 98, "limit": 100})),
        pool_knowledge(),
        sink.clone(),
        ApproveAll,
        LogicalClock::new(0, 1),
        OrchestratorConfig::default(),
    );
    orchestrator
        .investigate(InvestigationId::new("inv-1"), "api returning 500s, db timeouts")
        .unwrap();

    let records = sink.records();
    assert!(!records.is_empty());
    for (index, record) in records.iter().enumerate() {
        assert_eq!(record.seq, u64::try_from(index).unwrap() + 1);
        assert!(record.verify_hash().unwrap());
    }
    assert!(records.iter().any(|record| matches!(&record.event,
        AuditEvent::HypothesisConfirmed { .. })));
    assert!(records.iter().any(|record| matches!(&record.event,
        AuditEvent::Concluded { .. })));
}

#[test]
fn model_failure_degrades_to_inconclusive_run() {
    let sink = SharedSink::new();
    let mut orchestrator = Orchestrator::new(
        FailingLlm,
        FixtureTools::new(),
        pool_knowledge(),
        sink.clone(),
        ApproveAll,
        LogicalClock::new(0, 1),
        OrchestratorConfig::default(),
    );

    let result = orchestrator
        .investigate(InvestigationId::new("inv-2"), "api returning 500s")
        .unwrap();

    assert_eq!(result.phase, InvestigationPhase::Complete);
    assert_eq!(result.root_cause, None);
    assert!(result.hypotheses.is_empty());
    assert!(result.degradations.iter().any(|reason| reason.starts_with("triage degraded")));
    assert!(
        result
            .degradations
            .iter()
            .any(|reason| reason.starts_with("hypothesis formation degraded"))
    );
}

#[test]
fn tool_failures_leave_the_run_inconclusive_without_crashing() {
    let config = OrchestratorConfig {
        limits: OrchestratorLimits {
            max_iterations: 2,
            ..OrchestratorLimits::default()
        },
        ..OrchestratorConfig::default()
    };
    let sink = SharedSink::new();
    let mut orchestrator = Orchestrator::new(
        ScriptedLlm::new(&[TRIAGE, HYPOTHESES, PROBE_PLAN, PROBE_PLAN]),
        FixtureTools::new().with_failure("metrics", "collector offline"),
        pool_knowledge(),
        sink.clone(),
        ApproveAll,
        LogicalClock::new(0, 1),
        config,
    );

    let result = orchestrator
        .investigate(InvestigationId::new("inv-3"), "api returning 500s, db timeouts")
        .unwrap();

    assert_eq!(result.phase, InvestigationPhase::Complete);
    assert_eq!(result.root_cause, None);
    let failed_probe = sink.records().into_iter().find_map(|record| match record.event {
        AuditEvent::EvidenceAttached {
            evidence, ..
        } => Some(evidence),
        _ => None,
    });
    let evidence = failed_probe.expect("failed probe should still attach evidence");
    assert_eq!(evidence.correlation, 0.0);
    assert!(evidence.reason.is_some());
}

#[test]
fn timed_out_probes_attach_zero_correlation_evidence() {
    let config = OrchestratorConfig {
        limits: OrchestratorLimits {
            max_iterations: 2,
            ..OrchestratorLimits::default()
        },
        ..OrchestratorConfig::default()
    };
    let sink = SharedSink::new();
    let mut orchestrator = Orchestrator::new(
        ScriptedLlm::new(&[TRIAGE, HYPOTHESES, PROBE_PLAN, PROBE_PLAN]),
        FixtureTools::new().with_timeout("metrics"),
        pool_knowledge(),
        sink.clone(),
        ApproveAll,
        LogicalClock::new(0, 1),
        config,
    );

    let result = orchestrator
        .investigate(InvestigationId::new("inv-7"), "api returning 500s, db timeouts")
        .unwrap();

    assert_eq!(result.phase, InvestigationPhase::Complete);
    assert_eq!(result.root_cause, None);
    let timed_out = sink.records().into_iter().find_map(|record| match record.event {
        AuditEvent::EvidenceAttached {
            evidence, ..
        } => Some(evidence),
        _ => None,
    });
    let evidence = timed_out.expect("timed-out probe should still attach evidence");
    assert_eq!(evidence.correlation, 0.0);
    assert_eq!(evidence.reason.as_deref(), Some("timeout"));
}

/// Tool that trips the shared cancellation flag when executed.
struct CancellingTool {
    handle: Rc<RefCell<Option<std::sync::Arc<std::sync::atomic::AtomicBool>>>>,
}

impl ToolExecutor for CancellingTool {
    fn execute(&self, _name: &ToolName, _args: &Value, _timeout_ms: u64) -> Result<Value, ToolExecutionError> {
        if let Some(handle) = self.handle.borrow().as_ref() {
            handle.store(true, std::sync::atomic::Ordering::SeqCst);
        }
        Ok(json!({"status": "collected"}))
    }

    fn descriptor(&self, name: &ToolName) -> Option<ToolDescriptor> {
        (name.as_str() == "metrics").then(|| descriptor("metrics"))
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        vec![descriptor("metrics")]
    }
}

#[test]
fn cancellation_ends_the_run_in_cancelled_phase() {
    let slot = Rc::new(RefCell::new(None));
    let sink = SharedSink::new();
    let mut orchestrator = Orchestrator::new(
        ScriptedLlm::new(&[TRIAGE, HYPOTHESES, PROBE_PLAN]),
        CancellingTool {
            handle: Rc::clone(&slot),
        },
        pool_knowledge(),
        sink.clone(),
        ApproveAll,
        LogicalClock::new(0, 1),
        OrchestratorConfig::default(),
    );
    *slot.borrow_mut() = Some(orchestrator.cancel_handle());

    // The first probe trips the flag; the loop observes it at the top of the
    // second iteration.
    let result = orchestrator
        .investigate(InvestigationId::new("inv-4"), "api returning 500s")
        .unwrap();
    assert_eq!(result.phase, InvestigationPhase::Cancelled);
    assert_eq!(result.root_cause, None);
    assert_eq!(result.iterations, 1);
}

// ============================================================================
// SECTION: Remediation Gating
// ============================================================================

fn remediation_config() -> OrchestratorConfig {
    OrchestratorConfig {
        limits: OrchestratorLimits {
            auto_remediate: true,
            ..OrchestratorLimits::default()
        },
        ..OrchestratorConfig::default()
    }
}

#[test]
fn approved_remediation_executes_each_step_once() {
    let sink = SharedSink::new();
    let mut orchestrator = Orchestrator::new(
        ScriptedLlm::new(&[TRIAGE, HYPOTHESES, PROBE_PLAN, CONCLUSION, REMEDIATION]),
        FixtureTools::new()
            .with_ok("metrics", json!({"connections": 98, "limit": 100}))
            .with_ok("restart-service", json!({"status": "restarted"})),
        pool_knowledge(),
        sink.clone(),
        ApproveAll,
        LogicalClock::new(0, 1),
        remediation_config(),
    );

    let result = orchestrator
        .investigate(InvestigationId::new("inv-5"), "api returning 500s, db timeouts")
        .unwrap();

    assert_eq!(result.remediation_plan.steps.len(), 1);
    assert_eq!(result.remediation_outcomes.len(), 1);
    let RemediationOutcome::Executed {
        operation,
        attempts,
    } = &result.remediation_outcomes[0]
    else {
        panic!("expected an executed step");
    };
    assert_eq!(*attempts, 1);
    assert_eq!(operation.command, "restart-service api");
    assert_eq!(orchestrator.gate().session_mutations(), 1);

    let records = sink.records();
    assert!(records.iter().any(|record| matches!(&record.event,
        AuditEvent::ApprovalRequested { .. })));
    assert!(records.iter().any(|record| matches!(&record.event,
        AuditEvent::OperationExecuted { attempts: 1, .. })));
}

#[test]
fn denied_remediation_is_skipped_with_the_channel_reason() {
    let sink = SharedSink::new();
    let mut orchestrator = Orchestrator::new(
        ScriptedLlm::new(&[TRIAGE, HYPOTHESES, PROBE_PLAN, CONCLUSION, REMEDIATION]),
        FixtureTools::new()
            .with_ok("metrics", json!({"connections": 98, "limit": 100}))
            .with_ok("restart-service", json!({"status": "restarted"})),
        pool_knowledge(),
        sink.clone(),
        DenyAll,
        LogicalClock::new(0, 1),
        remediation_config(),
    );

    let result = orchestrator
        .investigate(InvestigationId::new("inv-6"), "api returning 500s, db timeouts")
        .unwrap();

    assert_eq!(result.remediation_outcomes.len(), 1);
    assert!(matches!(&result.remediation_outcomes[0], RemediationOutcome::Skipped { reason, .. }
        if reason == "denied by runbook"));
    assert_eq!(orchestrator.gate().session_mutations(), 0);
    // The conclusion stands even though remediation was refused.
    assert!(result.root_cause.is_some());
}
