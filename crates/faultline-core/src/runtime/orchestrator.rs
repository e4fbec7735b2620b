// crates/faultline-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Faultline Investigation Orchestrator
// Description: Phase-machine driver for one incident investigation run.
// Purpose: Coordinate model, tools, knowledge, budget, safety, and audit.
// Dependencies: crate::{core, interfaces, runtime}, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The orchestrator owns one investigation end to end: triage the incident,
//! form hypotheses, iterate probe-and-evaluate cycles against the hypothesis
//! tree, conclude a root cause, and gate any remediation behind the safety
//! gate. Every state transition and tree mutation is emitted to the audit
//! sink before the run proceeds; an audit failure aborts the run rather than
//! continuing unrecorded. Model and tool failures degrade the run (recorded
//! in order) instead of crashing it. All timestamps come from the injected
//! clock, so a run driven by a logical clock is fully deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde_json::json;
use thiserror::Error;

use crate::core::audit::AuditEvent;
use crate::core::audit::AuditRecord;
use crate::core::evidence::Evidence;
use crate::core::evidence::EvidenceSource;
use crate::core::evidence::EvidenceStrength;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashError;
use crate::core::hypothesis::HypothesisStatus;
use crate::core::identifiers::HypothesisId;
use crate::core::identifiers::InvestigationId;
use crate::core::identifiers::OperationId;
use crate::core::identifiers::ToolName;
use crate::core::operation::ApprovalState;
use crate::core::operation::Environment;
use crate::core::operation::Operation;
use crate::core::state::ContextCategory;
use crate::core::state::HypothesisSummary;
use crate::core::state::InvestigationPhase;
use crate::core::state::InvestigationResult;
use crate::core::state::InvestigationState;
use crate::core::state::RemediationOutcome;
use crate::core::state::RemediationPlan;
use crate::core::state::RemediationStep;
use crate::core::state::StepErrorPolicy;
use crate::interfaces::ApprovalChannel;
use crate::interfaces::AuditError;
use crate::interfaces::AuditSink;
use crate::interfaces::Clock;
use crate::interfaces::KnowledgeDoc;
use crate::interfaces::KnowledgeRetriever;
use crate::interfaces::LlmProvider;
use crate::interfaces::ToolCall;
use crate::interfaces::ToolDescriptor;
use crate::interfaces::ToolExecutionError;
use crate::interfaces::ToolExecutor;
use crate::runtime::budget::BudgetThresholds;
use crate::runtime::budget::ContextBudget;
use crate::runtime::decode;
use crate::runtime::decode::ConclusionResponse;
use crate::runtime::decode::HypothesisSetResponse;
use crate::runtime::decode::ProbePlanResponse;
use crate::runtime::decode::RemediationPlanResponse;
use crate::runtime::decode::TriageResponse;
use crate::runtime::engine::BranchOutcome;
use crate::runtime::engine::EngineError;
use crate::runtime::engine::HypothesisEngine;
use crate::runtime::evaluator;
use crate::runtime::safety::GateOutcome;
use crate::runtime::safety::SafetyGate;
use crate::runtime::safety::SafetyPolicy;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Fixed system prompt framing every model call.
const SYSTEM_PROMPT: &str = "You are an incident investigation assistant. \
    Respond with a single JSON object matching the requested schema and \
    nothing else.";

/// Run limits for one investigation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorLimits {
    /// Maximum probe-and-evaluate iterations before forced conclusion.
    pub max_iterations: u32,
    /// Wall budget in clock milliseconds before forced conclusion.
    pub investigation_timeout_ms: u64,
    /// Confidence at which an active hypothesis is confirmed.
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
    pub tool_timeout_ms: u64,
    /// Whether a confirmed conclusion proceeds to gated remediation.
    pub auto_remediate: bool,
    /// Environment operations are proposed against.
    pub environment: Environment,
    /// Context budget thresholds.
    pub budget: BudgetThresholds,
}

impl Default for OrchestratorLimits {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            investigation_timeout_ms: 600_000,
            confidence_threshold: 0.8,
            max_hypotheses: 5,
            branch_factor: 3,
            max_depth: 3,
            knowledge_limit: 5,
            max_probes_per_iteration: 3,
            tool_timeout_ms: 30_000,
            auto_remediate: false,
            environment: Environment::Production,
            budget: BudgetThresholds::default(),
        }
    }
}

/// Full orchestrator configuration: run limits plus safety policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestratorConfig {
    /// Run limits.
    pub limits: OrchestratorLimits,
    /// Safety gate policy.
    pub policy: SafetyPolicy,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal orchestrator errors.
///
/// Model, tool, knowledge, and approval failures degrade the run instead of
/// surfacing here; only audit and internal-consistency failures are fatal.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// An audit record could not be hashed.
    #[error("audit record hashing failed: {0}")]
    Hash(#[from] HashError),
    /// The audit sink rejected a record; the run aborts unrecorded work.
    #[error("audit sink failed: {0}")]
    Audit(#[from] AuditError),
    /// The hypothesis tree rejected an internally generated mutation.
    #[error("hypothesis engine rejected an internal mutation: {0}")]
    Engine(#[from] EngineError),
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Drives investigations against injected provider implementations.
///
/// # Invariants
/// - One investigation runs at a time; the safety gate's mutation counter
///   spans the orchestrator session, not a single run.
/// - The clock is the only source of time for the entire run.
pub struct Orchestrator<L, T, K, A, P, C> {
    /// Model provider.
    llm: L,
    /// Diagnostic and remediation tool executor.
    tools: T,
    /// Knowledge retriever for historical incident patterns.
    knowledge: K,
    /// Append-only audit sink.
    audit: A,
    /// Approval channel for gated operations.
    approvals: P,
    /// Injected time source.
    clock: C,
    /// Run limits.
    limits: OrchestratorLimits,
    /// Hypothesis tree engine.
    engine: HypothesisEngine,
    /// Session safety gate.
    gate: SafetyGate,
    /// Monotonic audit sequence across the session.
    seq: u64,
    /// Monotonic operation counter across the session.
    operation_seq: u64,
    /// Cooperative cancellation flag shared with callers.
    cancelled: Arc<AtomicBool>,
}

impl<L, T, K, A, P, C> Orchestrator<L, T, K, A, P, C>
where
    L: LlmProvider,
    T: ToolExecutor,
    K: KnowledgeRetriever,
    A: AuditSink,
    P: ApprovalChannel,
    C: Clock,
{
    /// Creates an orchestrator from provider implementations and config.
    #[must_use]
    pub fn new(
        llm: L,
        tools: T,
        knowledge: K,
        audit: A,
        approvals: P,
        clock: C,
        config: OrchestratorConfig,
    ) -> Self {
        let engine = HypothesisEngine::new(config.limits.max_depth);
        Self {
            llm,
            tools,
            knowledge,
            audit,
            approvals,
            clock,
            limits: config.limits,
            engine,
            gate: SafetyGate::new(config.policy),
            seq: 1,
            operation_seq: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a handle that cancels the current run when set.
    #[must_use]
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Returns the session safety gate.
    #[must_use]
    pub const fn gate(&self) -> &SafetyGate {
        &self.gate
    }

    /// Runs one investigation to a terminal phase.
    ///
    /// # Errors
    /// Returns [`OrchestratorError`] when the audit pipeline fails or the
    /// hypothesis tree rejects an internally generated mutation. All other
    /// failures degrade the run and are recorded in the result.
    pub fn investigate(
        &mut self,
        investigation_id: InvestigationId,
        query: &str,
    ) -> Result<InvestigationResult, OrchestratorError> {
        self.cancelled.store(false, Ordering::SeqCst);
        let started_at = self.clock.now();
        let mut state = InvestigationState::new(investigation_id, query, started_at);
        let mut budget = ContextBudget::new(self.limits.budget);
        budget.record_text(ContextCategory::SystemPrompt, SYSTEM_PROMPT);
        budget.record_text(ContextCategory::History, query);

        let summary = self.run_triage(&mut state, &mut budget)?;
        let docs = self.run_hypothesize(&mut state, &mut budget, &summary)?;
        if state.hypotheses.is_empty() {
            self.degrade(&mut state, "no hypotheses formed; concluding without a root cause")?;
        } else {
            self.run_loop(&mut state, &mut budget, &docs)?;
        }

        if self.cancelled.load(Ordering::SeqCst) {
            self.set_phase(&mut state, InvestigationPhase::Cancelled)?;
            state.context_usage = *budget.usage();
            return Ok(build_result(&state, RemediationPlan::default(), Vec::new(), Vec::new()));
        }

        let (affected_resources, plan, outcomes) = self.run_conclude(&mut state, &mut budget)?;
        self.set_phase(&mut state, InvestigationPhase::Complete)?;
        state.context_usage = *budget.usage();
        Ok(build_result(&state, plan, outcomes, affected_resources))
    }

    // ------------------------------------------------------------------
    // Triage
    // ------------------------------------------------------------------

    /// Frames the incident; falls back to the raw query on failure.
    fn run_triage(
        &mut self,
        state: &mut InvestigationState,
        budget: &mut ContextBudget,
    ) -> Result<String, OrchestratorError> {
        let prompt = format!(
            "Incident report: {query}\n\
             Summarize the incident and list the systems involved as JSON: \
             {{\"summary\": string, \"affected_systems\": [string]}}",
            query = state.query,
        );
        match self.complete_decoded::<TriageResponse>(&prompt, budget) {
            Ok(triage) => {
                budget.record_text(ContextCategory::WorkingMemory, &triage.summary);
                Ok(triage.summary)
            }
            Err(reason) => {
                self.degrade(state, format!("triage degraded: {reason}"))?;
                Ok(state.query.clone())
            }
        }
    }

    // ------------------------------------------------------------------
    // Hypothesize
    // ------------------------------------------------------------------

    /// Retrieves knowledge and forms the initial hypothesis set.
    fn run_hypothesize(
        &mut self,
        state: &mut InvestigationState,
        budget: &mut ContextBudget,
        summary: &str,
    ) -> Result<Vec<KnowledgeDoc>, OrchestratorError> {
        self.set_phase(state, InvestigationPhase::Hypothesize)?;

        let docs = match self.knowledge.search(&state.query, self.limits.knowledge_limit) {
            Ok(docs) => docs,
            Err(err) => {
                self.degrade(state, format!("knowledge retrieval degraded: {err}"))?;
                Vec::new()
            }
        };
        for doc in &docs {
            budget.record_text(ContextCategory::Knowledge, &doc.body);
        }

        let prompt = hypothesize_prompt(summary, &docs, self.limits.max_hypotheses);
        let mut candidates = match self.complete_decoded::<HypothesisSetResponse>(&prompt, budget) {
            Ok(response) => response.into_candidates(),
            Err(reason) => {
                self.degrade(state, format!("hypothesis formation degraded: {reason}"))?;
                Vec::new()
            }
        };
        candidates.truncate(self.limits.max_hypotheses);
        for candidate in &mut candidates {
            candidate.knowledge_match = matches_knowledge(&candidate.statement, &docs);
        }

        let formed = self.engine.form(&mut state.hypotheses, candidates);
        for id in formed {
            if let Some(node) = state.hypotheses.get(&id) {
                let snapshot = node.clone();
                budget.record_text(ContextCategory::HypothesisState, &snapshot.statement);
                self.emit(state, AuditEvent::HypothesisFormed {
                    hypothesis: snapshot,
                })?;
            }
        }
        Ok(docs)
    }

    // ------------------------------------------------------------------
    // Investigate / Evaluate loop
    // ------------------------------------------------------------------

    /// Runs probe-and-evaluate iterations until a terminal condition.
    fn run_loop(
        &mut self,
        state: &mut InvestigationState,
        budget: &mut ContextBudget,
        docs: &[KnowledgeDoc],
    ) -> Result<(), OrchestratorError> {
        while state.iteration_count < self.limits.max_iterations {
            if self.cancelled.load(Ordering::SeqCst) {
                return Ok(());
            }
            if let Some(elapsed) = self.elapsed_ms(state)
                && elapsed >= self.limits.investigation_timeout_ms
            {
                self.degrade(
                    state,
                    format!("investigation timeout after {elapsed} ms; concluding early"),
                )?;
                return Ok(());
            }

            state.iteration_count += 1;

            self.set_phase(state, InvestigationPhase::Investigate)?;
            let ranked = self.engine.prioritize(&state.hypotheses);
            let Some(top) = ranked.first().cloned() else {
                self.degrade(state, "no active hypotheses remain; concluding early")?;
                return Ok(());
            };
            self.run_probes(state, budget, &ranked)?;

            self.set_phase(state, InvestigationPhase::Evaluate)?;
            self.maybe_branch(state, budget, docs, &top)?;
            self.apply_prunes(state)?;
            self.apply_merges(state)?;

            if budget.should_compact() {
                let report = budget.compact(&state.hypotheses, state.investigation_id.clone());
                self.emit(state, AuditEvent::ContextCompacted {
                    before_tokens: report.before_tokens,
                    after_tokens: report.after_tokens,
                    collapsed: report.collapsed.into_iter().map(|entry| entry.id).collect(),
                })?;
            }
            state.context_usage = *budget.usage();

            if self.try_confirm(state)? {
                return Ok(());
            }
            if state.hypotheses.active_ids().is_empty() {
                self.degrade(state, "all hypotheses resolved without confirmation")?;
                return Ok(());
            }
        }
        self.degrade(state, "iteration limit reached; concluding with best hypothesis")?;
        Ok(())
    }

    /// Plans and executes this iteration's probes, attaching evidence.
    fn run_probes(
        &mut self,
        state: &mut InvestigationState,
        budget: &mut ContextBudget,
        ranked: &[HypothesisId],
    ) -> Result<(), OrchestratorError> {
        let descriptors = self.tools.descriptors();
        let prompt = probe_prompt(state, &descriptors, ranked);
        let plan = match self.complete_decoded::<ProbePlanResponse>(&prompt, budget) {
            Ok(plan) => plan,
            Err(reason) => {
                self.degrade(state, format!("probe planning degraded: {reason}"))?;
                fallback_probe_plan(ranked, &descriptors)
            }
        };

        // Plan first, execute as one batch, then mutate the tree
        // sequentially so the batch may run concurrently under the hood.
        let mut targets = Vec::new();
        let mut calls = Vec::new();
        for probe in plan.probes.into_iter().take(self.limits.max_probes_per_iteration) {
            let id = HypothesisId::from(probe.hypothesis_id.as_str());
            let Some(node) = state.hypotheses.get(&id) else {
                continue;
            };
            if node.status.is_terminal() {
                continue;
            }
            targets.push((id, node.statement.clone()));
            calls.push(ToolCall {
                tool: ToolName::from(probe.tool.as_str()),
                args: probe.args,
            });
        }

        let results = self.tools.execute_batch(&calls, self.limits.tool_timeout_ms);
        for (((id, statement), call), outcome) in
            targets.into_iter().zip(calls).zip(results)
        {
            let observed_at = self.clock.now();
            let evidence = match outcome {
                Ok(result) => {
                    budget.record_text(ContextCategory::ToolResults, &result.to_string());
                    let correlation = evaluator::correlate(&result, &statement);
                    Evidence {
                        source: EvidenceSource {
                            tool: call.tool,
                            args: call.args,
                        },
                        strength: evaluator::strength_from_correlation(correlation),
                        data: result,
                        correlation,
                        observed_at,
                        reason: None,
                    }
                }
                Err(err) => Evidence {
                    source: EvidenceSource {
                        tool: call.tool,
                        args: call.args,
                    },
                    strength: EvidenceStrength::None,
                    data: json!({ "error": err.to_string() }),
                    correlation: 0.0,
                    observed_at,
                    reason: Some(match err {
                        ToolExecutionError::Timeout(_) => "timeout".to_string(),
                        other => other.to_string(),
                    }),
                },
            };
            let confidence = self.engine.attach_evidence(&mut state.hypotheses, &id, evidence.clone())?;
            self.emit(state, AuditEvent::EvidenceAttached {
                id,
                evidence,
                confidence,
            })?;
        }
        Ok(())
    }

    /// Branches the top hypothesis when its latest evidence is strong.
    fn maybe_branch(
        &mut self,
        state: &mut InvestigationState,
        budget: &mut ContextBudget,
        docs: &[KnowledgeDoc],
        top: &HypothesisId,
    ) -> Result<(), OrchestratorError> {
        let Some(node) = state.hypotheses.get(top) else {
            return Ok(());
        };
        let latest_strong = node
            .latest_evidence()
            .is_some_and(|evidence| evidence.strength == EvidenceStrength::Strong);
        if !latest_strong || node.confidence >= self.limits.confidence_threshold {
            return Ok(());
        }

        let prompt = branch_prompt(&node.statement, self.limits.branch_factor);
        let mut candidates = match self.complete_decoded::<HypothesisSetResponse>(&prompt, budget) {
            Ok(response) => response.into_candidates(),
            Err(reason) => {
                self.degrade(state, format!("branch refinement degraded: {reason}"))?;
                return Ok(());
            }
        };
        candidates.truncate(self.limits.branch_factor);
        if candidates.is_empty() {
            return Ok(());
        }
        for candidate in &mut candidates {
            candidate.knowledge_match = matches_knowledge(&candidate.statement, docs);
        }

        match self.engine.branch(&mut state.hypotheses, top, candidates)? {
            BranchOutcome::Branched {
                children,
            } => {
                for child in &children {
                    if let Some(formed) = state.hypotheses.get(child) {
                        let snapshot = formed.clone();
                        budget.record_text(ContextCategory::HypothesisState, &snapshot.statement);
                        self.emit(state, AuditEvent::HypothesisFormed {
                            hypothesis: snapshot,
                        })?;
                    }
                }
                self.emit(state, AuditEvent::HypothesisBranched {
                    parent: top.clone(),
                    children,
                })
            }
            BranchOutcome::Rejected {
                reason,
            } => self.emit(state, AuditEvent::BranchRejected {
                id: top.clone(),
                reason,
            }),
        }
    }

    /// Applies the maintenance prune pass and audits each prune.
    fn apply_prunes(&mut self, state: &mut InvestigationState) -> Result<(), OrchestratorError> {
        for candidate in self.engine.prune_candidates(&state.hypotheses) {
            self.engine
                .prune(&mut state.hypotheses, &candidate.id, candidate.reason.clone())?;
            self.emit(state, AuditEvent::HypothesisPruned {
                id: candidate.id,
                reason: candidate.reason,
            })?;
        }
        Ok(())
    }

    /// Applies the maintenance merge pass and audits each merge.
    ///
    /// Candidates are computed once per pass; a candidate invalidated by an
    /// earlier merge in the same pass is skipped.
    fn apply_merges(&mut self, state: &mut InvestigationState) -> Result<(), OrchestratorError> {
        for candidate in self.engine.merge_candidates(&state.hypotheses) {
            let reason = format!("duplicate signal: {signal}", signal = candidate.signal);
            let Ok(confidence) =
                self.engine
                    .merge(&mut state.hypotheses, &candidate.source, &candidate.into, reason.clone())
            else {
                continue;
            };
            self.emit(state, AuditEvent::HypothesisMerged {
                source: candidate.source,
                into: candidate.into,
                reason,
                confidence,
            })?;
        }
        Ok(())
    }

    /// Confirms the best active hypothesis once it clears the threshold.
    fn try_confirm(&mut self, state: &mut InvestigationState) -> Result<bool, OrchestratorError> {
        let best = state
            .hypotheses
            .active_ids()
            .into_iter()
            .filter_map(|id| {
                let confidence = state.hypotheses.get(&id)?.confidence;
                Some((id, confidence))
            })
            .max_by(|left, right| left.1.total_cmp(&right.1));
        let Some((id, confidence)) = best else {
            return Ok(false);
        };
        if confidence < self.limits.confidence_threshold {
            return Ok(false);
        }
        let reason = format!(
            "confidence {confidence:.2} cleared threshold {threshold:.2}",
            threshold = self.limits.confidence_threshold,
        );
        let confirmed = self.engine.confirm(&mut state.hypotheses, &id, reason.clone())?;
        self.emit(state, AuditEvent::HypothesisConfirmed {
            id,
            reason,
            confidence: confirmed,
        })?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Conclude / Remediate
    // ------------------------------------------------------------------

    /// Concludes the run and, when confirmed and enabled, remediates.
    fn run_conclude(
        &mut self,
        state: &mut InvestigationState,
        budget: &mut ContextBudget,
    ) -> Result<(Vec<String>, RemediationPlan, Vec<RemediationOutcome>), OrchestratorError> {
        self.set_phase(state, InvestigationPhase::Conclude)?;

        let confirmed = state
            .hypotheses
            .ids()
            .iter()
            .filter_map(|id| state.hypotheses.get(id))
            .filter(|node| node.status == HypothesisStatus::Confirmed)
            .max_by(|left, right| left.confidence.total_cmp(&right.confidence))
            .cloned();

        let Some(node) = confirmed else {
            // Inconclusive: surface the best remaining signal without claiming
            // a root cause.
            let best_confidence = state
                .hypotheses
                .ids()
                .iter()
                .filter_map(|id| state.hypotheses.get(id))
                .map(|candidate| candidate.confidence)
                .fold(0.0_f64, f64::max);
            state.root_cause = None;
            state.confidence = Some(best_confidence);
            return Ok((Vec::new(), RemediationPlan::default(), Vec::new()));
        };

        let prompt = conclusion_prompt(&node.statement, &state.query);
        let (root_cause, affected_resources) =
            match self.complete_decoded::<ConclusionResponse>(&prompt, budget) {
                Ok(conclusion) => (conclusion.root_cause, conclusion.affected_resources),
                Err(reason) => {
                    self.degrade(state, format!("conclusion drafting degraded: {reason}"))?;
                    (node.statement.clone(), Vec::new())
                }
            };
        state.root_cause = Some(root_cause.clone());
        state.confidence = Some(node.confidence);
        self.emit(state, AuditEvent::Concluded {
            root_cause,
            confidence: node.confidence,
        })?;

        if !self.limits.auto_remediate {
            return Ok((affected_resources, RemediationPlan::default(), Vec::new()));
        }

        self.set_phase(state, InvestigationPhase::Remediate)?;
        let prompt = remediation_prompt(&node.statement, &affected_resources);
        let plan = match self.complete_decoded::<RemediationPlanResponse>(&prompt, budget) {
            Ok(response) => response.into_plan(),
            Err(reason) => {
                self.degrade(state, format!("remediation planning degraded: {reason}"))?;
                RemediationPlan::default()
            }
        };
        let outcomes = self.execute_plan(state, &plan)?;
        Ok((affected_resources, plan, outcomes))
    }

    /// Gates and executes each remediation step in order.
    ///
    /// A denied step is skipped and the plan continues; an execution failure
    /// under the abort policy skips every remaining step.
    fn execute_plan(
        &mut self,
        state: &mut InvestigationState,
        plan: &RemediationPlan,
    ) -> Result<Vec<RemediationOutcome>, OrchestratorError> {
        let mut outcomes = Vec::with_capacity(plan.steps.len());
        let mut aborted = false;
        for step in &plan.steps {
            if aborted {
                let operation = self.propose(step);
                outcomes.push(RemediationOutcome::Skipped {
                    operation,
                    reason: "aborted after earlier step failure".to_string(),
                });
                continue;
            }

            let operation = self.propose(step);
            self.emit(state, AuditEvent::ApprovalRequested {
                operation: operation.clone(),
            })?;
            let now = self.clock.now();
            match self.gate.request_approval(operation, now, &self.approvals) {
                GateOutcome::Approved {
                    operation, ..
                } => {
                    self.emit(state, AuditEvent::ApprovalDecided {
                        operation: operation.clone(),
                        state: ApprovalState::Approved,
                    })?;
                    let outcome = self.execute_step(state, step, operation)?;
                    if matches!(outcome, RemediationOutcome::Failed { .. })
                        && step.on_error == StepErrorPolicy::Abort
                    {
                        aborted = true;
                    }
                    outcomes.push(outcome);
                }
                GateOutcome::Denied {
                    operation,
                    reason,
                } => {
                    self.emit(state, AuditEvent::ApprovalDecided {
                        operation: operation.clone(),
                        state: operation.approval_state,
                    })?;
                    outcomes.push(RemediationOutcome::Skipped {
                        operation,
                        reason,
                    });
                }
                GateOutcome::Rejected {
                    operation,
                    violation,
                } => {
                    let reason = violation.to_string();
                    self.emit(state, AuditEvent::OperationRejected {
                        operation: operation.clone(),
                        reason: reason.clone(),
                    })?;
                    outcomes.push(RemediationOutcome::Skipped {
                        operation,
                        reason,
                    });
                }
            }
        }
        Ok(outcomes)
    }

    /// Executes one approved step with its retry budget.
    fn execute_step(
        &mut self,
        state: &mut InvestigationState,
        step: &RemediationStep,
        operation: Operation,
    ) -> Result<RemediationOutcome, OrchestratorError> {
        let (tool, args) = step_invocation(step);
        let max_attempts = match step.on_error {
            StepErrorPolicy::Abort => 1,
            StepErrorPolicy::Retry => step.max_retries.saturating_add(1),
        };
        let mut attempts = 0_u32;
        let mut last_error = String::new();
        while attempts < max_attempts {
            attempts += 1;
            match self.tools.execute(&tool, &args, self.limits.tool_timeout_ms) {
                Ok(_) => {
                    self.emit(state, AuditEvent::OperationExecuted {
                        operation: operation.clone(),
                        attempts,
                    })?;
                    return Ok(RemediationOutcome::Executed {
                        operation,
                        attempts,
                    });
                }
                Err(err) => last_error = err.to_string(),
            }
        }
        self.degrade(state, format!(
            "operation {id} failed after {attempts} attempts: {last_error}",
            id = operation.operation_id,
        ))?;
        Ok(RemediationOutcome::Failed {
            operation,
            error: last_error,
            attempts,
        })
    }

    /// Builds a pending operation for a plan step.
    fn propose(&mut self, step: &RemediationStep) -> Operation {
        self.operation_seq += 1;
        let id = OperationId::new(format!("op-{seq}", seq = self.operation_seq));
        let mut operation = Operation::proposed(
            id,
            step.command.clone(),
            self.limits.environment,
            step.mutating,
            self.clock.now(),
        );
        operation.affected_resources = step.affected_resources.clone();
        operation.rollback_command = step.rollback_command.clone();
        operation
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    /// Completes a prompt and decodes the response, normalizing errors.
    fn complete_decoded<R: serde::de::DeserializeOwned>(
        &mut self,
        prompt: &str,
        budget: &mut ContextBudget,
    ) -> Result<R, String> {
        budget.record_text(ContextCategory::History, prompt);
        let raw = self
            .llm
            .complete(SYSTEM_PROMPT, prompt)
            .map_err(|err| err.to_string())?;
        budget.record_text(ContextCategory::History, &raw);
        decode::decode(&raw).map_err(|err| err.to_string())
    }

    /// Transitions to a new phase, emitting the audit record.
    fn set_phase(
        &mut self,
        state: &mut InvestigationState,
        to: InvestigationPhase,
    ) -> Result<(), OrchestratorError> {
        if state.phase == to {
            return Ok(());
        }
        let from = state.phase;
        state.phase = to;
        self.emit(state, AuditEvent::PhaseChanged {
            from,
            to,
        })
    }

    /// Records a degraded path in order and audits it.
    fn degrade(
        &mut self,
        state: &mut InvestigationState,
        reason: impl Into<String>,
    ) -> Result<(), OrchestratorError> {
        let reason = reason.into();
        state.degradations.push(reason.clone());
        self.emit(state, AuditEvent::Degraded {
            reason,
        })
    }

    /// Appends one audit record; failure aborts the run.
    fn emit(
        &mut self,
        state: &InvestigationState,
        event: AuditEvent,
    ) -> Result<(), OrchestratorError> {
        let record = AuditRecord::build(
            self.seq,
            state.investigation_id.clone(),
            self.clock.now(),
            event,
            DEFAULT_HASH_ALGORITHM,
        )?;
        self.audit.append(&record)?;
        self.seq += 1;
        Ok(())
    }

    /// Returns milliseconds elapsed since the run started, when comparable.
    fn elapsed_ms(&self, state: &InvestigationState) -> Option<u64> {
        self.clock.now().millis_since(&state.started_at)
    }
}

// ============================================================================
// SECTION: Prompt Builders
// ============================================================================

/// Builds the hypothesis-formation prompt.
fn hypothesize_prompt(summary: &str, docs: &[KnowledgeDoc], max_hypotheses: usize) -> String {
    let mut prompt = format!(
        "Incident summary: {summary}\n\
         Propose up to {max_hypotheses} falsifiable root-cause hypotheses as \
         JSON: {{\"hypotheses\": [{{\"statement\": string, \"category\": \
         string, \"base_probability\": number}}]}}\n",
    );
    if !docs.is_empty() {
        prompt.push_str("Relevant historical incidents:\n");
        for doc in docs {
            prompt.push_str(&format!("- {title}: {body}\n", title = doc.title, body = doc.body));
        }
    }
    prompt
}

/// Builds the per-iteration probe-planning prompt.
fn probe_prompt(
    state: &InvestigationState,
    descriptors: &[ToolDescriptor],
    ranked: &[HypothesisId],
) -> String {
    let mut prompt = String::from(
        "Select diagnostic probes for the active hypotheses as JSON: \
         {\"probes\": [{\"hypothesis_id\": string, \"tool\": string, \
         \"args\": object}]}\n",
    );
    prompt.push_str("Available tools:\n");
    for descriptor in descriptors {
        if descriptor.mutating {
            continue;
        }
        prompt.push_str(&format!(
            "- {name}: {description}\n",
            name = descriptor.name,
            description = descriptor.description,
        ));
    }
    prompt.push_str("Active hypotheses, highest priority first:\n");
    for id in ranked {
        if let Some(node) = state.hypotheses.get(id) {
            prompt.push_str(&format!(
                "- {id} (confidence {confidence:.2}): {statement}\n",
                confidence = node.confidence,
                statement = node.statement,
            ));
        }
    }
    prompt
}

/// Builds the branch-refinement prompt for one hypothesis.
fn branch_prompt(statement: &str, branch_factor: usize) -> String {
    format!(
        "The hypothesis \"{statement}\" is supported by strong evidence but \
         is not yet specific enough to act on. Propose up to {branch_factor} \
         more specific sub-hypotheses as JSON: {{\"hypotheses\": \
         [{{\"statement\": string, \"category\": string, \
         \"base_probability\": number}}]}}",
    )
}

/// Builds the conclusion prompt for the confirmed hypothesis.
fn conclusion_prompt(statement: &str, query: &str) -> String {
    format!(
        "Incident: {query}\nConfirmed hypothesis: {statement}\n\
         State the root cause and the affected resources as JSON: \
         {{\"root_cause\": string, \"affected_resources\": [string]}}",
    )
}

/// Builds the remediation-planning prompt.
fn remediation_prompt(statement: &str, affected_resources: &[String]) -> String {
    format!(
        "Root cause: {statement}\nAffected resources: {resources}\n\
         Propose ordered remediation steps as JSON: {{\"steps\": \
         [{{\"command\": string, \"affected_resources\": [string], \
         \"rollback_command\": string, \"mutating\": bool, \
         \"max_retries\": number}}]}}",
        resources = affected_resources.join(", "),
    )
}

// ============================================================================
// SECTION: Free Helpers
// ============================================================================

/// Minimum shared significant tokens for a knowledge match.
const KNOWLEDGE_MATCH_TOKENS: usize = 2;

/// Returns true when a statement matches a historical-pattern document.
fn matches_knowledge(statement: &str, docs: &[KnowledgeDoc]) -> bool {
    let statement_tokens = significant_tokens(statement);
    docs.iter().filter(|doc| doc.historical_pattern).any(|doc| {
        let doc_tokens: BTreeSet<String> = significant_tokens(&doc.title)
            .union(&significant_tokens(&doc.body))
            .cloned()
            .collect();
        statement_tokens.intersection(&doc_tokens).count() >= KNOWLEDGE_MATCH_TOKENS
    })
}

/// Lowercased tokens longer than two characters.
fn significant_tokens(text: &str) -> BTreeSet<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Probes the top hypothesis with the first read-only tool.
fn fallback_probe_plan(
    ranked: &[HypothesisId],
    descriptors: &[ToolDescriptor],
) -> ProbePlanResponse {
    let probes = ranked
        .first()
        .zip(descriptors.iter().find(|descriptor| !descriptor.mutating))
        .map(|(id, descriptor)| {
            vec![crate::runtime::decode::ProbeRequest {
                hypothesis_id: id.to_string(),
                tool: descriptor.name.to_string(),
                args: json!({}),
            }]
        })
        .unwrap_or_default();
    ProbePlanResponse {
        probes,
    }
}

/// Maps a remediation step onto a tool invocation.
///
/// The first command token names the action tool; the full command and the
/// touched resources travel in the arguments for executor-side validation.
fn step_invocation(step: &RemediationStep) -> (ToolName, serde_json::Value) {
    let tool = step.command.split_whitespace().next().unwrap_or("noop");
    let args = json!({
        "command": step.command,
        "resources": step.affected_resources,
    });
    (ToolName::from(tool), args)
}

/// Assembles the final result from terminal state.
fn build_result(
    state: &InvestigationState,
    remediation_plan: RemediationPlan,
    remediation_outcomes: Vec<RemediationOutcome>,
    affected_resources: Vec<String>,
) -> InvestigationResult {
    let hypotheses = state
        .hypotheses
        .ids()
        .iter()
        .filter_map(|id| {
            let node = state.hypotheses.get(id)?;
            Some(HypothesisSummary {
                id: id.clone(),
                statement: node.statement.clone(),
                status: node.status,
                confidence: node.confidence,
                evidence_count: node.evidence.len(),
                status_reason: node.status_reason.clone(),
            })
        })
        .collect();
    InvestigationResult {
        investigation_id: state.investigation_id.clone(),
        phase: state.phase,
        root_cause: state.root_cause.clone(),
        confidence: state.confidence.unwrap_or(0.0),
        affected_resources,
        remediation_plan,
        remediation_outcomes,
        hypotheses,
        iterations: state.iteration_count,
        degradations: state.degradations.clone(),
    }
}
