// crates/faultline-core/src/runtime/decode.rs
// ============================================================================
// Module: Faultline Response Decode
// Description: Structured decoding of model completions into typed responses.
// Purpose: Recover valid JSON payloads from imperfect model output.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Model completions are requested as JSON but arrive as free text. Decoding
//! applies three recovery stages in order: strict parse of the trimmed text,
//! extraction of the first fenced code block, then balanced-brace extraction
//! of the first JSON object or array. If all stages fail the raw text is
//! surfaced in the error so the orchestrator can degrade instead of crash.
//! Response schemas for each phase live here so prompt and decode stay
//! in one place.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::hypothesis::HypothesisCategory;
use crate::core::state::RemediationPlan;
use crate::core::state::RemediationStep;
use crate::core::state::StepErrorPolicy;
use crate::runtime::engine::HypothesisCandidate;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Maximum characters preserved from unparseable completions.
const SNIPPET_LIMIT: usize = 200;

/// Decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No recovery stage produced syntactically valid JSON.
    #[error("no JSON payload found in completion: {snippet}")]
    Unparseable {
        /// Truncated raw completion text.
        snippet: String,
    },
    /// Valid JSON that does not match the expected schema.
    #[error("completion JSON does not match expected schema: {0}")]
    Schema(#[from] serde_json::Error),
}

// ============================================================================
// SECTION: Decode Pipeline
// ============================================================================

/// Decodes a model completion into a typed response.
///
/// # Errors
/// Returns [`DecodeError::Unparseable`] when no stage finds valid JSON and
/// [`DecodeError::Schema`] when the recovered JSON fails deserialization.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, DecodeError> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return Ok(serde_json::from_value(value)?);
    }
    if let Some(block) = fenced_block(trimmed)
        && let Ok(value) = serde_json::from_str::<serde_json::Value>(block)
    {
        return Ok(serde_json::from_value(value)?);
    }
    if let Some(candidate) = balanced_extract(trimmed)
        && let Ok(value) = serde_json::from_str::<serde_json::Value>(candidate)
    {
        return Ok(serde_json::from_value(value)?);
    }
    Err(DecodeError::Unparseable {
        snippet: truncate(trimmed, SNIPPET_LIMIT),
    })
}

/// Returns the interior of the first fenced code block.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip an optional language tag such as `json` on the fence line.
    let body_start = after_fence.find('\n')?;
    let body = &after_fence[body_start + 1..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Extracts the first balanced JSON object or array from free text.
///
/// Tracks string literals and escapes so braces inside strings do not
/// unbalance the scan.
fn balanced_extract(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let bytes = text.as_bytes();
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            _ if in_string => {}
            _ if byte == open => depth += 1,
            _ if byte == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Truncates text on a character boundary.
fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

// ============================================================================
// SECTION: Response Schemas
// ============================================================================

/// Triage-phase response: incident framing before any hypothesis exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResponse {
    /// One-paragraph summary of the reported incident.
    pub summary: String,
    /// Systems the model believes are involved.
    #[serde(default)]
    pub affected_systems: Vec<String>,
}

/// One proposed hypothesis in a hypothesis-set response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisProposal {
    /// Falsifiable statement of the suspected cause.
    pub statement: String,
    /// Failure category.
    pub category: HypothesisCategory,
    /// Model-estimated prior probability.
    pub base_probability: f64,
}

/// Hypothesize-phase response: the initial or branched candidate set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisSetResponse {
    /// Proposed hypotheses, most likely first.
    pub hypotheses: Vec<HypothesisProposal>,
}

impl HypothesisSetResponse {
    /// Converts proposals into engine candidates.
    ///
    /// Knowledge matching is resolved by the orchestrator against retrieved
    /// documents, so proposals start unmatched.
    #[must_use]
    pub fn into_candidates(self) -> Vec<HypothesisCandidate> {
        self.hypotheses
            .into_iter()
            .map(|proposal| HypothesisCandidate {
                statement: proposal.statement,
                category: proposal.category,
                base_probability: proposal.base_probability,
                knowledge_match: false,
            })
            .collect()
    }
}

/// Investigate-phase response: which probe to run next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRequest {
    /// Target hypothesis identifier.
    pub hypothesis_id: String,
    /// Diagnostic tool to invoke.
    pub tool: String,
    /// Tool arguments.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Investigate-phase response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbePlanResponse {
    /// Probes to run this iteration.
    pub probes: Vec<ProbeRequest>,
}

/// Conclude-phase response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConclusionResponse {
    /// Root-cause statement for the confirmed hypothesis.
    pub root_cause: String,
    /// Resources implicated by the root cause.
    #[serde(default)]
    pub affected_resources: Vec<String>,
}

/// One remediation step as proposed by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationStepProposal {
    /// Shell-style command describing the action.
    pub command: String,
    /// Resources the step touches.
    #[serde(default)]
    pub affected_resources: Vec<String>,
    /// Inverse command, when one exists.
    #[serde(default)]
    pub rollback_command: Option<String>,
    /// Whether the step changes system state.
    pub mutating: bool,
    /// Retry budget when the step is retryable.
    #[serde(default)]
    pub max_retries: u32,
}

/// Remediate-phase response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationPlanResponse {
    /// Ordered remediation steps.
    pub steps: Vec<RemediationStepProposal>,
}

impl RemediationPlanResponse {
    /// Converts the proposal into an executable plan.
    ///
    /// Steps with a retry budget use the retry policy; all others abort the
    /// plan on failure.
    #[must_use]
    pub fn into_plan(self) -> RemediationPlan {
        let steps = self
            .steps
            .into_iter()
            .map(|proposal| RemediationStep {
                command: proposal.command,
                affected_resources: proposal.affected_resources,
                rollback_command: proposal.rollback_command,
                mutating: proposal.mutating,
                on_error: if proposal.max_retries > 0 {
                    StepErrorPolicy::Retry
                } else {
                    StepErrorPolicy::Abort
                },
                max_retries: proposal.max_retries,
            })
            .collect();
        RemediationPlan {
            steps,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
