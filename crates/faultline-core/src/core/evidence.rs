// crates/faultline-core/src/core/evidence.rs
// ============================================================================
// Module: Faultline Evidence Model
// Description: Evidence records and discrete strength classification.
// Purpose: Provide the immutable evidence contract consumed by the scorer.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Evidence captures what a probe observed about a hypothesis. Strength is a
//! discrete three-valued classification, not a continuum; the numeric
//! correlation that produced it is retained for audit display only. Evidence
//! items are immutable once attached to a hypothesis and are never deleted,
//! only superseded by new evidence on new hypotheses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ToolName;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Evidence Strength
// ============================================================================

/// Discrete classification of how well a probe result supports a hypothesis.
///
/// # Invariants
/// - Variants are stable for serialization and audit replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStrength {
    /// The result directly and specifically supports the statement.
    Strong,
    /// The result partially or ambiguously supports the statement.
    Weak,
    /// The result does not support the statement.
    None,
}

impl EvidenceStrength {
    /// Returns the confidence multiplier applied by the scorer.
    ///
    /// The multipliers are a fixed behavioral contract: strong 1.3, weak 1.0,
    /// none 0.5, applied in evidence-arrival order.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Strong => 1.3,
            Self::Weak => 1.0,
            Self::None => 0.5,
        }
    }

    /// Returns a stable label for the strength.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Weak => "weak",
            Self::None => "none",
        }
    }
}

// ============================================================================
// SECTION: Evidence Source
// ============================================================================

/// The tool invocation that produced a piece of evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSource {
    /// Tool name routed through the registry.
    pub tool: ToolName,
    /// Arguments passed to the tool, retained for audit display.
    pub args: Value,
}

impl EvidenceSource {
    /// Returns the source-normalized signal name used for merge equivalence.
    ///
    /// Normalization is the lowercased tool name with arguments ignored; two
    /// strong evidence items from the same normalized source are considered
    /// the same underlying signal.
    #[must_use]
    pub fn normalized_signal(&self) -> String {
        self.tool.as_str().to_ascii_lowercase()
    }
}

// ============================================================================
// SECTION: Evidence Records
// ============================================================================

/// Immutable evidence record attached to a hypothesis.
///
/// # Invariants
/// - Records are append-only; attached evidence is never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Probe invocation that produced this evidence.
    pub source: EvidenceSource,
    /// Discrete strength classification.
    pub strength: EvidenceStrength,
    /// Opaque result payload used for confidence math and human display.
    pub data: Value,
    /// Correlation score in `[0, 1]` that produced the classification.
    pub correlation: f64,
    /// Timestamp at which the evidence was observed.
    pub observed_at: Timestamp,
    /// Optional reason annotation (for example `"timeout"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Evidence {
    /// Returns true when this evidence directly contradicts its hypothesis.
    ///
    /// Contradiction is a correlation of exactly zero or an explicit
    /// `contradicts: true` marker in the payload. Evidence carrying a reason
    /// annotation (probe timeout, tool failure) is absence of signal, not
    /// contradiction, regardless of its correlation.
    #[must_use]
    pub fn contradicts(&self) -> bool {
        if self.correlation == 0.0 && self.reason.is_none() {
            return true;
        }
        self.data
            .get("contradicts")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns true when this evidence supports its hypothesis at all.
    #[must_use]
    pub const fn supports(&self) -> bool {
        !matches!(self.strength, EvidenceStrength::None)
    }
}
