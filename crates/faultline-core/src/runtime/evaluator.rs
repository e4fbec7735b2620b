// crates/faultline-core/src/runtime/evaluator.rs
// ============================================================================
// Module: Faultline Evidence Evaluator
// Description: Evidence strength classification and confidence scoring.
// Purpose: Convert probe results into discrete strengths and confidence values.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! The evaluator is pure: classification maps a raw probe result and a
//! hypothesis statement to a discrete strength through a correlation score,
//! and scoring recomputes confidence from the full evidence list in arrival
//! order. The multiplicative, order-dependent scoring model is a fixed
//! behavioral contract (same multipliers, same boosts, same clamp); it is a
//! heuristic, not a statistical posterior.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_json::Value;

use crate::core::evidence::EvidenceStrength;
use crate::core::hypothesis::Hypothesis;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Correlation above which a result directly supports the statement.
pub const STRONG_CORRELATION: f64 = 0.8;
/// Correlation at or above which a result partially supports the statement.
pub const WEAK_CORRELATION: f64 = 0.4;
/// Boost applied when the hypothesis matches a known historical pattern.
pub const KNOWLEDGE_MATCH_BOOST: f64 = 1.15;
/// Boost applied when at least three independent sources support.
pub const CORROBORATION_BOOST: f64 = 1.1;
/// Independent supporting sources required for the corroboration boost.
pub const CORROBORATION_SOURCES: usize = 3;
/// Upper confidence clamp; certainty is reserved and unreachable.
pub const CONFIDENCE_CEILING: f64 = 0.99;

// ============================================================================
// SECTION: Strength Classification
// ============================================================================

/// Maps a correlation score to a discrete evidence strength.
///
/// Thresholds: above 0.8 strong, 0.4 to 0.8 weak, below 0.4 none.
#[must_use]
pub fn strength_from_correlation(correlation: f64) -> EvidenceStrength {
    if correlation > STRONG_CORRELATION {
        EvidenceStrength::Strong
    } else if correlation >= WEAK_CORRELATION {
        EvidenceStrength::Weak
    } else {
        EvidenceStrength::None
    }
}

/// Classifies a raw probe result against a hypothesis statement.
///
/// Deterministic heuristic used directly and as the fallback when model
/// classification fails to decode: saturation-ratio detection over numeric
/// limit-style pairs, otherwise statement-token overlap against the
/// flattened payload.
#[must_use]
pub fn classify(result: &Value, statement: &str) -> EvidenceStrength {
    strength_from_correlation(correlate(result, statement))
}

/// Computes a correlation score in `[0, 1]` for a probe result.
#[must_use]
pub fn correlate(result: &Value, statement: &str) -> f64 {
    if result.is_null() {
        return 0.0;
    }
    if let Some(ratio) = saturation_ratio(result) {
        return ratio.clamp(0.0, 1.0);
    }
    token_overlap(result, statement)
}

/// Detects a saturation ratio from value/limit style numeric pairs.
///
/// Recognized numerator keys are `connections`, `usage`, `used`, `current`,
/// and `value`; recognized denominator keys are `limit`, `max`, `capacity`,
/// and `total`. The first present pair wins.
fn saturation_ratio(result: &Value) -> Option<f64> {
    const NUMERATORS: &[&str] = &["connections", "usage", "used", "current", "value"];
    const DENOMINATORS: &[&str] = &["limit", "max", "capacity", "total"];

    let object = result.as_object()?;
    let numerator = NUMERATORS.iter().find_map(|key| object.get(*key).and_then(Value::as_f64))?;
    let denominator =
        DENOMINATORS.iter().find_map(|key| object.get(*key).and_then(Value::as_f64))?;
    if denominator <= 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// Computes the fraction of statement tokens present in the payload text.
fn token_overlap(result: &Value, statement: &str) -> f64 {
    let haystack = flatten_lowercase(result);
    let tokens: Vec<String> = statement
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(str::to_ascii_lowercase)
        .collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let matched = tokens.iter().filter(|token| haystack.contains(token.as_str())).count();
    matched_fraction(matched, tokens.len())
}

/// Returns `matched / total` as a float fraction.
fn matched_fraction(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let matched = u32::try_from(matched).unwrap_or(u32::MAX);
    let total = u32::try_from(total).unwrap_or(u32::MAX);
    f64::from(matched) / f64::from(total)
}

/// Flattens a JSON value into lowercase text for token matching.
fn flatten_lowercase(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.to_ascii_lowercase(),
        Value::Array(items) => {
            items.iter().map(flatten_lowercase).collect::<Vec<_>>().join(" ")
        }
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| format!("{} {}", key.to_ascii_lowercase(), flatten_lowercase(item)))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

// ============================================================================
// SECTION: Confidence Scoring
// ============================================================================

/// Recomputes confidence for a hypothesis from its full evidence list.
///
/// A running product seeded at `base_probability` applies the per-item
/// multiplier in evidence-arrival order (strong 1.3, weak 1.0, none 0.5),
/// then a knowledge-match boost (1.15) when the hypothesis matches a known
/// historical pattern, then a corroboration boost (1.1) when at least three
/// independent sources support, and finally clamps to `[0, 0.99]`.
/// Order-dependence is an accepted property of the contract.
#[must_use]
pub fn score(hypothesis: &Hypothesis) -> f64 {
    let mut confidence = hypothesis.base_probability;
    for evidence in &hypothesis.evidence {
        confidence *= evidence.strength.multiplier();
    }
    if hypothesis.knowledge_match {
        confidence *= KNOWLEDGE_MATCH_BOOST;
    }
    if independent_supporting_sources(hypothesis) >= CORROBORATION_SOURCES {
        confidence *= CORROBORATION_BOOST;
    }
    confidence.clamp(0.0, CONFIDENCE_CEILING)
}

/// Counts distinct source-normalized signals with supporting evidence.
fn independent_supporting_sources(hypothesis: &Hypothesis) -> usize {
    let sources: BTreeSet<String> = hypothesis
        .evidence
        .iter()
        .filter(|evidence| evidence.supports())
        .map(|evidence| evidence.source.normalized_signal())
        .collect();
    sources.len()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
