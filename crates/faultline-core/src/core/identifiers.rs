// crates/faultline-core/src/core/identifiers.rs
// ============================================================================
// Module: Faultline Identifiers
// Description: Canonical opaque identifiers for investigations and hypotheses.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! Faultline. Identifiers are opaque and serialize as strings, with one
//! exception: [`HypothesisId`] is hierarchical (`h1`, `h1.1`, `h1.1.1`) and
//! encodes tree position, so it additionally exposes depth and parent/child
//! derivation. Validation is handled at runtime boundaries rather than within
//! these simple wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Investigation Identifier
// ============================================================================

/// Investigation identifier scoping one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvestigationId(String);

impl InvestigationId {
    /// Creates a new investigation identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvestigationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for InvestigationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InvestigationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Hypothesis Identifier
// ============================================================================

/// Hierarchical hypothesis identifier encoding tree position.
///
/// # Invariants
/// - Root identifiers take the form `h<n>` with `n >= 1`.
/// - A child identifier is the parent identifier plus a `.<n>` segment, so
///   depth equals the number of dot-separated segments minus one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HypothesisId(String);

impl HypothesisId {
    /// Creates a hypothesis identifier from a raw string form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates the identifier of the `n`-th root hypothesis (1-based).
    #[must_use]
    pub fn root(n: usize) -> Self {
        Self(format!("h{n}"))
    }

    /// Derives the identifier of the `n`-th child of this hypothesis (1-based).
    #[must_use]
    pub fn child(&self, n: usize) -> Self {
        Self(format!("{}.{n}", self.0))
    }

    /// Returns the parent identifier, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('.').map(|(parent, _)| Self(parent.to_string()))
    }

    /// Returns the depth encoded by the identifier (0 for roots).
    #[must_use]
    pub fn depth(&self) -> u32 {
        let dots = self.0.chars().filter(|ch| *ch == '.').count();
        u32::try_from(dots).unwrap_or(u32::MAX)
    }

    /// Returns true when `other` is an ancestor or descendant of this id.
    #[must_use]
    pub fn related_to(&self, other: &Self) -> bool {
        let a = self.0.as_str();
        let b = other.0.as_str();
        a == b
            || (a.starts_with(b) && a.as_bytes().get(b.len()) == Some(&b'.'))
            || (b.starts_with(a) && b.as_bytes().get(a.len()) == Some(&b'.'))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HypothesisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for HypothesisId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for HypothesisId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Tool Name
// ============================================================================

/// Tool name used to route calls through the tool registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolName(String);

impl ToolName {
    /// Creates a new tool name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the tool name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ToolName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ToolName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Operation Identifier
// ============================================================================

/// Identifier for a proposed remediation operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Creates a new operation identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for OperationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OperationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

