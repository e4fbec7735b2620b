// crates/faultline-providers/src/static_tool.rs
// ============================================================================
// Module: Static Fixture Tool
// Description: Tool handler returning canned responses in sequence.
// Purpose: Deterministic tool backend for demos, replay, and tests.
// Dependencies: faultline-core, serde_json
// ============================================================================

//! ## Overview
//! The static tool returns configured responses without touching any external
//! system. A single response repeats forever; a response sequence is consumed
//! in order and the final entry repeats once the sequence is exhausted, so a
//! scripted investigation stays deterministic however many probes run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use faultline_core::ToolDescriptor;
use faultline_core::ToolExecutionError;
use serde_json::Value;

use crate::registry::ToolHandler;

// ============================================================================
// SECTION: Static Tool
// ============================================================================

/// Tool handler backed by canned responses.
pub struct StaticTool {
    /// Advertised descriptor.
    descriptor: ToolDescriptor,
    /// Remaining scripted responses; the last entry repeats.
    responses: Mutex<Vec<Value>>,
}

impl StaticTool {
    /// Creates a tool that always returns one response.
    #[must_use]
    pub fn new(descriptor: ToolDescriptor, response: Value) -> Self {
        Self::with_responses(descriptor, vec![response])
    }

    /// Creates a tool that returns responses in order, repeating the last.
    #[must_use]
    pub fn with_responses(descriptor: ToolDescriptor, responses: Vec<Value>) -> Self {
        Self {
            descriptor,
            responses: Mutex::new(responses),
        }
    }
}

impl ToolHandler for StaticTool {
    fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }

    fn call(&self, _args: &Value, _timeout_ms: u64) -> Result<Value, ToolExecutionError> {
        let mut responses = self
            .responses
            .lock()
            .map_err(|_| ToolExecutionError::Failed("fixture lock poisoned".to_string()))?;
        match responses.len() {
            0 => Err(ToolExecutionError::Failed("no scripted response".to_string())),
            1 => Ok(responses[0].clone()),
            _ => Ok(responses.remove(0)),
        }
    }
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

    use faultline_core::ToolName;
    use serde_json::json;

    use super::*;

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: ToolName::from("get-metrics"),
            description: "fixture".to_string(),
            parameter_schema: json!({}),
            mutating: false,
        }
    }

    #[test]
    fn sequence_consumes_then_repeats_last() {
        let tool = StaticTool::with_responses(
            descriptor(),
            vec![json!({"step": 1}), json!({"step": 2})],
        );
        assert_eq!(tool.call(&json!({}), 1_000).unwrap(), json!({"step": 1}));
        assert_eq!(tool.call(&json!({}), 1_000).unwrap(), json!({"step": 2}));
        assert_eq!(tool.call(&json!({}), 1_000).unwrap(), json!({"step": 2}));
    }

    #[test]
    fn empty_script_fails() {
        let tool = StaticTool::with_responses(descriptor(), Vec::new());
        assert!(tool.call(&json!({}), 1_000).is_err());
    }
}
