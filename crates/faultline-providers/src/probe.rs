// crates/faultline-providers/src/probe.rs
// ============================================================================
// Module: Parallel Probe Runner
// Description: Capped concurrent tool executor with a hard collection deadline.
// Purpose: Bound every tool call's wall time while probing siblings in parallel.
// Dependencies: faultline-core
// ============================================================================

//! ## Overview
//! The probe runner wraps another executor and implements the same execute
//! contract with real deadline enforcement: a batch is fanned out across a
//! capped number of worker threads and collected until `timeout_ms` elapses.
//! A call whose result has not arrived by then is reported as a timeout and
//! its worker is abandoned; abandoned workers exit on their next send once
//! the receiver is gone. Results come back in submission order regardless of
//! completion order. Single calls route through the same machinery, so even
//! a hung tool cannot stall an investigation past its per-call budget.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;
use std::time::Instant;

use faultline_core::ToolCall;
use faultline_core::ToolDescriptor;
use faultline_core::ToolExecutionError;
use faultline_core::ToolExecutor;
use faultline_core::ToolName;
use serde_json::Value;

// ============================================================================
// SECTION: Probe Runner
// ============================================================================

/// Deadline-enforcing concurrent wrapper around a tool executor.
#[derive(Debug)]
pub struct ProbeRunner<E> {
    /// Wrapped executor shared with worker threads.
    inner: Arc<E>,
    /// Maximum worker threads per batch.
    max_parallel: usize,
}

impl<E> ProbeRunner<E>
where
    E: ToolExecutor + Send + Sync + 'static,
{
    /// Wraps an executor; parallelism below one is treated as one.
    #[must_use]
    pub fn new(inner: E, max_parallel: usize) -> Self {
        Self {
            inner: Arc::new(inner),
            max_parallel: max_parallel.max(1),
        }
    }

    /// Returns the configured worker cap.
    #[must_use]
    pub const fn max_parallel(&self) -> usize {
        self.max_parallel
    }
}

impl<E> ToolExecutor for ProbeRunner<E>
where
    E: ToolExecutor + Send + Sync + 'static,
{
    fn execute(
        &self,
        name: &ToolName,
        args: &Value,
        timeout_ms: u64,
    ) -> Result<Value, ToolExecutionError> {
        let calls = [ToolCall {
            tool: name.clone(),
            args: args.clone(),
        }];
        self.execute_batch(&calls, timeout_ms)
            .pop()
            .unwrap_or_else(|| {
                Err(ToolExecutionError::Timeout(format!(
                    "tool call did not complete within {timeout_ms} ms: {name}"
                )))
            })
    }

    fn execute_batch(
        &self,
        calls: &[ToolCall],
        timeout_ms: u64,
    ) -> Vec<Result<Value, ToolExecutionError>> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut results: Vec<Result<Value, ToolExecutionError>> = calls
            .iter()
            .map(|call| {
                Err(ToolExecutionError::Timeout(format!(
                    "tool call did not complete within {timeout_ms} ms: {tool}",
                    tool = call.tool,
                )))
            })
            .collect();
        if calls.is_empty() {
            return results;
        }

        let (sender, receiver) = mpsc::channel::<(usize, Result<Value, ToolExecutionError>)>();
        let chunk_size = calls.len().div_ceil(self.max_parallel).max(1);
        for (chunk_id, chunk) in calls.chunks(chunk_size).enumerate() {
            let sender = sender.clone();
            let inner = Arc::clone(&self.inner);
            let chunk: Vec<ToolCall> = chunk.to_vec();
            let start = chunk_id * chunk_size;
            std::thread::spawn(move || {
                for (offset, call) in chunk.into_iter().enumerate() {
                    let result = inner.execute(&call.tool, &call.args, timeout_ms);
                    if sender.send((start + offset, result)).is_err() {
                        return;
                    }
                }
            });
        }
        drop(sender);

        let mut received = 0;
        while received < results.len() {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            match receiver.recv_timeout(remaining) {
                Ok((index, result)) => {
                    if let Some(slot) = results.get_mut(index) {
                        *slot = result;
                    }
                    received += 1;
                }
                Err(_) => break,
            }
        }
        results
    }

    fn descriptor(&self, name: &ToolName) -> Option<ToolDescriptor> {
        self.inner.descriptor(name)
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.inner.descriptors()
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

    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::registry::ToolAccessPolicy;
    use crate::registry::ToolHandler;
    use crate::registry::ToolRegistry;
    use crate::static_tool::StaticTool;

    struct SleepyTool {
        delay_ms: u64,
    }

    impl ToolHandler for SleepyTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor {
                name: ToolName::from("slow-scan"),
                description: "fixture".to_string(),
                parameter_schema: json!({}),
                mutating: false,
            }
        }

        fn call(&self, _args: &Value, _timeout_ms: u64) -> Result<Value, ToolExecutionError> {
            std::thread::sleep(Duration::from_millis(self.delay_ms));
            Ok(json!({"done": true}))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new(ToolAccessPolicy::default());
        registry.register(StaticTool::new(
            ToolDescriptor {
                name: ToolName::from("get-metrics"),
                description: "fixture".to_string(),
                parameter_schema: json!({}),
                mutating: false,
            },
            json!({"value": 95, "limit": 100}),
        ));
        registry
    }

    fn call(tool: &str) -> ToolCall {
        ToolCall {
            tool: ToolName::from(tool),
            args: json!({}),
        }
    }

    #[test]
    fn results_keep_submission_order() {
        let runner = ProbeRunner::new(registry(), 2);
        let outcomes = runner.execute_batch(&[call("get-metrics"), call("unknown")], 1_000);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1], Err(ToolExecutionError::UnknownTool(_))));
    }

    #[test]
    fn zero_parallelism_still_runs() {
        let runner = ProbeRunner::new(registry(), 0);
        let outcomes = runner.execute_batch(&[call("get-metrics")], 1_000);
        assert!(outcomes[0].is_ok());
    }

    #[test]
    fn slow_call_reports_timeout_at_the_deadline() {
        let mut registry = registry();
        registry.register(SleepyTool {
            delay_ms: 2_000,
        });
        let runner = ProbeRunner::new(registry, 2);

        let started = Instant::now();
        let outcomes = runner.execute_batch(&[call("slow-scan"), call("get-metrics")], 100);
        assert!(started.elapsed() < Duration::from_millis(1_500));
        assert!(matches!(outcomes[0], Err(ToolExecutionError::Timeout(_))));
        assert!(outcomes[1].is_ok());
    }

    #[test]
    fn single_call_honors_its_own_budget() {
        let mut registry = ToolRegistry::new(ToolAccessPolicy::default());
        registry.register(SleepyTool {
            delay_ms: 2_000,
        });
        let runner = ProbeRunner::new(registry, 1);
        let err = runner
            .execute(&ToolName::from("slow-scan"), &json!({}), 100)
            .unwrap_err();
        assert!(matches!(err, ToolExecutionError::Timeout(_)));
    }

    #[test]
    fn descriptors_pass_through_to_the_wrapped_executor() {
        let runner = ProbeRunner::new(registry(), 2);
        let names: Vec<String> = runner
            .descriptors()
            .into_iter()
            .map(|descriptor| descriptor.name.to_string())
            .collect();
        assert_eq!(names, vec!["get-metrics".to_string()]);
    }
}
