// crates/faultline-audit/src/sink/mod.rs
// ============================================================================
// Module: Faultline Audit Sinks
// Description: Sink implementations for the append-only investigation trail.
// Purpose: Persist and fan out audit records behind the core sink interface.
// Dependencies: faultline-core
// ============================================================================

//! ## Overview
//! Sinks receive every audit record the orchestrator emits, in order. The
//! memory sink backs tests and replay, the log sink persists JSON lines, the
//! channel sink feeds live observers with backpressure instead of loss, and
//! the fanout sink composes any of them. A sink failure is fatal to the run
//! upstream, so sinks report errors rather than swallowing them.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod channel;
pub mod fanout;
pub mod log;
pub mod memory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use channel::ChannelSink;
pub use fanout::FanoutSink;
pub use log::LogSink;
pub use memory::MemorySink;
