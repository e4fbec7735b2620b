// crates/faultline-audit/src/lib.rs
// ============================================================================
// Module: Faultline Audit Library
// Description: Audit sinks and replay for the investigation trail.
// Purpose: Persist, fan out, and reconstruct investigation audit records.
// Dependencies: faultline-core, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! `faultline-audit` provides the sink implementations the orchestrator
//! appends to (in-memory, JSON-lines log, bounded live channel) and a replay
//! builder that reconstructs the hypothesis tree and terminal state from an
//! ordered record stream. Replay verifies each record hash, so a tampered
//! trail fails loudly instead of replaying silently wrong.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod replay;
pub mod sink;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use replay::ReplayError;
pub use replay::ReplayedInvestigation;
pub use replay::replay;
pub use sink::ChannelSink;
pub use sink::FanoutSink;
pub use sink::LogSink;
pub use sink::MemorySink;
