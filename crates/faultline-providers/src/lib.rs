// crates/faultline-providers/src/lib.rs
// ============================================================================
// Module: Faultline Providers Library
// Description: Built-in tool, knowledge, and clock implementations.
// Purpose: Concrete provider backends behind the core interfaces.
// Dependencies: faultline-core, reqwest, serde_json, time
// ============================================================================

//! ## Overview
//! `faultline-providers` supplies the concrete implementations the core
//! orchestrates through its interfaces: a policy-enforcing tool registry,
//! a sequenced fixture tool, a bounded HTTP probe tool, an in-memory
//! knowledge retriever, a capped parallel probe runner, and the wall-clock
//! time source. Production deployments register their own tools; the
//! built-ins cover probing, demos, and tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod clock;
pub mod http_tool;
pub mod knowledge;
pub mod probe;
pub mod registry;
pub mod static_tool;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::SystemClock;
pub use http_tool::HttpTool;
pub use http_tool::HttpToolConfig;
pub use knowledge::InMemoryKnowledge;
pub use probe::ProbeRunner;
pub use registry::ToolAccessPolicy;
pub use registry::ToolHandler;
pub use registry::ToolRegistry;
pub use static_tool::StaticTool;
