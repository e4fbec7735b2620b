// crates/faultline-config/src/lib.rs
// ============================================================================
// Module: Faultline Config Library
// Description: Canonical config model and validation for Faultline.
// Purpose: Single source of truth for faultline.toml semantics.
// Dependencies: faultline-core, serde, toml
// ============================================================================

//! ## Overview
//! `faultline-config` defines the canonical configuration model for
//! Faultline investigations. It provides strict, fail-closed validation:
//! missing files, unknown keys, and out-of-range limits all reject the
//! config rather than silently defaulting into an unsafe posture.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
