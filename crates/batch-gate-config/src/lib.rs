// crates/batch-gate-config/src/lib.rs
// ============================================================================
// Module: Batch Gate Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for batch-gate.toml semantics.
// Dependencies: batch-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! `batch-gate-config` defines the configuration model for Batch Gate
//! deployments: engine limits, the commitment hash algorithm, and the audit
//! sink. Validation is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
