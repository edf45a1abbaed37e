// crates/batch-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Batch Gate Runtime
// Description: Batch engine, audit sinks, and the in-memory reference host.
// Purpose: Execute call bundles against a host environment.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the batch engine and its supporting adapters.
//! Every entry point (outer batch or authenticated reentry) calls into the
//! same executor loop.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod engine;
pub mod host;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::BatchAuditEvent;
pub use audit::BatchAuditSink;
pub use audit::FileAuditSink;
pub use audit::InMemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use engine::BatchEngine;
pub use engine::BatchEngineConfig;
pub use engine::BatchError;
pub use engine::DEFAULT_MAX_CALLS_PER_BUNDLE;
pub use engine::DEFAULT_MAX_PAYLOAD_BYTES;
pub use engine::DEFAULT_MAX_REENTRY_DEPTH;
pub use host::DispatchRecord;
pub use host::InMemoryHost;
pub use host::TargetHandler;
