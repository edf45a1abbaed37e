// crates/batch-gate-core/src/lib.rs
// ============================================================================
// Module: Batch Gate Core Library
// Description: Public API surface for the Batch Gate core.
// Purpose: Expose call types, the host interface, and the batch engine.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Batch Gate executes an ordered bundle of sub-calls as one logical operation
//! and lets exactly one pre-authorized sub-call reenter mid-batch to run a
//! nested bundle. Reentry is authenticated by a commitment derived from the
//! target identity and the hash of the bundle it will call back with. The
//! engine is host-agnostic and integrates through the [`CallHost`] interface.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::CallFailure;
pub use interfaces::CallHost;
pub use interfaces::CallRequest;
pub use interfaces::CallReturn;
pub use interfaces::HostCheckpoint;
pub use runtime::BatchAuditEvent;
pub use runtime::BatchAuditSink;
pub use runtime::BatchEngine;
pub use runtime::BatchEngineConfig;
pub use runtime::BatchError;
pub use runtime::InMemoryAuditSink;
pub use runtime::InMemoryHost;
