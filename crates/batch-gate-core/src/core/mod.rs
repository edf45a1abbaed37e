// crates/batch-gate-core/src/core/mod.rs
// ============================================================================
// Module: Batch Gate Core Types
// Description: Call descriptors, identities, commitments, and session state.
// Purpose: Provide stable, serializable types shared by the engine and hosts.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types define the batch wire format, the derived reentry commitment,
//! and the ephemeral session the engine maintains while a batch executes.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod call;
pub mod commitment;
pub mod hashing;
pub mod identifiers;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use call::BatchOutcome;
pub use call::BatchRequest;
pub use call::CallDescriptor;
pub use call::Payload;
pub use call::StepOutcome;
pub use commitment::ReentryCommitment;
pub use commitment::callback_seed;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::Address;
pub use identifiers::Amount;
pub use session::Session;
