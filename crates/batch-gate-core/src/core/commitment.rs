// crates/batch-gate-core/src/core/commitment.rs
// ============================================================================
// Module: Batch Gate Reentry Commitments
// Description: Callback seeds and caller-bound reentry commitments.
// Purpose: Derive the single value that authenticates an expected callback.
// Dependencies: crate::core::{hashing, identifiers, call}, serde
// ============================================================================

//! ## Overview
//! A callback seed is the canonical hash of the bundle a target is expected to
//! pass back into the engine. A reentry commitment binds that seed to the
//! target identity: `hash(target, seed)`. Only the designated target, calling
//! back with a bundle that hashes to the same seed, recomputes the same
//! commitment.
//!
//! Security posture: commitments are derived, never caller-chosen, and are
//! compared as whole digests including the algorithm tag.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::call::CallDescriptor;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::Address;

// ============================================================================
// SECTION: Commitment
// ============================================================================

/// Canonical preimage hashed into a reentry commitment.
#[derive(Serialize)]
struct CommitmentPreimage<'a> {
    /// Identity allowed to reenter.
    target: &'a Address,
    /// Seed the reentering bundle must hash to.
    seed: &'a HashDigest,
}

/// Commitment authorizing exactly one `{caller, bundle}` pair to reenter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReentryCommitment(HashDigest);

impl ReentryCommitment {
    /// Derives the commitment for a target and callback seed.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the preimage cannot be canonicalized.
    pub fn derive(
        algorithm: HashAlgorithm,
        target: &Address,
        seed: &HashDigest,
    ) -> Result<Self, HashError> {
        let preimage = CommitmentPreimage {
            target,
            seed,
        };
        hash_canonical_json(algorithm, &preimage).map(Self)
    }

    /// Returns the underlying digest.
    #[must_use]
    pub const fn digest(&self) -> &HashDigest {
        &self.0
    }
}

impl fmt::Display for ReentryCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Seeds
// ============================================================================

/// Computes the callback seed for a bundle a target will reenter with.
///
/// # Errors
///
/// Returns [`HashError`] when the bundle cannot be canonicalized.
pub fn callback_seed(
    algorithm: HashAlgorithm,
    calls: &[CallDescriptor],
) -> Result<HashDigest, HashError> {
    hash_canonical_json(algorithm, calls)
}
