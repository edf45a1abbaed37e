// crates/batch-gate-core/src/core/session.rs
// ============================================================================
// Module: Batch Gate Session
// Description: Ephemeral per-invocation session state.
// Purpose: Track the batch initiator and the single pending reentry commitment.
// Dependencies: crate::core::{commitment, identifiers}
// ============================================================================

//! ## Overview
//! A [`Session`] lives only for the dynamic extent of one outer batch. It is
//! empty before the outer entry point runs and is reset to empty on every exit
//! path. Mutation is crate-private; collaborators only read it through the
//! engine accessors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::commitment::ReentryCommitment;
use crate::core::identifiers::Address;

// ============================================================================
// SECTION: Session
// ============================================================================

/// Ephemeral state for the currently executing outer batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Caller of the outer batch, set while a batch is executing.
    initiator: Option<Address>,
    /// Commitment the next reentry must match, if any.
    pending_commitment: Option<ReentryCommitment>,
    /// Current nesting depth (zero for the outer batch).
    depth: usize,
}

impl Session {
    /// Returns the initiator of the open batch.
    #[must_use]
    pub const fn initiator(&self) -> Option<&Address> {
        self.initiator.as_ref()
    }

    /// Returns the pending reentry commitment.
    #[must_use]
    pub const fn pending_commitment(&self) -> Option<&ReentryCommitment> {
        self.pending_commitment.as_ref()
    }

    /// Returns the current nesting depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true while an outer batch is executing.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.initiator.is_some()
    }

    /// Binds the initiator for a new outer batch.
    pub(crate) fn open(&mut self, initiator: Address) {
        self.initiator = Some(initiator);
        self.pending_commitment = None;
        self.depth = 0;
    }

    /// Resets every field.
    pub(crate) fn close(&mut self) {
        *self = Self::default();
    }

    /// Replaces the pending commitment.
    pub(crate) fn set_pending(&mut self, commitment: Option<ReentryCommitment>) {
        self.pending_commitment = commitment;
    }

    /// Sets the nesting depth.
    pub(crate) const fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }
}
