// crates/batch-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Batch Gate Interfaces
// Description: Host environment contract for dispatching sub-calls.
// Purpose: Define the seam between the batch engine and call targets.
// Dependencies: crate::core, crate::runtime
// ============================================================================

//! ## Overview
//! The engine treats every call target as an opaque address it invokes through
//! a [`CallHost`]. The host receives a mutable handle to the engine for the
//! duration of each call so a target may read the accessors or reenter through
//! the gate. Hosts that are not natively atomic implement the checkpoint hooks
//! so the engine can discard the effects of failed frames.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::Address;
use crate::core::Amount;
use crate::core::Payload;
use crate::runtime::BatchEngine;
use crate::runtime::BatchError;

// ============================================================================
// SECTION: Call Request / Return
// ============================================================================

/// Single dispatch handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Position of the step within its bundle.
    pub index: usize,
    /// Nesting depth of the bundle (zero for the outer batch).
    pub depth: usize,
    /// Target to invoke.
    pub target: Address,
    /// Value to transfer to the target.
    pub value: Amount,
    /// Opaque payload for the target.
    pub payload: Payload,
}

/// Data returned by a successful call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallReturn {
    /// Opaque return bytes.
    pub data: Vec<u8>,
}

impl CallReturn {
    /// Creates a return value carrying bytes.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
        }
    }
}

// ============================================================================
// SECTION: Call Failure
// ============================================================================

/// Failure reported by a call target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallFailure {
    /// Target reverted with a diagnostic message and data.
    #[error("call reverted: {message}")]
    Reverted {
        /// Human-readable diagnostic.
        message: String,
        /// Raw diagnostic data returned by the target.
        data: Vec<u8>,
    },
    /// Engine rejected an operation attempted inside the target's frame.
    #[error("nested engine error: {0}")]
    Engine(Box<BatchError>),
}

impl CallFailure {
    /// Creates a revert with a message and no data.
    #[must_use]
    pub fn revert(message: impl Into<String>) -> Self {
        Self::Reverted {
            message: message.into(),
            data: Vec::new(),
        }
    }

    /// Returns the raw diagnostic data, empty for engine errors.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        match self {
            Self::Reverted {
                data, ..
            } => data,
            Self::Engine(_) => &[],
        }
    }

    /// Returns the nested engine error, if the failure carries one.
    #[must_use]
    pub fn engine_error(&self) -> Option<&BatchError> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Reverted {
                ..
            } => None,
        }
    }
}

impl From<BatchError> for CallFailure {
    fn from(err: BatchError) -> Self {
        Self::Engine(Box::new(err))
    }
}

// ============================================================================
// SECTION: Host Checkpoints
// ============================================================================

/// Opaque marker for a host state checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCheckpoint(u64);

impl HostCheckpoint {
    /// Creates a checkpoint marker.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw marker.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

// ============================================================================
// SECTION: Call Host
// ============================================================================

/// Host environment that executes sub-calls on behalf of the engine.
pub trait CallHost {
    /// Invokes a target synchronously.
    ///
    /// The engine handle lets the target read the session accessors or call
    /// [`BatchEngine::reenter`] while the call is in progress.
    ///
    /// # Errors
    ///
    /// Returns [`CallFailure`] when the target fails.
    fn invoke(
        &mut self,
        engine: &mut BatchEngine,
        call: &CallRequest,
    ) -> Result<CallReturn, CallFailure>;

    /// Accepts the aggregate value supplied with an outer batch.
    ///
    /// # Errors
    ///
    /// Returns [`CallFailure`] when the value cannot be taken from the caller.
    fn accept_value(&mut self, _from: &Address, _amount: Amount) -> Result<(), CallFailure> {
        Ok(())
    }

    /// Records a checkpoint the engine may later revert to.
    fn checkpoint(&mut self) -> HostCheckpoint {
        HostCheckpoint::default()
    }

    /// Discards all effects recorded after the checkpoint.
    fn revert_to(&mut self, _checkpoint: HostCheckpoint) {}

    /// Keeps effects recorded after the checkpoint and forgets the marker.
    fn release(&mut self, _checkpoint: HostCheckpoint) {}
}
