// crates/batch-gate-core/src/core/call.rs
// ============================================================================
// Module: Batch Gate Call Model
// Description: Call descriptors, batch requests, and execution outcomes.
// Purpose: Define the caller-supplied wire format and the engine's results.
// Dependencies: base64, serde
// ============================================================================

//! ## Overview
//! A batch is an ordered, non-empty sequence of [`CallDescriptor`] values. Each
//! descriptor names an opaque target, a value amount, opaque payload bytes, an
//! optional callback seed, and whether its failure may be suppressed.
//! Descriptors are immutable once submitted; the canonical JSON of a sequence
//! is what a callback seed commits to.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;

use crate::core::hashing::HashDigest;
use crate::core::identifiers::Address;
use crate::core::identifiers::Amount;
use crate::interfaces::CallFailure;

// ============================================================================
// SECTION: Payload
// ============================================================================

/// Opaque call payload bytes, serialized as standard base64.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Creates a payload from raw bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the payload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD
            .decode(raw.as_bytes())
            .map(Self)
            .map_err(|err| D::Error::custom(format!("invalid base64 payload: {err}")))
    }
}

// ============================================================================
// SECTION: Call Descriptor
// ============================================================================

/// One step of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDescriptor {
    /// Target invoked by this step.
    pub target: Address,
    /// Value transferred to the target with the call.
    #[serde(default)]
    pub value: Amount,
    /// Opaque payload passed to the target.
    #[serde(default)]
    pub payload: Payload,
    /// Seed of the callback this step expects the target to make.
    #[serde(default)]
    pub expected_callback: Option<HashDigest>,
    /// When true, a failure of this step is recorded and execution continues.
    #[serde(default)]
    pub suppress_failure: bool,
}

impl CallDescriptor {
    /// Creates a plain descriptor with no value, payload, or callback.
    #[must_use]
    pub fn new(target: impl Into<Address>) -> Self {
        Self {
            target: target.into(),
            value: Amount::ZERO,
            payload: Payload::default(),
            expected_callback: None,
            suppress_failure: false,
        }
    }

    /// Sets the value transferred with the call.
    #[must_use]
    pub const fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }

    /// Sets the opaque payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Declares the callback seed the target must reenter with.
    #[must_use]
    pub fn expecting_callback(mut self, seed: HashDigest) -> Self {
        self.expected_callback = Some(seed);
        self
    }

    /// Marks the step so its failure does not abort the batch.
    #[must_use]
    pub const fn suppressing_failure(mut self) -> Self {
        self.suppress_failure = true;
        self
    }
}

// ============================================================================
// SECTION: Batch Request
// ============================================================================

/// Outer batch submission from an external caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Identity of the external caller; becomes the session initiator.
    pub caller: Address,
    /// Aggregate value supplied with the invocation.
    #[serde(default)]
    pub value: Amount,
    /// Ordered calls to execute.
    pub calls: Vec<CallDescriptor>,
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of one executed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Position of the step within its bundle.
    pub index: usize,
    /// Target the step invoked.
    pub target: Address,
    /// Return data when the call succeeded.
    pub return_data: Option<Vec<u8>>,
    /// Failure recorded when the call failed and was suppressed.
    pub suppressed: Option<CallFailure>,
}

impl StepOutcome {
    /// Returns true when the call succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.suppressed.is_none()
    }
}

/// Result of a fully executed bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Per-step outcomes in execution order.
    pub steps: Vec<StepOutcome>,
}

impl BatchOutcome {
    /// Returns the number of steps whose failure was suppressed.
    #[must_use]
    pub fn suppressed_count(&self) -> usize {
        self.steps.iter().filter(|step| !step.succeeded()).count()
    }
}
