// crates/batch-gate-core/src/runtime/engine.rs
// ============================================================================
// Module: Batch Gate Engine
// Description: Session guard, reentry gate, and the shared batch executor.
// Purpose: Execute call bundles with exactly one authenticated form of reentry.
// Dependencies: crate::{core, interfaces, runtime::audit}, thiserror
// ============================================================================

//! ## Overview
//! [`BatchEngine`] is the single execution path for call bundles. The outer
//! entry point ([`BatchEngine::open_batch`]) opens a session and refuses to run
//! while one is already open. The only way back in mid-batch is
//! [`BatchEngine::reenter`], which must present the caller and bundle that the
//! currently dispatched step committed to. Both paths funnel through the same
//! executor loop.
//!
//! Security posture: a failed invocation leaves no effects behind. The engine
//! reverts host checkpoints and restores session fields on every failure path,
//! and the outer session is reset by a scoped guard regardless of outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ops::Deref;
use std::sync::Arc;

use thiserror::Error;

use crate::core::Address;
use crate::core::BatchOutcome;
use crate::core::BatchRequest;
use crate::core::CallDescriptor;
use crate::core::ReentryCommitment;
use crate::core::Session;
use crate::core::StepOutcome;
use crate::core::callback_seed;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashError;
use crate::interfaces::CallFailure;
use crate::interfaces::CallHost;
use crate::interfaces::CallRequest;
use crate::runtime::audit::BatchAuditEvent;
use crate::runtime::audit::BatchAuditEventParams;
use crate::runtime::audit::BatchAuditSink;
use crate::runtime::audit::EVENT_BATCH_CLOSED;
use crate::runtime::audit::EVENT_BATCH_OPENED;
use crate::runtime::audit::EVENT_CALL_COMPLETED;
use crate::runtime::audit::EVENT_REENTRY_ACCEPTED;
use crate::runtime::audit::EVENT_REENTRY_REJECTED;
use crate::runtime::audit::NoopAuditSink;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default maximum number of calls accepted in one bundle.
pub const DEFAULT_MAX_CALLS_PER_BUNDLE: usize = 256;
/// Default maximum payload size for a single call (bytes).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;
/// Default maximum reentry nesting depth.
pub const DEFAULT_MAX_REENTRY_DEPTH: usize = 8;

// ============================================================================
// SECTION: Engine Configuration
// ============================================================================

/// Configuration for the batch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchEngineConfig {
    /// Hash algorithm used for seeds and commitments.
    pub hash_algorithm: HashAlgorithm,
    /// Maximum number of calls in one bundle.
    pub max_calls_per_bundle: usize,
    /// Maximum payload size for one call in bytes.
    pub max_payload_bytes: usize,
    /// Maximum nesting depth reachable through reentry.
    pub max_reentry_depth: usize,
}

impl Default for BatchEngineConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
            max_calls_per_bundle: DEFAULT_MAX_CALLS_PER_BUNDLE,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            max_reentry_depth: DEFAULT_MAX_REENTRY_DEPTH,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Batch engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// The outer entry point was called while a session is open.
    #[error("batch session already initiated")]
    AlreadyInitiated,
    /// The bundle contains no calls.
    #[error("bundle contains no calls")]
    EmptyBundle,
    /// The bundle exceeds the configured call limit.
    #[error("bundle has {count} calls (max {max})")]
    BundleTooLarge {
        /// Calls submitted.
        count: usize,
        /// Configured limit.
        max: usize,
    },
    /// A call payload exceeds the configured size limit.
    #[error("call {index} payload is {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Offending step index.
        index: usize,
        /// Payload size in bytes.
        size: usize,
        /// Configured limit.
        max: usize,
    },
    /// The reentering caller or bundle does not match the pending commitment.
    #[error("reentry does not match the pending commitment")]
    IncorrectReenterHash,
    /// A step declared a callback that never arrived.
    #[error("call {index} to {target} did not reenter as declared")]
    MissingExpectedReenter {
        /// Step index that declared the callback.
        index: usize,
        /// Target that was expected to call back.
        target: Address,
    },
    /// Reentry would exceed the configured nesting depth.
    #[error("reentry depth {depth} exceeds max {max}")]
    ReentryDepthExceeded {
        /// Depth the reentry would reach.
        depth: usize,
        /// Configured limit.
        max: usize,
    },
    /// A call target failed and the step did not suppress it.
    #[error("call {index} to {target} failed: {failure}")]
    CallFailed {
        /// Failing step index.
        index: usize,
        /// Failing target.
        target: Address,
        /// Target failure, surfaced verbatim.
        failure: CallFailure,
    },
    /// The host refused the aggregate value supplied with the batch.
    #[error("value transfer rejected: {0}")]
    ValueTransferFailed(CallFailure),
    /// Commitment hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl BatchError {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyInitiated => "already_initiated",
            Self::EmptyBundle => "empty_bundle",
            Self::BundleTooLarge {
                ..
            } => "bundle_too_large",
            Self::PayloadTooLarge {
                ..
            } => "payload_too_large",
            Self::IncorrectReenterHash => "incorrect_reenter_hash",
            Self::MissingExpectedReenter {
                ..
            } => "missing_expected_reenter",
            Self::ReentryDepthExceeded {
                ..
            } => "reentry_depth_exceeded",
            Self::CallFailed {
                ..
            } => "call_failed",
            Self::ValueTransferFailed(_) => "value_transfer_failed",
            Self::Hash(_) => "hash",
        }
    }
}

// ============================================================================
// SECTION: Batch Engine
// ============================================================================

/// Call-batch engine with a single authenticated reentry path.
pub struct BatchEngine {
    /// Engine configuration.
    config: BatchEngineConfig,
    /// Ephemeral session for the executing outer batch.
    session: Session,
    /// Audit sink for session and call events.
    audit: Arc<dyn BatchAuditSink>,
}

impl Default for BatchEngine {
    fn default() -> Self {
        Self::new(BatchEngineConfig::default())
    }
}

impl BatchEngine {
    /// Creates an engine that discards audit events.
    #[must_use]
    pub fn new(config: BatchEngineConfig) -> Self {
        Self::with_audit_sink(config, Arc::new(NoopAuditSink))
    }

    /// Creates an engine that records audit events to the given sink.
    #[must_use]
    pub fn with_audit_sink(config: BatchEngineConfig, audit: Arc<dyn BatchAuditSink>) -> Self {
        Self {
            config,
            session: Session::default(),
            audit,
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &BatchEngineConfig {
        &self.config
    }

    /// Returns a read-only view of the current session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the initiator of the executing batch, if any.
    #[must_use]
    pub const fn current_initiator(&self) -> Option<&Address> {
        self.session.initiator()
    }

    /// Returns the commitment the next reentry must match, if any.
    #[must_use]
    pub const fn current_reentry_commitment(&self) -> Option<&ReentryCommitment> {
        self.session.pending_commitment()
    }

    /// Runs an outer batch on behalf of an external caller.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::AlreadyInitiated`] when a session is already
    /// open, a bundle validation error, or any error raised by the executor.
    /// Host effects are reverted on every error path.
    pub fn open_batch(
        &mut self,
        host: &mut dyn CallHost,
        request: &BatchRequest,
    ) -> Result<BatchOutcome, BatchError> {
        if self.session.is_open() {
            self.record(EVENT_BATCH_OPENED, None, Some(&request.caller), Err("already_initiated"));
            return Err(BatchError::AlreadyInitiated);
        }
        self.validate_bundle(&request.calls)?;

        let checkpoint = host.checkpoint();
        let result = {
            let mut scope = SessionScope::open(self, request.caller.clone());
            scope.record(EVENT_BATCH_OPENED, None, Some(&request.caller), Ok("ok"));
            scope.run_outer(host, request)
        };
        match &result {
            Ok(_) => {
                host.release(checkpoint);
                self.record(EVENT_BATCH_CLOSED, None, Some(&request.caller), Ok("ok"));
            }
            Err(err) => {
                host.revert_to(checkpoint);
                self.record(EVENT_BATCH_CLOSED, None, Some(&request.caller), Err(err.kind()));
            }
        }
        result
    }

    /// Runs a nested bundle on behalf of the target the current step committed to.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::IncorrectReenterHash`] when the caller and bundle
    /// do not reproduce the pending commitment (including when none is
    /// pending), a depth or bundle validation error, or any error raised by
    /// the executor. Session changes are rolled back when the nested bundle
    /// fails, and the host is reverted to its state at gate entry.
    pub fn reenter(
        &mut self,
        host: &mut dyn CallHost,
        caller: &Address,
        calls: &[CallDescriptor],
    ) -> Result<BatchOutcome, BatchError> {
        let seed = callback_seed(self.config.hash_algorithm, calls)?;
        let presented = ReentryCommitment::derive(self.config.hash_algorithm, caller, &seed)?;
        if self.session.pending_commitment() != Some(&presented) {
            self.record(EVENT_REENTRY_REJECTED, None, Some(caller), Err("incorrect_reenter_hash"));
            return Err(BatchError::IncorrectReenterHash);
        }
        let depth = self.session.depth() + 1;
        if depth > self.config.max_reentry_depth {
            self.record(EVENT_REENTRY_REJECTED, None, Some(caller), Err("reentry_depth_exceeded"));
            return Err(BatchError::ReentryDepthExceeded {
                depth,
                max: self.config.max_reentry_depth,
            });
        }
        if let Err(err) = self.validate_bundle(calls) {
            self.record(EVENT_REENTRY_REJECTED, None, Some(caller), Err(err.kind()));
            return Err(err);
        }

        let saved = self.session.clone();
        let checkpoint = host.checkpoint();
        self.session.set_depth(depth);
        self.record(EVENT_REENTRY_ACCEPTED, None, Some(caller), Ok("ok"));
        let result = self.execute(host, calls);
        match &result {
            Ok(_) => {
                host.release(checkpoint);
                self.session.set_depth(saved.depth());
            }
            Err(_) => {
                host.revert_to(checkpoint);
                self.session = saved;
            }
        }
        result
    }

    /// Checks bundle shape and size limits without touching state.
    fn validate_bundle(&self, calls: &[CallDescriptor]) -> Result<(), BatchError> {
        if calls.is_empty() {
            return Err(BatchError::EmptyBundle);
        }
        if calls.len() > self.config.max_calls_per_bundle {
            return Err(BatchError::BundleTooLarge {
                count: calls.len(),
                max: self.config.max_calls_per_bundle,
            });
        }
        for (index, call) in calls.iter().enumerate() {
            if call.payload.len() > self.config.max_payload_bytes {
                return Err(BatchError::PayloadTooLarge {
                    index,
                    size: call.payload.len(),
                    max: self.config.max_payload_bytes,
                });
            }
        }
        Ok(())
    }

    /// Executes a bundle at the current session depth.
    fn execute(
        &mut self,
        host: &mut dyn CallHost,
        calls: &[CallDescriptor],
    ) -> Result<BatchOutcome, BatchError> {
        let depth = self.session.depth();
        let mut outcome = BatchOutcome {
            steps: Vec::with_capacity(calls.len()),
        };
        for (index, call) in calls.iter().enumerate() {
            let expected = match &call.expected_callback {
                Some(seed) => Some(ReentryCommitment::derive(
                    self.config.hash_algorithm,
                    &call.target,
                    seed,
                )?),
                None => None,
            };
            let declared = expected.is_some();
            self.session.set_pending(expected.clone());

            let request = CallRequest {
                index,
                depth,
                target: call.target.clone(),
                value: call.value,
                payload: call.payload.clone(),
            };
            let checkpoint = host.checkpoint();
            match host.invoke(self, &request) {
                Ok(returned) => {
                    host.release(checkpoint);
                    self.record(EVENT_CALL_COMPLETED, Some(index), Some(&call.target), Ok("ok"));
                    outcome.steps.push(StepOutcome {
                        index,
                        target: call.target.clone(),
                        return_data: Some(returned.data),
                        suppressed: None,
                    });
                }
                Err(failure) => {
                    // The failed frame is discarded, including any reentry it consumed.
                    host.revert_to(checkpoint);
                    self.session.set_pending(expected);
                    if !call.suppress_failure {
                        self.record(
                            EVENT_CALL_COMPLETED,
                            Some(index),
                            Some(&call.target),
                            Err("call_failed"),
                        );
                        return Err(BatchError::CallFailed {
                            index,
                            target: call.target.clone(),
                            failure,
                        });
                    }
                    self.record(
                        EVENT_CALL_COMPLETED,
                        Some(index),
                        Some(&call.target),
                        Ok("suppressed"),
                    );
                    outcome.steps.push(StepOutcome {
                        index,
                        target: call.target.clone(),
                        return_data: None,
                        suppressed: Some(failure),
                    });
                }
            }

            if declared && self.session.pending_commitment().is_some() {
                return Err(BatchError::MissingExpectedReenter {
                    index,
                    target: call.target.clone(),
                });
            }
        }
        self.session.set_pending(None);
        Ok(outcome)
    }

    /// Emits an audit event. `Ok` carries the outcome label, `Err` the error kind.
    fn record(
        &self,
        event: &'static str,
        index: Option<usize>,
        target: Option<&Address>,
        result: Result<&'static str, &'static str>,
    ) {
        let (outcome, error_kind) = match result {
            Ok(label) => (label, None),
            Err(kind) if event == EVENT_REENTRY_REJECTED => ("rejected", Some(kind)),
            Err(kind) => ("failed", Some(kind)),
        };
        self.audit.record(&BatchAuditEvent::new(BatchAuditEventParams {
            event,
            initiator: self.session.initiator(),
            depth: self.session.depth(),
            index,
            target,
            outcome,
            error_kind,
        }));
    }
}

// ============================================================================
// SECTION: Session Scope
// ============================================================================

/// Scoped outer session; resets the session on every exit path.
struct SessionScope<'a> {
    /// Engine whose session is held open.
    engine: &'a mut BatchEngine,
}

impl<'a> SessionScope<'a> {
    /// Binds the initiator and returns the guard.
    fn open(engine: &'a mut BatchEngine, initiator: Address) -> Self {
        engine.session.open(initiator);
        Self {
            engine,
        }
    }

    /// Accepts the aggregate value and executes the outer bundle.
    fn run_outer(
        &mut self,
        host: &mut dyn CallHost,
        request: &BatchRequest,
    ) -> Result<BatchOutcome, BatchError> {
        host.accept_value(&request.caller, request.value)
            .map_err(BatchError::ValueTransferFailed)?;
        self.engine.execute(host, &request.calls)
    }
}

impl Deref for SessionScope<'_> {
    type Target = BatchEngine;

    fn deref(&self) -> &Self::Target {
        self.engine
    }
}

impl Drop for SessionScope<'_> {
    fn drop(&mut self) {
        self.engine.session.close();
    }
}
