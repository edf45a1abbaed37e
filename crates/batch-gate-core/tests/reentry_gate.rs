// crates/batch-gate-core/tests/reentry_gate.rs
// ============================================================================
// Module: Reentry Gate Tests
// Description: Tests for authenticated mid-batch reentry.
// Purpose: Validate commitment matching, single use, rollback, and depth limits.
// Dependencies: batch-gate-core
// ============================================================================
//! ## Overview
//! A step that declares a callback seed may reenter once with the matching
//! bundle. Every other reentry attempt is rejected, and a declared callback
//! that never arrives fails the batch.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use batch_gate_core::Address;
use batch_gate_core::Amount;
use batch_gate_core::BatchEngine;
use batch_gate_core::BatchEngineConfig;
use batch_gate_core::BatchError;
use batch_gate_core::BatchRequest;
use batch_gate_core::CallDescriptor;
use batch_gate_core::CallFailure;
use batch_gate_core::CallReturn;
use batch_gate_core::DEFAULT_HASH_ALGORITHM;
use batch_gate_core::HashDigest;
use batch_gate_core::InMemoryHost;
use batch_gate_core::ReentryCommitment;
use batch_gate_core::callback_seed;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn request(calls: Vec<CallDescriptor>) -> BatchRequest {
    BatchRequest {
        caller: Address::new("alice"),
        value: Amount::ZERO,
        calls,
    }
}

fn seed(calls: &[CallDescriptor]) -> HashDigest {
    callback_seed(DEFAULT_HASH_ALGORITHM, calls).unwrap()
}

fn register_emitter(host: &mut InMemoryHost, target: &str) {
    let name = target.to_string();
    host.register(target, move |_, host, _| {
        host.emit(name.clone());
        Ok(CallReturn::default())
    });
}

/// Registers a target that emits its name and reenters with `nested`.
fn register_reentrant(host: &mut InMemoryHost, target: &str, nested: Vec<CallDescriptor>) {
    let name = target.to_string();
    host.register(target, move |engine, host, call| {
        host.emit(name.clone());
        engine.reenter(host, &call.target, &nested)?;
        Ok(CallReturn::default())
    });
}

fn dispatched(host: &InMemoryHost) -> Vec<(String, usize)> {
    host.history().iter().map(|record| (record.target.to_string(), record.depth)).collect()
}

fn nested_engine_error(err: &BatchError) -> &BatchError {
    match err {
        BatchError::CallFailed {
            failure,
            ..
        } => failure.engine_error().unwrap_or_else(|| panic!("expected engine error, got {failure}")),
        other => panic!("expected call failure, got {other}"),
    }
}

// ============================================================================
// SECTION: Accepted Reentry
// ============================================================================

/// Verifies the nested bundle runs inside the declaring step, before later steps.
#[test]
fn declared_callback_runs_nested_bundle_in_place() {
    let nested = vec![CallDescriptor::new("z")];
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    register_reentrant(&mut host, "x", nested.clone());
    register_emitter(&mut host, "y");
    register_emitter(&mut host, "z");

    let outcome = engine
        .open_batch(
            &mut host,
            &request(vec![
                CallDescriptor::new("x").expecting_callback(seed(&nested)),
                CallDescriptor::new("y"),
            ]),
        )
        .unwrap();

    assert_eq!(host.effects(), ["x", "z", "y"]);
    assert_eq!(
        dispatched(&host),
        [("x".to_string(), 0), ("z".to_string(), 1), ("y".to_string(), 0)]
    );
    assert_eq!(outcome.steps.len(), 2);
    assert!(engine.current_reentry_commitment().is_none());
    assert!(engine.current_initiator().is_none());
}

/// Verifies the pending commitment exposed to the target is derived from its identity and seed.
#[test]
fn pending_commitment_binds_target_and_seed() {
    let nested = vec![CallDescriptor::new("z")];
    let expected = ReentryCommitment::derive(
        DEFAULT_HASH_ALGORITHM,
        &Address::new("x"),
        &seed(&nested),
    )
    .unwrap();
    let observed = Rc::new(RefCell::new(Vec::new()));
    let observed_in_x = Rc::clone(&observed);
    let observed_in_z = Rc::clone(&observed);
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    let nested_in_x = nested.clone();
    host.register("x", move |engine, host, call| {
        observed_in_x.borrow_mut().push(engine.current_reentry_commitment().cloned());
        engine.reenter(host, &call.target, &nested_in_x)?;
        observed_in_x.borrow_mut().push(engine.current_reentry_commitment().cloned());
        Ok(CallReturn::default())
    });
    host.register("z", move |engine, _, _| {
        observed_in_z.borrow_mut().push(engine.current_reentry_commitment().cloned());
        Ok(CallReturn::default())
    });

    engine
        .open_batch(&mut host, &request(vec![CallDescriptor::new("x").expecting_callback(seed(&nested))]))
        .unwrap();

    assert_eq!(*observed.borrow(), vec![Some(expected), None, None]);
}

/// Verifies the initiator stays bound while the nested bundle runs.
#[test]
fn initiator_is_unchanged_inside_nested_bundle() {
    let nested = vec![CallDescriptor::new("z")];
    let observed = Rc::new(RefCell::new(None));
    let observed_in_z = Rc::clone(&observed);
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    register_reentrant(&mut host, "x", nested.clone());
    host.register("z", move |engine, _, _| {
        *observed_in_z.borrow_mut() = engine.current_initiator().cloned();
        Ok(CallReturn::default())
    });

    engine
        .open_batch(&mut host, &request(vec![CallDescriptor::new("x").expecting_callback(seed(&nested))]))
        .unwrap();

    assert_eq!(*observed.borrow(), Some(Address::new("alice")));
}

// ============================================================================
// SECTION: Missing Reentry
// ============================================================================

/// Verifies a declared callback that never arrives fails the batch at that step.
#[test]
fn declared_callback_without_reentry_fails() {
    let nested = vec![CallDescriptor::new("z")];
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    register_emitter(&mut host, "x");
    register_emitter(&mut host, "y");

    let err = engine
        .open_batch(
            &mut host,
            &request(vec![
                CallDescriptor::new("x").expecting_callback(seed(&nested)),
                CallDescriptor::new("y"),
            ]),
        )
        .unwrap_err();

    assert_eq!(
        err,
        BatchError::MissingExpectedReenter {
            index: 0,
            target: Address::new("x")
        }
    );
    assert_eq!(dispatched(&host), [("x".to_string(), 0)]);
    assert!(host.effects().is_empty());
    assert!(engine.current_reentry_commitment().is_none());
}

/// Verifies suppression does not excuse a declared callback lost with a failed frame.
#[test]
fn suppressed_failure_of_declaring_step_is_missing_reentry() {
    let nested = vec![CallDescriptor::new("z")];
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    register_emitter(&mut host, "z");
    let nested_in_x = nested.clone();
    host.register("x", move |engine, host, call| {
        engine.reenter(host, &call.target, &nested_in_x)?;
        Err(CallFailure::revert("late failure"))
    });

    let err = engine
        .open_batch(
            &mut host,
            &request(vec![
                CallDescriptor::new("x").expecting_callback(seed(&nested)).suppressing_failure(),
            ]),
        )
        .unwrap_err();

    assert_eq!(err.kind(), "missing_expected_reenter");
    assert!(host.effects().is_empty());
}

// ============================================================================
// SECTION: Rejected Reentry
// ============================================================================

/// Verifies reentry with no pending commitment is rejected.
#[test]
fn reentry_without_declared_callback_is_rejected() {
    let nested = vec![CallDescriptor::new("z")];
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    register_reentrant(&mut host, "x", nested);
    register_emitter(&mut host, "z");

    let err = engine
        .open_batch(&mut host, &request(vec![CallDescriptor::new("x")]))
        .unwrap_err();

    assert_eq!(nested_engine_error(&err), &BatchError::IncorrectReenterHash);
    assert!(host.effects().is_empty());
}

/// Verifies reentry outside of any batch is rejected.
#[test]
fn reentry_without_session_is_rejected() {
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    register_emitter(&mut host, "z");

    let err = engine
        .reenter(&mut host, &Address::new("x"), &[CallDescriptor::new("z")])
        .unwrap_err();

    assert_eq!(err, BatchError::IncorrectReenterHash);
    assert!(host.history().is_empty());
}

/// Verifies a caller other than the committed target is rejected.
#[test]
fn reentry_from_wrong_caller_is_rejected() {
    let nested = vec![CallDescriptor::new("z")];
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    register_emitter(&mut host, "z");
    let nested_in_x = nested.clone();
    host.register("x", move |engine, host, _| {
        engine.reenter(host, &Address::new("mallory"), &nested_in_x)?;
        Ok(CallReturn::default())
    });

    let err = engine
        .open_batch(&mut host, &request(vec![CallDescriptor::new("x").expecting_callback(seed(&nested))]))
        .unwrap_err();

    assert_eq!(nested_engine_error(&err), &BatchError::IncorrectReenterHash);
    assert_eq!(dispatched(&host), [("x".to_string(), 0)]);
}

/// Verifies a bundle other than the committed one is rejected.
#[test]
fn reentry_with_wrong_bundle_is_rejected() {
    let committed = vec![CallDescriptor::new("z")];
    let presented = vec![CallDescriptor::new("z").with_value(Amount::new(1))];
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    register_reentrant(&mut host, "x", presented);
    register_emitter(&mut host, "z");

    let err = engine
        .open_batch(
            &mut host,
            &request(vec![CallDescriptor::new("x").expecting_callback(seed(&committed))]),
        )
        .unwrap_err();

    assert_eq!(nested_engine_error(&err), &BatchError::IncorrectReenterHash);
    assert_eq!(dispatched(&host), [("x".to_string(), 0)]);
}

/// Verifies a commitment is consumed by the first successful reentry.
#[test]
fn commitment_is_single_use() {
    let nested = vec![CallDescriptor::new("z")];
    let replay = Rc::new(RefCell::new(None));
    let replay_in_x = Rc::clone(&replay);
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    register_emitter(&mut host, "z");
    let nested_in_x = nested.clone();
    host.register("x", move |engine, host, call| {
        engine.reenter(host, &call.target, &nested_in_x)?;
        *replay_in_x.borrow_mut() = engine.reenter(host, &call.target, &nested_in_x).err();
        Ok(CallReturn::default())
    });

    engine
        .open_batch(&mut host, &request(vec![CallDescriptor::new("x").expecting_callback(seed(&nested))]))
        .unwrap();

    assert_eq!(*replay.borrow(), Some(BatchError::IncorrectReenterHash));
    assert_eq!(host.effects(), ["z"]);
}

/// Verifies a failed nested bundle is rolled back and the commitment may be retried.
#[test]
fn failed_nested_bundle_restores_commitment() {
    let nested = vec![CallDescriptor::new("z1"), CallDescriptor::new("z2")];
    let attempts = Rc::new(Cell::new(0_u32));
    let attempts_in_z2 = Rc::clone(&attempts);
    let first_error = Rc::new(RefCell::new(None));
    let first_error_in_x = Rc::clone(&first_error);
    let mut engine = BatchEngine::default();
    let mut host = InMemoryHost::new("engine");
    register_emitter(&mut host, "z1");
    host.register("z2", move |_, host, _| {
        attempts_in_z2.set(attempts_in_z2.get() + 1);
        if attempts_in_z2.get() == 1 {
            return Err(CallFailure::revert("not yet"));
        }
        host.emit("z2");
        Ok(CallReturn::default())
    });
    let nested_in_x = nested.clone();
    host.register("x", move |engine, host, call| {
        host.emit("x");
        if let Err(err) = engine.reenter(host, &call.target, &nested_in_x) {
            *first_error_in_x.borrow_mut() = Some(err);
            engine.reenter(host, &call.target, &nested_in_x)?;
        }
        Ok(CallReturn::default())
    });

    engine
        .open_batch(&mut host, &request(vec![CallDescriptor::new("x").expecting_callback(seed(&nested))]))
        .unwrap();

    assert_eq!(host.effects(), ["x", "z1", "z2"]);
    assert_eq!(attempts.get(), 2);
    assert_eq!(first_error.borrow().as_ref().map(BatchError::kind), Some("call_failed"));
}

// ============================================================================
// SECTION: Depth Limits
// ============================================================================

/// Builds a two-level chain: x reenters with [x2], x2 reenters with [z].
fn chained_host() -> (InMemoryHost, HashDigest) {
    let inner = vec![CallDescriptor::new("z")];
    let middle = vec![CallDescriptor::new("x2").expecting_callback(seed(&inner))];
    let mut host = InMemoryHost::new("engine");
    register_reentrant(&mut host, "x", middle.clone());
    register_reentrant(&mut host, "x2", inner);
    register_emitter(&mut host, "z");
    (host, seed(&middle))
}

/// Verifies chained reentry works within the default depth limit.
#[test]
fn chained_reentry_within_limit_succeeds() {
    let (mut host, middle_seed) = chained_host();
    let mut engine = BatchEngine::default();

    engine
        .open_batch(&mut host, &request(vec![CallDescriptor::new("x").expecting_callback(middle_seed)]))
        .unwrap();

    assert_eq!(host.effects(), ["x", "x2", "z"]);
    assert_eq!(
        dispatched(&host),
        [("x".to_string(), 0), ("x2".to_string(), 1), ("z".to_string(), 2)]
    );
}

/// Verifies reentry beyond the configured depth is rejected.
#[test]
fn chained_reentry_beyond_limit_is_rejected() {
    let (mut host, middle_seed) = chained_host();
    let mut engine = BatchEngine::new(BatchEngineConfig {
        max_reentry_depth: 1,
        ..BatchEngineConfig::default()
    });

    let err = engine
        .open_batch(&mut host, &request(vec![CallDescriptor::new("x").expecting_callback(middle_seed)]))
        .unwrap_err();

    let inner = nested_engine_error(nested_engine_error(&err));
    assert_eq!(
        inner,
        &BatchError::ReentryDepthExceeded {
            depth: 2,
            max: 1
        }
    );
    assert!(host.effects().is_empty());
    assert_eq!(engine.session().depth(), 0);
}
