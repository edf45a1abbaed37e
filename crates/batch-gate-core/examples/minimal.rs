// crates/batch-gate-core/examples/minimal.rs
// ============================================================================
// Module: Batch Gate Minimal Example
// Description: Minimal batch with one authenticated callback.
// Purpose: Demonstrate open_batch, reenter, and the session accessors.
// Dependencies: batch-gate-core
// ============================================================================

//! ## Overview
//! Runs a two-step batch against the in-memory host. The first target lends
//! value to the engine and calls back with a pre-committed bundle that spends
//! it; the second step repays the lender. This example is backend-agnostic
//! and suitable for quick verification.

use std::sync::Arc;

use batch_gate_core::Address;
use batch_gate_core::Amount;
use batch_gate_core::BatchEngine;
use batch_gate_core::BatchEngineConfig;
use batch_gate_core::BatchRequest;
use batch_gate_core::CallDescriptor;
use batch_gate_core::CallFailure;
use batch_gate_core::CallReturn;
use batch_gate_core::InMemoryAuditSink;
use batch_gate_core::InMemoryHost;
use batch_gate_core::callback_seed;

/// Error type for example preconditions.
#[derive(Debug)]
struct ExampleError(&'static str);

impl std::fmt::Display for ExampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ExampleError {}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BatchEngineConfig::default();
    let audit = Arc::new(InMemoryAuditSink::new());
    let mut engine = BatchEngine::with_audit_sink(config, audit.clone());
    let mut host = InMemoryHost::new("engine");
    host.set_balance("alice", Amount::new(5));
    host.set_balance("lender", Amount::new(100));

    let spend = vec![CallDescriptor::new("market").with_value(Amount::new(100))];
    let spend_seed = callback_seed(config.hash_algorithm, &spend)?;

    host.register("lender", move |engine, host, call| {
        let Some(borrower) = engine.current_initiator().cloned() else {
            return Err(CallFailure::revert("no batch in progress"));
        };
        host.emit(format!("loan to {borrower}"));
        let engine_account = host.engine_account().clone();
        host.transfer(&call.target, &engine_account, Amount::new(100))?;
        engine.reenter(host, &call.target, &spend)?;
        Ok(CallReturn::default())
    });
    host.register("market", |_, host, call| {
        host.emit(format!("market received {}", call.value));
        let engine_account = host.engine_account().clone();
        host.transfer(&call.target, &engine_account, Amount::new(105))
            .map_err(|_| CallFailure::revert("market cannot pay out"))?;
        Ok(CallReturn::new(b"filled".as_slice()))
    });
    host.set_balance("market", Amount::new(10));
    host.register_sink("lender-repay");

    let request = BatchRequest {
        caller: Address::new("alice"),
        value: Amount::new(5),
        calls: vec![
            CallDescriptor::new("lender").expecting_callback(spend_seed),
            CallDescriptor::new("lender-repay").with_value(Amount::new(110)),
        ],
    };
    let outcome = engine.open_batch(&mut host, &request)?;

    if outcome.steps.len() != 2 || outcome.suppressed_count() != 0 {
        return Err(Box::new(ExampleError("unexpected batch outcome")));
    }
    if host.balance(&Address::new("lender-repay")) != Amount::new(110) {
        return Err(Box::new(ExampleError("repayment did not arrive")));
    }
    if engine.current_initiator().is_some() || engine.current_reentry_commitment().is_some() {
        return Err(Box::new(ExampleError("session was not reset")));
    }
    let _events = audit.events();
    Ok(())
}
