// crates/batch-gate-core/src/runtime/host.rs
// ============================================================================
// Module: Batch Gate In-Memory Host
// Description: Journaled in-memory call host for tests and examples.
// Purpose: Provide a deterministic host with balances and scripted targets.
// Dependencies: crate::{core, interfaces, runtime::engine}
// ============================================================================

//! ## Overview
//! [`InMemoryHost`] keeps account balances and an effect log behind a journal
//! of checkpoints, so the engine's revert hooks discard exactly the effects of
//! failed frames. Targets are scripted with closures that receive the engine
//! handle, letting them read the accessors or reenter. A dispatch history that
//! is never rolled back records every attempted call in order. It is not
//! intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::core::Address;
use crate::core::Amount;
use crate::interfaces::CallFailure;
use crate::interfaces::CallHost;
use crate::interfaces::CallRequest;
use crate::interfaces::CallReturn;
use crate::interfaces::HostCheckpoint;
use crate::runtime::engine::BatchEngine;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Scripted behavior for one target.
pub type TargetHandler =
    Rc<dyn Fn(&mut BatchEngine, &mut InMemoryHost, &CallRequest) -> Result<CallReturn, CallFailure>>;

/// Journaled host state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LedgerState {
    /// Account balances keyed by address.
    balances: BTreeMap<Address, Amount>,
    /// Effects emitted by targets, in order.
    effects: Vec<String>,
}

/// One attempted dispatch, recorded regardless of outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    /// Target invoked.
    pub target: Address,
    /// Step index within its bundle.
    pub index: usize,
    /// Nesting depth of the bundle.
    pub depth: usize,
}

// ============================================================================
// SECTION: In-Memory Host
// ============================================================================

/// In-memory call host for tests and examples.
pub struct InMemoryHost {
    /// Account that holds value on behalf of the engine.
    engine_account: Address,
    /// Current journaled state.
    state: LedgerState,
    /// Saved states, indexed by checkpoint marker.
    journal: Vec<LedgerState>,
    /// Scripted targets.
    handlers: BTreeMap<Address, TargetHandler>,
    /// Attempted dispatches in order.
    history: Vec<DispatchRecord>,
}

impl InMemoryHost {
    /// Creates a host whose engine holds value under `engine_account`.
    #[must_use]
    pub fn new(engine_account: impl Into<Address>) -> Self {
        Self {
            engine_account: engine_account.into(),
            state: LedgerState::default(),
            journal: Vec::new(),
            handlers: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Returns the engine's account address.
    #[must_use]
    pub const fn engine_account(&self) -> &Address {
        &self.engine_account
    }

    /// Sets an account balance.
    pub fn set_balance(&mut self, account: impl Into<Address>, amount: Amount) {
        self.state.balances.insert(account.into(), amount);
    }

    /// Returns an account balance (zero for unknown accounts).
    #[must_use]
    pub fn balance(&self, account: &Address) -> Amount {
        self.state.balances.get(account).copied().unwrap_or_default()
    }

    /// Registers a scripted target.
    pub fn register<F>(&mut self, target: impl Into<Address>, handler: F)
    where
        F: Fn(&mut BatchEngine, &mut Self, &CallRequest) -> Result<CallReturn, CallFailure>
            + 'static,
    {
        self.handlers.insert(target.into(), Rc::new(handler));
    }

    /// Registers a target that accepts any call and returns no data.
    pub fn register_sink(&mut self, target: impl Into<Address>) {
        self.register(target, |_, _, _| Ok(CallReturn::default()));
    }

    /// Appends an effect to the journaled log.
    pub fn emit(&mut self, effect: impl Into<String>) {
        self.state.effects.push(effect.into());
    }

    /// Returns the journaled effect log.
    #[must_use]
    pub fn effects(&self) -> &[String] {
        &self.state.effects
    }

    /// Returns every attempted dispatch, including ones later reverted.
    #[must_use]
    pub fn history(&self) -> &[DispatchRecord] {
        &self.history
    }

    /// Moves value between accounts.
    ///
    /// # Errors
    ///
    /// Returns [`CallFailure`] when the source balance is insufficient or the
    /// destination would overflow.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CallFailure> {
        if amount.is_zero() || from == to {
            return Ok(());
        }
        let remaining = self.balance(from).checked_sub(amount).ok_or_else(|| {
            CallFailure::revert(format!("insufficient balance in {from} for {amount}"))
        })?;
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| CallFailure::revert(format!("balance overflow in {to}")))?;
        self.state.balances.insert(from.clone(), remaining);
        self.state.balances.insert(to.clone(), credited);
        Ok(())
    }
}

impl CallHost for InMemoryHost {
    fn invoke(
        &mut self,
        engine: &mut BatchEngine,
        call: &CallRequest,
    ) -> Result<CallReturn, CallFailure> {
        self.history.push(DispatchRecord {
            target: call.target.clone(),
            index: call.index,
            depth: call.depth,
        });
        let handler = self
            .handlers
            .get(&call.target)
            .cloned()
            .ok_or_else(|| CallFailure::revert(format!("no code at {}", call.target)))?;
        let engine_account = self.engine_account.clone();
        self.transfer(&engine_account, &call.target, call.value)?;
        handler(engine, self, call)
    }

    fn accept_value(&mut self, from: &Address, amount: Amount) -> Result<(), CallFailure> {
        let engine_account = self.engine_account.clone();
        self.transfer(from, &engine_account, amount)
    }

    fn checkpoint(&mut self) -> HostCheckpoint {
        self.journal.push(self.state.clone());
        HostCheckpoint::new(u64::try_from(self.journal.len() - 1).unwrap_or(u64::MAX))
    }

    fn revert_to(&mut self, checkpoint: HostCheckpoint) {
        let Ok(marker) = usize::try_from(checkpoint.get()) else {
            return;
        };
        if marker < self.journal.len() {
            self.journal.truncate(marker + 1);
            if let Some(saved) = self.journal.pop() {
                self.state = saved;
            }
        }
    }

    fn release(&mut self, checkpoint: HostCheckpoint) {
        let Ok(marker) = usize::try_from(checkpoint.get()) else {
            return;
        };
        self.journal.truncate(marker);
    }
}
