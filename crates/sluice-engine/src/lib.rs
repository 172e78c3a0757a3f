//! # sluice-engine
//! The Sluice disbursement state machine: eligibility and amount
//! computation, the release executor, failure tracking with a circuit
//! breaker, timelocked address changes, and caller authorization.
//!
//! [`DripEngine`] is the single owned state instance; [`Sluice`] wraps
//! it in a mutex so every state-mutating operation runs to completion
//! atomically, with reentrant execution rejected rather than queued.

pub mod calculator;
pub mod executor;
pub mod registry;
pub mod state;
pub mod timelock;

pub use executor::{DripEngine, Probe, ReleaseOutcome};
pub use state::BreakerStatus;

use parking_lot::Mutex;

use sluice_core::error::{ReleaseError, SluiceError};
use sluice_core::events::DripEvent;
use sluice_core::ledger::{Clock, Ledger};
use sluice_core::types::{AccountId, TriggerKind, UpdateCategory};

/// Serialized front door to a [`DripEngine`].
///
/// Mutating entry points take the lock with `try_lock`: a caller that
/// re-enters while a mutation is in flight gets
/// [`ReleaseError::ReentrantCall`] instead of deadlocking or observing
/// partial state. Read-only accessors block until the in-flight
/// mutation completes.
pub struct Sluice<L: Ledger, C: Clock> {
    inner: Mutex<DripEngine<L, C>>,
}

impl<L: Ledger, C: Clock> Sluice<L, C> {
    pub fn new(engine: DripEngine<L, C>) -> Self {
        Self {
            inner: Mutex::new(engine),
        }
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut DripEngine<L, C>) -> Result<T, SluiceError>,
    ) -> Result<T, SluiceError> {
        let mut guard = self
            .inner
            .try_lock()
            .ok_or(ReleaseError::ReentrantCall)?;
        f(&mut guard)
    }

    /// Run a read-only closure against the engine.
    pub fn read<T>(&self, f: impl FnOnce(&DripEngine<L, C>) -> T) -> T {
        f(&self.inner.lock())
    }

    pub fn execute(
        &self,
        caller: AccountId,
        trigger: TriggerKind,
    ) -> Result<ReleaseOutcome, SluiceError> {
        self.mutate(|e| e.execute(caller, trigger))
    }

    pub fn probe(&self) -> Result<Probe, SluiceError> {
        self.inner.lock().probe()
    }

    pub fn pause(&self, caller: AccountId, reason: &str) -> Result<(), SluiceError> {
        self.mutate(|e| e.pause(caller, reason))
    }

    pub fn unpause(&self, caller: AccountId) -> Result<(), SluiceError> {
        self.mutate(|e| e.unpause(caller))
    }

    pub fn reset_breaker(&self, caller: AccountId) -> Result<(), SluiceError> {
        self.mutate(|e| e.reset_breaker(caller))
    }

    pub fn set_multiplier(&self, caller: AccountId, multiplier: u64) -> Result<(), SluiceError> {
        self.mutate(|e| e.set_multiplier(caller, multiplier))
    }

    pub fn set_automation_enabled(
        &self,
        caller: AccountId,
        enabled: bool,
    ) -> Result<(), SluiceError> {
        self.mutate(|e| e.set_automation_enabled(caller, enabled))
    }

    pub fn authorize_caller(&self, caller: AccountId, target: AccountId) -> Result<(), SluiceError> {
        self.mutate(|e| e.authorize_caller(caller, target))
    }

    pub fn revoke_caller(&self, caller: AccountId, target: AccountId) -> Result<(), SluiceError> {
        self.mutate(|e| e.revoke_caller(caller, target))
    }

    pub fn authorize_callers(
        &self,
        caller: AccountId,
        targets: &[AccountId],
    ) -> Result<(), SluiceError> {
        self.mutate(|e| e.authorize_callers(caller, targets))
    }

    pub fn revoke_callers(
        &self,
        caller: AccountId,
        targets: &[AccountId],
    ) -> Result<(), SluiceError> {
        self.mutate(|e| e.revoke_callers(caller, targets))
    }

    pub fn propose_update(
        &self,
        caller: AccountId,
        category: UpdateCategory,
        new_address: AccountId,
    ) -> Result<u64, SluiceError> {
        self.mutate(|e| e.propose_update(caller, category, new_address))
    }

    pub fn execute_update(
        &self,
        caller: AccountId,
        category: UpdateCategory,
    ) -> Result<AccountId, SluiceError> {
        self.mutate(|e| e.execute_update(caller, category))
    }

    pub fn propose_authority(
        &self,
        caller: AccountId,
        successor: AccountId,
    ) -> Result<(), SluiceError> {
        self.mutate(|e| e.propose_authority(caller, successor))
    }

    pub fn accept_authority(&self, caller: AccountId) -> Result<(), SluiceError> {
        self.mutate(|e| e.accept_authority(caller))
    }

    pub fn emergency_drain(
        &self,
        caller: AccountId,
        amount: Option<u64>,
    ) -> Result<u64, SluiceError> {
        self.mutate(|e| e.emergency_drain(caller, amount))
    }

    /// Snapshot of the event history.
    pub fn events(&self) -> Vec<DripEvent> {
        self.inner.lock().events().to_vec()
    }
}
