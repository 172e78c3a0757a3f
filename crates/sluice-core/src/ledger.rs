//! Ledger and clock trait seams, plus in-memory implementations.
//!
//! The [`Ledger`] trait is the engine's only collaborator that moves
//! funds: an allowance-based transfer primitive with balance queries.
//! The [`MemoryLedger`] is suitable for tests and simulation; production
//! backends implement the trait out of tree.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::error::{LedgerError, TransferError};
use crate::types::AccountId;

/// External asset ledger with allowance/balance semantics.
///
/// `transfer_from` is the engine's only suspension point: any
/// non-success outcome is routed through the failure tracker. The
/// transfer must be atomic on the ledger side — either the full amount
/// moves or nothing does.
pub trait Ledger: Send + Sync {
    /// Current balance of an account.
    fn balance_of(&self, account: &AccountId) -> Result<u64, LedgerError>;

    /// Amount `spender` is pre-authorized to move out of `owner`.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Result<u64, LedgerError>;

    /// Move `amount` from `owner` to `to`, debiting `spender`'s allowance.
    fn transfer_from(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), TransferError>;
}

/// Time source in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Manually advanced clock for tests and simulation.
///
/// Clones share the same underlying time, so a test can hold one handle
/// while the engine owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct LedgerInner {
    balances: HashMap<AccountId, u64>,
    allowances: HashMap<(AccountId, AccountId), u64>,
    /// Transfers that remain to be failed by injection.
    fail_transfers: u32,
    fail_reason: Option<String>,
    /// Completed transfers as `(owner, to, amount)`.
    transfers: Vec<(AccountId, AccountId, u64)>,
}

/// In-memory ledger for tests and simulation.
///
/// Clones share state, so a test can inspect balances while the engine
/// owns its own handle. Supports deterministic failure injection.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    inner: Arc<Mutex<LedgerInner>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, account: AccountId, amount: u64) {
        self.inner.lock().balances.insert(account, amount);
    }

    pub fn balance(&self, account: &AccountId) -> u64 {
        *self.inner.lock().balances.get(account).unwrap_or(&0)
    }

    pub fn approve(&self, owner: AccountId, spender: AccountId, amount: u64) {
        self.inner.lock().allowances.insert((owner, spender), amount);
    }

    /// Fail the next `count` transfers with a generic unknown failure.
    pub fn fail_next_transfers(&self, count: u32) {
        let mut inner = self.inner.lock();
        inner.fail_transfers = count;
        inner.fail_reason = None;
    }

    /// Fail the next `count` transfers with an explicit rejection reason.
    pub fn fail_next_transfers_with(&self, count: u32, reason: &str) {
        let mut inner = self.inner.lock();
        inner.fail_transfers = count;
        inner.fail_reason = Some(reason.to_string());
    }

    /// Completed transfers as `(owner, to, amount)`, in order.
    pub fn transfers(&self) -> Vec<(AccountId, AccountId, u64)> {
        self.inner.lock().transfers.clone()
    }
}

impl Ledger for MemoryLedger {
    fn balance_of(&self, account: &AccountId) -> Result<u64, LedgerError> {
        Ok(self.balance(account))
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Result<u64, LedgerError> {
        Ok(*self
            .inner
            .lock()
            .allowances
            .get(&(*owner, *spender))
            .unwrap_or(&0))
    }

    fn transfer_from(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), TransferError> {
        let mut inner = self.inner.lock();

        if inner.fail_transfers > 0 {
            inner.fail_transfers -= 1;
            return Err(match inner.fail_reason.clone() {
                Some(reason) => TransferError::Rejected(reason),
                None => TransferError::Unknown,
            });
        }

        let allowed = *inner.allowances.get(&(*owner, *spender)).unwrap_or(&0);
        if allowed < amount {
            return Err(TransferError::Rejected(format!(
                "insufficient allowance: {allowed} < {amount}"
            )));
        }
        let have = *inner.balances.get(owner).unwrap_or(&0);
        if have < amount {
            return Err(TransferError::Rejected(format!(
                "insufficient balance: {have} < {amount}"
            )));
        }

        inner.allowances.insert((*owner, *spender), allowed - amount);
        inner.balances.insert(*owner, have - amount);
        let dest = inner.balances.entry(*to).or_insert(0);
        *dest = dest.saturating_add(amount);
        inner.transfers.push((*owner, *to, amount));
        Ok(())
    }
}
