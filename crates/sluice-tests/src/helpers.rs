//! Shared fixtures: an engine over the in-memory ledger with a manual
//! clock, scaled-down parameters, and well-known account identities.

use sluice_core::constants::EngineParams;
use sluice_core::ledger::{ManualClock, MemoryLedger};
use sluice_core::types::AccountId;
use sluice_engine::{DripEngine, Sluice};

pub const AUTHORITY: AccountId = AccountId([1u8; 32]);
pub const SOURCE: AccountId = AccountId([2u8; 32]);
pub const DEST: AccountId = AccountId([3u8; 32]);
pub const BOT: AccountId = AccountId([4u8; 32]);
pub const ENGINE_ID: AccountId = AccountId([9u8; 32]);

pub fn acct(n: u8) -> AccountId {
    AccountId::from_bytes([n; 32])
}

/// Scaled-down economy: 1,000,000 units baseline, 100-second periods,
/// breaker at 3 consecutive failures, 200-second timelock.
pub fn test_params() -> EngineParams {
    EngineParams {
        baseline_release: 1_000_000,
        period_secs: 100,
        failure_limit: 3,
        timelock_delay_secs: 200,
    }
}

pub struct TestEnv {
    pub sluice: Sluice<MemoryLedger, ManualClock>,
    pub ledger: MemoryLedger,
    pub clock: ManualClock,
    pub params: EngineParams,
}

impl TestEnv {
    /// Engine over a source funded with `balance` and an unlimited
    /// allowance, created at t=0.
    pub fn with_balance(balance: u64) -> Self {
        let params = test_params();
        let ledger = MemoryLedger::new();
        ledger.set_balance(SOURCE, balance);
        ledger.approve(SOURCE, ENGINE_ID, u64::MAX);
        let clock = ManualClock::new(0);
        let engine = DripEngine::new(
            ledger.clone(),
            clock.clone(),
            params,
            ENGINE_ID,
            SOURCE,
            DEST,
            AUTHORITY,
        )
        .expect("engine construction");
        Self {
            sluice: Sluice::new(engine),
            ledger,
            clock,
            params,
        }
    }

    /// Advance the clock by exactly one release period.
    pub fn advance_period(&self) {
        self.clock.advance(self.params.period_secs);
    }
}
