//! Structured event records emitted on every state transition.
//!
//! The event log is the engine's observability surface: it is sufficient
//! to reconstruct the full disbursement history without replaying
//! internal state. Events serialize to tagged JSON for external
//! consumers.

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, UpdateCategory};

/// One externally observable state transition. `at` is unix seconds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DripEvent {
    /// A disbursement succeeded.
    ReleaseExecuted {
        at: u64,
        amount: u64,
        destination: AccountId,
        total_released: u64,
        releases_executed: u64,
    },
    /// The external transfer failed; timer rolled back, counters advanced.
    ReleaseFailed {
        at: u64,
        amount: u64,
        reason: String,
        consecutive_failures: u32,
        failed_attempts: u64,
    },
    /// Consecutive failures reached the limit; the engine is halted.
    CircuitBreakerTripped { at: u64, consecutive_failures: u32 },
    /// Administrator cleared the breaker (and any halt).
    CircuitBreakerReset { at: u64 },
    /// Source balance after a release covers three periods or fewer.
    LowBalanceWarning {
        at: u64,
        balance: u64,
        periods_remaining: u64,
    },
    /// Balance at or below the emergency threshold; amount reduced to a
    /// fixed fraction of the remaining balance.
    EmergencyReleaseTriggered {
        at: u64,
        balance: u64,
        reduced_amount: u64,
    },
    /// A timelocked address change was proposed.
    UpdateProposed {
        at: u64,
        id: u64,
        category: UpdateCategory,
        new_address: AccountId,
        execute_after: u64,
    },
    /// A timelocked address change was committed.
    UpdateExecuted {
        at: u64,
        id: u64,
        category: UpdateCategory,
        new_address: AccountId,
    },
    CallerAuthorized { at: u64, caller: AccountId },
    CallerRevoked { at: u64, caller: AccountId },
    AuthorityProposed {
        at: u64,
        current: AccountId,
        proposed: AccountId,
    },
    AuthorityTransferred {
        at: u64,
        previous: AccountId,
        new_authority: AccountId,
    },
    Paused { at: u64, reason: String },
    Unpaused { at: u64 },
    MultiplierUpdated { at: u64, old: u64, new: u64 },
    AutomationToggled { at: u64, enabled: bool },
    /// Security event: an automated trigger from an unregistered caller.
    UnauthorizedTriggerAttempt { at: u64, caller: AccountId },
    /// Administrative drain while halted, bypassing the cadence.
    EmergencyDrained {
        at: u64,
        amount: u64,
        destination: AccountId,
    },
}
