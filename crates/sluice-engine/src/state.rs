//! Release bookkeeping and the circuit breaker.
//!
//! [`ReleaseState`] is the single mutable record of disbursement
//! history, mutated only by the executor. The breaker is a derived view:
//! Armed while `consecutive_failures` is under the limit, Tripped at or
//! above it. Tripped→Armed is administrator-only.

use serde::{Deserialize, Serialize};

/// Circuit breaker position, derived from the consecutive-failure count.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BreakerStatus {
    /// Normal operation.
    Armed,
    /// Consecutive failures reached the limit; all releases halt until
    /// an explicit administrative reset.
    Tripped,
}

/// Counters and timers of completed disbursement history.
///
/// `total_released`, `releases_executed`, and `failed_release_attempts`
/// only ever grow. `consecutive_failures` resets on success or manual
/// reset. `last_release_time` advances on success and is decremented by
/// one period (floored at zero) on failure so a failed attempt does not
/// delay the next retry.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseState {
    pub last_release_time: u64,
    pub total_released: u64,
    pub releases_executed: u64,
    pub failed_release_attempts: u64,
    pub consecutive_failures: u32,
}

impl ReleaseState {
    /// Fresh state at engine creation; the first release becomes
    /// eligible one full period after `created_at`.
    pub fn new(created_at: u64) -> Self {
        Self {
            last_release_time: created_at,
            total_released: 0,
            releases_executed: 0,
            failed_release_attempts: 0,
            consecutive_failures: 0,
        }
    }

    /// Record a successful disbursement of `amount`.
    pub fn record_success(&mut self, amount: u64) {
        self.total_released = self.total_released.saturating_add(amount);
        self.releases_executed += 1;
        self.consecutive_failures = 0;
    }

    /// Record a failed transfer attempt. Returns true when this failure
    /// reaches the limit and trips the breaker.
    pub fn record_failure(&mut self, limit: u32) -> bool {
        self.failed_release_attempts += 1;
        self.consecutive_failures += 1;
        self.consecutive_failures >= limit
    }

    /// Roll the release timer back by exactly one period, floored at
    /// zero, so the next eligibility check is not delayed by the failed
    /// attempt.
    pub fn roll_back_timer(&mut self, period_secs: u64) {
        self.last_release_time = self.last_release_time.saturating_sub(period_secs);
    }

    pub fn breaker(&self, limit: u32) -> BreakerStatus {
        if self.consecutive_failures >= limit {
            BreakerStatus::Tripped
        } else {
            BreakerStatus::Armed
        }
    }

    /// Administrative reset: clears the consecutive-failure run, never
    /// the permanent failure history.
    pub fn reset_breaker(&mut self) {
        self.consecutive_failures = 0;
    }
}
