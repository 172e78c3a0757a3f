//! Engine constants. All monetary values in units (1 token = 10^8 units).

use serde::{Deserialize, Serialize};

pub const UNIT: u64 = 100_000_000;

/// Length of one release period in seconds (7 days).
pub const PERIOD_SECS: u64 = 7 * 86_400;

/// Baseline amount released per period, in units.
pub const BASELINE_RELEASE: u64 = 1_000 * UNIT;

/// Denominator of the release multiplier: 100 = 1.0× baseline.
pub const MULTIPLIER_BASE: u64 = 100;

/// Upper bound on the release multiplier (5× baseline).
pub const MAX_MULTIPLIER: u64 = 500;

/// Periods' worth of baseline that must always remain in the source.
pub const MIN_RETAINED_PERIODS: u64 = 3;

/// Absolute per-period release cap, in periods' worth of baseline.
pub const ABSOLUTE_CAP_PERIODS: u64 = 10;

/// Source balance at or below this many periods' worth of baseline
/// switches the executor to the emergency release path.
pub const EMERGENCY_THRESHOLD_PERIODS: u64 = 50;

/// Remaining balance at or below this many periods' worth of baseline
/// emits a low-balance warning after a successful release.
pub const LOW_BALANCE_PERIODS: u64 = 3;

/// Fraction of the current balance released in emergency mode, in
/// basis points (500 = 5%).
pub const EMERGENCY_RELEASE_BPS: u64 = 500;

pub const BPS_PRECISION: u64 = 10_000;

/// Consecutive transfer failures that trip the circuit breaker.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Mandatory delay between proposing and executing a sensitive
/// address change (48 hours).
pub const TIMELOCK_DELAY_SECS: u64 = 2 * 86_400;

/// Fixed economic parameters of a single engine instance.
///
/// These are set once at construction and never change for the life of
/// the engine — the only runtime-mutable knob is the release multiplier,
/// which is bounded by [`MAX_MULTIPLIER`]. Tests construct scaled-down
/// parameters; production uses [`EngineParams::default`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineParams {
    /// Baseline amount released per period, in units.
    pub baseline_release: u64,
    /// Length of one release period in seconds.
    pub period_secs: u64,
    /// Consecutive failures that trip the circuit breaker.
    pub failure_limit: u32,
    /// Delay between proposing and executing an address change.
    pub timelock_delay_secs: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            baseline_release: BASELINE_RELEASE,
            period_secs: PERIOD_SECS,
            failure_limit: MAX_CONSECUTIVE_FAILURES,
            timelock_delay_secs: TIMELOCK_DELAY_SECS,
        }
    }
}

impl EngineParams {
    /// Balance floor the engine never drains below under normal
    /// computation (3 periods' worth of baseline).
    pub fn min_retained(&self) -> u64 {
        self.baseline_release.saturating_mul(MIN_RETAINED_PERIODS)
    }

    /// Hard per-period release cap regardless of multiplier (10 periods'
    /// worth of baseline).
    pub fn absolute_cap(&self) -> u64 {
        self.baseline_release.saturating_mul(ABSOLUTE_CAP_PERIODS)
    }

    /// Balance at or below which the emergency release path engages.
    pub fn emergency_threshold(&self) -> u64 {
        self.baseline_release.saturating_mul(EMERGENCY_THRESHOLD_PERIODS)
    }

    /// Remaining balance at or below which a low-balance warning is
    /// emitted after a successful release.
    pub fn low_balance_threshold(&self) -> u64 {
        self.baseline_release.saturating_mul(LOW_BALANCE_PERIODS)
    }
}
