//! Eligibility and amount computation.
//!
//! Pure functions of balance, configuration, and elapsed time; no side
//! effects, callable at any time. All arithmetic is integer-only with
//! u128 intermediates where a product could overflow.

use sluice_core::constants::{BPS_PRECISION, EMERGENCY_RELEASE_BPS, EngineParams, MULTIPLIER_BASE};

/// Per-period release amount for the current balance.
///
/// `baseline × multiplier / 100`, clamped to the absolute cap, then
/// limited to what the balance can give up without dropping below the
/// retained floor. Returns 0 when the balance is at or below the floor,
/// so the engine never proposes draining below it under normal
/// computation.
pub fn compute_amount(params: &EngineParams, multiplier: u64, balance: u64) -> u64 {
    let base = (params.baseline_release as u128)
        .checked_mul(multiplier as u128)
        .map(|v| v / MULTIPLIER_BASE as u128)
        .unwrap_or(u128::MAX);
    let base = base.min(params.absolute_cap() as u128) as u64;

    let floor = params.min_retained();
    if balance <= floor {
        return 0;
    }
    base.min(balance - floor)
}

/// Earliest timestamp at which the next release can execute.
pub fn next_eligible_at(params: &EngineParams, last_release_time: u64) -> u64 {
    last_release_time.saturating_add(params.period_secs)
}

/// Whether a release can execute now: a full period has elapsed, the
/// computed amount is positive, and the allowance covers it.
pub fn is_eligible(
    params: &EngineParams,
    last_release_time: u64,
    now: u64,
    amount: u64,
    allowance: u64,
) -> bool {
    now >= next_eligible_at(params, last_release_time) && amount > 0 && allowance >= amount
}

/// Conservative release amount while the source is near exhaustion:
/// a fixed fraction of the current balance (5%), preferring partial
/// operations continuity over a hard stop.
pub fn emergency_amount(balance: u64) -> u64 {
    ((balance as u128 * EMERGENCY_RELEASE_BPS as u128) / BPS_PRECISION as u128) as u64
}
