//! Error taxonomy for the Sluice engine.
//!
//! Precondition errors never mutate state and are reported to the
//! immediate caller. Transfer failures are routed through the failure
//! tracker (timer rollback, counters) but still surfaced, since silent
//! swallowing would hide a money-movement problem.

use thiserror::Error;

use crate::types::AccountId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("invalid hex")]
    InvalidHex,
    #[error("invalid length, expected 32 bytes")]
    InvalidLength,
}

/// Failure of the external transfer call.
///
/// Any non-success outcome from the ledger is treated identically by
/// the failure path; the reason is carried when the ledger provides one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("transfer rejected: {0}")]
    Rejected(String),
    #[error("transfer failed: unknown reason")]
    Unknown,
}

/// Failure reading balance or allowance from the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger query failed: {0}")]
    Query(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReleaseError {
    #[error("circuit breaker tripped after {failures} consecutive failures")]
    CircuitBreakerTripped { failures: u32 },
    #[error("engine halted: {reason}")]
    Halted { reason: String },
    #[error("not yet eligible for release")]
    NotYetEligible,
    #[error("insufficient authorization: have {have}, need {need}")]
    InsufficientAuthorization { have: u64, need: u64 },
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u64, need: u64 },
    #[error("automated triggers are disabled")]
    AutomationDisabled,
    #[error("reentrant call rejected")]
    ReentrantCall,
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelockError {
    #[error("zero address is not a valid update target")]
    ZeroAddress,
    #[error("timelock not ready: executable at {ready_at}")]
    TimelockNotReady { ready_at: u64 },
    #[error("update already executed")]
    AlreadyExecuted,
    #[error("no update pending for this category")]
    NoUpdatePending,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("caller is not the control authority")]
    NotAuthority,
    #[error("caller is not the pending authority")]
    NotPendingAuthority,
    #[error("no ownership handover pending")]
    NoHandoverPending,
    #[error("unauthorized automated trigger: {0}")]
    UnauthorizedTrigger(AccountId),
    #[error("zero address")]
    ZeroAddress,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("multiplier {got} out of bounds (1..={max})")]
    MultiplierOutOfBounds { got: u64, max: u64 },
    #[error("batch entry {index} is the zero address")]
    InvalidBatchEntry { index: usize },
    #[error("engine is not halted")]
    NotHalted,
    #[error("engine is already halted")]
    AlreadyHalted,
    #[error("drain amount {requested} exceeds balance {available}")]
    DrainExceedsBalance { requested: u64, available: u64 },
}

/// Top-level error for every engine operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SluiceError {
    #[error(transparent)]
    Release(#[from] ReleaseError),
    #[error(transparent)]
    Timelock(#[from] TimelockError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Admin(#[from] AdminError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
