//! Hostile-caller and boundary scenarios: every rejection path an
//! attacker or a misbehaving scheduler could probe.

use sluice_core::error::{AdminError, AuthError, ReleaseError, SluiceError, TimelockError};
use sluice_core::events::DripEvent;
use sluice_core::types::{AccountId, TriggerKind, UpdateCategory};
use sluice_tests::helpers::{AUTHORITY, BOT, DEST, ENGINE_ID, SOURCE, TestEnv, acct};

#[test]
fn unknown_caller_cannot_trigger_and_is_recorded() {
    let env = TestEnv::with_balance(100_000_000);
    env.advance_period();

    let intruder = acct(66);
    assert_eq!(
        env.sluice.execute(intruder, TriggerKind::Automated),
        Err(SluiceError::Auth(AuthError::UnauthorizedTrigger(intruder)))
    );
    assert_eq!(
        env.sluice.execute(intruder, TriggerKind::Manual),
        Err(SluiceError::Auth(AuthError::NotAuthority))
    );

    // The automated attempt left a security record; nothing moved.
    let events = env.sluice.events();
    assert!(events.iter().any(|e| matches!(
        e,
        DripEvent::UnauthorizedTriggerAttempt { caller, .. } if *caller == intruder
    )));
    assert_eq!(env.ledger.balance(&DEST), 0);
}

#[test]
fn revoked_scheduler_loses_access_immediately() {
    let env = TestEnv::with_balance(100_000_000);
    env.sluice.authorize_caller(AUTHORITY, BOT).unwrap();
    env.advance_period();
    env.sluice.execute(BOT, TriggerKind::Automated).unwrap();

    env.sluice.revoke_caller(AUTHORITY, BOT).unwrap();
    env.advance_period();
    assert_eq!(
        env.sluice.execute(BOT, TriggerKind::Automated),
        Err(SluiceError::Auth(AuthError::UnauthorizedTrigger(BOT)))
    );
}

#[test]
fn only_the_authority_manages_the_registry() {
    let env = TestEnv::with_balance(100_000_000);
    assert_eq!(
        env.sluice.authorize_caller(BOT, BOT),
        Err(SluiceError::Auth(AuthError::NotAuthority))
    );
    assert_eq!(
        env.sluice.revoke_caller(BOT, AUTHORITY),
        Err(SluiceError::Auth(AuthError::NotAuthority))
    );
}

#[test]
fn timelock_cannot_be_rushed() {
    let env = TestEnv::with_balance(100_000_000);
    env.sluice
        .propose_update(AUTHORITY, UpdateCategory::DestinationWallet, acct(7))
        .unwrap();

    // One second short of the delay still fails.
    env.clock.set(199);
    assert!(matches!(
        env.sluice
            .execute_update(AUTHORITY, UpdateCategory::DestinationWallet),
        Err(SluiceError::Timelock(TimelockError::TimelockNotReady { ready_at: 200 }))
    ));

    // Re-proposing restarts the clock rather than inheriting the old one.
    env.clock.set(199);
    env.sluice
        .propose_update(AUTHORITY, UpdateCategory::DestinationWallet, acct(7))
        .unwrap();
    env.clock.set(200);
    assert!(matches!(
        env.sluice
            .execute_update(AUTHORITY, UpdateCategory::DestinationWallet),
        Err(SluiceError::Timelock(TimelockError::TimelockNotReady { ready_at: 399 }))
    ));
}

#[test]
fn executed_update_cannot_be_replayed() {
    let env = TestEnv::with_balance(100_000_000);
    env.sluice
        .propose_update(AUTHORITY, UpdateCategory::SourceWallet, acct(7))
        .unwrap();
    env.clock.set(200);
    env.sluice
        .execute_update(AUTHORITY, UpdateCategory::SourceWallet)
        .unwrap();
    assert_eq!(
        env.sluice
            .execute_update(AUTHORITY, UpdateCategory::SourceWallet),
        Err(SluiceError::Timelock(TimelockError::AlreadyExecuted))
    );
}

#[test]
fn zero_address_proposals_are_rejected() {
    let env = TestEnv::with_balance(100_000_000);
    assert_eq!(
        env.sluice
            .propose_update(AUTHORITY, UpdateCategory::DestinationWallet, AccountId::ZERO),
        Err(SluiceError::Timelock(TimelockError::ZeroAddress))
    );
    assert_eq!(
        env.sluice.propose_authority(AUTHORITY, AccountId::ZERO),
        Err(SluiceError::Auth(AuthError::ZeroAddress))
    );
    assert_eq!(
        env.sluice.authorize_caller(AUTHORITY, AccountId::ZERO),
        Err(SluiceError::Auth(AuthError::ZeroAddress))
    );
}

#[test]
fn breaker_trips_at_exactly_the_limit() {
    let env = TestEnv::with_balance(100_000_000);
    env.ledger.fail_next_transfers(3);
    env.advance_period();

    // Two failures leave the breaker armed.
    env.sluice.execute(AUTHORITY, TriggerKind::Manual).unwrap_err();
    env.sluice.execute(AUTHORITY, TriggerKind::Manual).unwrap_err();
    assert!(!env.sluice.read(|e| e.is_halted()));

    // The third trips it; the next attempt is gated by the breaker
    // itself, not by the transfer.
    env.sluice.execute(AUTHORITY, TriggerKind::Manual).unwrap_err();
    assert!(env.sluice.read(|e| e.is_halted()));
    assert_eq!(
        env.sluice.execute(AUTHORITY, TriggerKind::Manual),
        Err(SluiceError::Release(ReleaseError::CircuitBreakerTripped { failures: 3 }))
    );

    // Unpausing alone is not enough; the breaker stays tripped.
    env.sluice.unpause(AUTHORITY).unwrap();
    assert_eq!(
        env.sluice.execute(AUTHORITY, TriggerKind::Manual),
        Err(SluiceError::Release(ReleaseError::CircuitBreakerTripped { failures: 3 }))
    );

    // Only an explicit reset recovers the engine.
    env.sluice.reset_breaker(AUTHORITY).unwrap();
    env.sluice.execute(AUTHORITY, TriggerKind::Manual).unwrap();
}

#[test]
fn breaker_reset_is_authority_only() {
    let env = TestEnv::with_balance(100_000_000);
    env.ledger.fail_next_transfers(3);
    env.advance_period();
    for _ in 0..3 {
        env.sluice.execute(AUTHORITY, TriggerKind::Manual).unwrap_err();
    }
    assert_eq!(
        env.sluice.reset_breaker(BOT),
        Err(SluiceError::Auth(AuthError::NotAuthority))
    );
}

#[test]
fn success_interleaved_with_failures_never_trips() {
    let env = TestEnv::with_balance(100_000_000);

    // Two failures, a success, two more failures: the consecutive run
    // never reaches three.
    for _ in 0..2 {
        env.advance_period();
        env.ledger.fail_next_transfers(2);
        env.sluice.execute(AUTHORITY, TriggerKind::Manual).unwrap_err();
        env.sluice.execute(AUTHORITY, TriggerKind::Manual).unwrap_err();
        env.sluice.execute(AUTHORITY, TriggerKind::Manual).unwrap();
    }
    assert!(!env.sluice.read(|e| e.is_halted()));
    assert_eq!(env.sluice.read(|e| e.state().failed_release_attempts), 4);
    assert_eq!(env.sluice.read(|e| e.state().consecutive_failures), 0);
}

#[test]
fn drain_outside_a_halt_is_rejected() {
    let env = TestEnv::with_balance(100_000_000);
    assert_eq!(
        env.sluice.emergency_drain(AUTHORITY, None),
        Err(SluiceError::Admin(AdminError::NotHalted))
    );
    assert_eq!(env.ledger.balance(&SOURCE), 100_000_000);

    // Nor can a non-authority drain even during a halt.
    env.sluice.pause(AUTHORITY, "incident").unwrap();
    assert_eq!(
        env.sluice.emergency_drain(BOT, None),
        Err(SluiceError::Auth(AuthError::NotAuthority))
    );
}

#[test]
fn batch_with_a_zero_entry_changes_nothing() {
    let env = TestEnv::with_balance(100_000_000);
    let batch = [acct(10), acct(11), AccountId::ZERO, acct(12)];

    assert_eq!(
        env.sluice.authorize_callers(AUTHORITY, &batch),
        Err(SluiceError::Admin(AdminError::InvalidBatchEntry { index: 2 }))
    );
    // Entries before the bad one were not applied.
    env.advance_period();
    assert_eq!(
        env.sluice.execute(acct(10), TriggerKind::Automated),
        Err(SluiceError::Auth(AuthError::UnauthorizedTrigger(acct(10))))
    );
    assert!(
        !env.sluice
            .events()
            .iter()
            .any(|e| matches!(e, DripEvent::CallerAuthorized { .. }))
    );
}

#[test]
fn handover_cannot_be_hijacked() {
    let env = TestEnv::with_balance(100_000_000);
    let successor = acct(5);
    let attacker = acct(6);

    assert_eq!(
        env.sluice.accept_authority(attacker),
        Err(SluiceError::Auth(AuthError::NoHandoverPending))
    );

    env.sluice.propose_authority(AUTHORITY, successor).unwrap();
    assert_eq!(
        env.sluice.accept_authority(attacker),
        Err(SluiceError::Auth(AuthError::NotPendingAuthority))
    );

    env.sluice.accept_authority(successor).unwrap();
    // A second accept finds no pending handover.
    assert_eq!(
        env.sluice.accept_authority(successor),
        Err(SluiceError::Auth(AuthError::NoHandoverPending))
    );
    // The deposed authority cannot re-propose itself.
    assert_eq!(
        env.sluice.propose_authority(AUTHORITY, AUTHORITY),
        Err(SluiceError::Auth(AuthError::NotAuthority))
    );
}

#[test]
fn reentrant_calls_bounce_off_the_handle() {
    let env = TestEnv::with_balance(100_000_000);
    env.advance_period();

    // A callback that re-enters while the engine lock is held must be
    // rejected, not queued behind itself.
    let nested = env
        .sluice
        .read(|_| env.sluice.execute(AUTHORITY, TriggerKind::Manual));
    assert_eq!(
        nested,
        Err(SluiceError::Release(ReleaseError::ReentrantCall))
    );

    // Once the nested call unwinds the same release goes through.
    let outcome = env.sluice.execute(AUTHORITY, TriggerKind::Manual).unwrap();
    assert_eq!(outcome.amount, 1_000_000);
}

#[test]
fn multiplier_cannot_exceed_the_hard_cap() {
    let env = TestEnv::with_balance(1_000_000_000);
    assert_eq!(
        env.sluice.set_multiplier(AUTHORITY, 100_000),
        Err(SluiceError::Admin(AdminError::MultiplierOutOfBounds {
            got: 100_000,
            max: 500,
        }))
    );

    // Even at the maximum multiplier the absolute cap binds.
    env.sluice.set_multiplier(AUTHORITY, 500).unwrap();
    env.advance_period();
    let outcome = env.sluice.execute(AUTHORITY, TriggerKind::Manual).unwrap();
    assert_eq!(outcome.amount, 5_000_000);
    assert!(outcome.amount <= env.params.absolute_cap());
}

#[test]
fn allowance_starvation_blocks_without_counting_as_failure() {
    let env = TestEnv::with_balance(100_000_000);
    env.ledger.approve(SOURCE, ENGINE_ID, 0);
    env.advance_period();

    assert_eq!(
        env.sluice.execute(AUTHORITY, TriggerKind::Manual),
        Err(SluiceError::Release(ReleaseError::InsufficientAuthorization {
            have: 0,
            need: 1_000_000,
        }))
    );
    assert_eq!(env.sluice.read(|e| e.state().failed_release_attempts), 0);
    assert_eq!(env.sluice.read(|e| e.state().consecutive_failures), 0);
}
