//! The release executor and administrative surface.
//!
//! [`DripEngine`] owns every piece of engine state as one explicit
//! instance — ledger handle, clock, counters, timelock queue,
//! authorization registry — and mutates it only through the operations
//! below. The external transfer is the single suspension point: the
//! release timer is advanced optimistically before it, and rolled back
//! by exactly one period if it fails.

use tracing::{error, info, warn};

use serde::{Deserialize, Serialize};

use sluice_core::constants::{EngineParams, MAX_MULTIPLIER, MULTIPLIER_BASE};
use sluice_core::error::{AdminError, AuthError, ReleaseError, SluiceError};
use sluice_core::events::DripEvent;
use sluice_core::ledger::{Clock, Ledger};
use sluice_core::types::{AccountId, TriggerKind, UpdateCategory};

use crate::calculator;
use crate::registry::{AuthorizationRegistry, Ownership};
use crate::state::{BreakerStatus, ReleaseState};
use crate::timelock::{PendingUpdate, TimelockQueue};

/// Result of a successful release.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// Amount actually transferred.
    pub amount: u64,
    /// Whether the emergency reduction was applied.
    pub emergency: bool,
    /// Source balance after the transfer.
    pub balance_after: u64,
}

/// Read-only snapshot for external schedulers deciding whether to
/// invoke [`DripEngine::execute`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Probe {
    /// Whether an automated execute call would currently proceed.
    pub eligible: bool,
    /// Amount the calculator would release now.
    pub amount: u64,
    pub balance: u64,
    pub allowance: u64,
    pub next_eligible_at: u64,
    pub breaker: BreakerStatus,
    pub halted: bool,
    pub automation_enabled: bool,
}

/// The disbursement engine.
///
/// Generic over the [`Ledger`] collaborator and the time source so the
/// whole state machine is testable with an in-memory ledger and a
/// manual clock.
#[derive(Debug)]
pub struct DripEngine<L: Ledger, C: Clock> {
    ledger: L,
    clock: C,
    params: EngineParams,
    /// The engine's own identity — the allowance spender on the ledger.
    engine_id: AccountId,
    source: AccountId,
    destination: AccountId,
    ownership: Ownership,
    registry: AuthorizationRegistry,
    timelock: TimelockQueue,
    state: ReleaseState,
    multiplier: u64,
    automation_enabled: bool,
    halted: bool,
    pause_reason: Option<String>,
    events: Vec<DripEvent>,
}

impl<L: Ledger, C: Clock> DripEngine<L, C> {
    /// Create an engine. The first release becomes eligible one full
    /// period after creation. All addresses must be non-zero.
    pub fn new(
        ledger: L,
        clock: C,
        params: EngineParams,
        engine_id: AccountId,
        source: AccountId,
        destination: AccountId,
        authority: AccountId,
    ) -> Result<Self, SluiceError> {
        for addr in [&engine_id, &source, &destination, &authority] {
            if addr.is_zero() {
                return Err(AuthError::ZeroAddress.into());
            }
        }
        let created_at = clock.now();
        Ok(Self {
            ledger,
            clock,
            params,
            engine_id,
            source,
            destination,
            ownership: Ownership::new(authority),
            registry: AuthorizationRegistry::new(),
            timelock: TimelockQueue::new(),
            state: ReleaseState::new(created_at),
            multiplier: MULTIPLIER_BASE,
            automation_enabled: true,
            halted: false,
            pause_reason: None,
            events: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Release execution
    // ------------------------------------------------------------------

    /// Attempt one disbursement.
    ///
    /// Manual triggers are authority-only; automated triggers require
    /// the caller to be registered (or the authority) and automation to
    /// be enabled. Fails fast on a tripped breaker or a halt. On
    /// transfer failure the timer is rolled back one period, the
    /// failure counters advance, and the breaker may trip.
    pub fn execute(
        &mut self,
        caller: AccountId,
        trigger: TriggerKind,
    ) -> Result<ReleaseOutcome, SluiceError> {
        let now = self.clock.now();

        match trigger {
            TriggerKind::Manual => self.ownership.require_authority(&caller)?,
            TriggerKind::Automated => {
                if caller != self.ownership.authority() && !self.registry.is_authorized(&caller) {
                    // Security event: logged before rejecting.
                    self.events
                        .push(DripEvent::UnauthorizedTriggerAttempt { at: now, caller });
                    warn!(caller = %caller, "drip: unauthorized automated trigger rejected");
                    return Err(AuthError::UnauthorizedTrigger(caller).into());
                }
                if !self.automation_enabled {
                    return Err(ReleaseError::AutomationDisabled.into());
                }
            }
        }

        if let BreakerStatus::Tripped = self.state.breaker(self.params.failure_limit) {
            return Err(ReleaseError::CircuitBreakerTripped {
                failures: self.state.consecutive_failures,
            }
            .into());
        }
        if self.halted {
            return Err(ReleaseError::Halted {
                reason: self
                    .pause_reason
                    .clone()
                    .unwrap_or_else(|| "halted".to_string()),
            }
            .into());
        }

        if now < calculator::next_eligible_at(&self.params, self.state.last_release_time) {
            return Err(ReleaseError::NotYetEligible.into());
        }

        let balance = self.ledger.balance_of(&self.source)?;
        let allowance = self.ledger.allowance(&self.source, &self.engine_id)?;
        let amount = calculator::compute_amount(&self.params, self.multiplier, balance);
        if amount == 0 {
            return Err(ReleaseError::NotYetEligible.into());
        }
        // Authorization and balance must each independently cover the amount.
        if allowance < amount {
            return Err(ReleaseError::InsufficientAuthorization {
                have: allowance,
                need: amount,
            }
            .into());
        }
        if balance < amount {
            return Err(ReleaseError::InsufficientBalance {
                have: balance,
                need: amount,
            }
            .into());
        }

        // Near-exhausted source: release a fixed fraction of what is
        // left instead of the multiplier-derived amount.
        let (amount, emergency) = if balance <= self.params.emergency_threshold() {
            let reduced = calculator::emergency_amount(balance);
            self.events.push(DripEvent::EmergencyReleaseTriggered {
                at: now,
                balance,
                reduced_amount: reduced,
            });
            warn!(balance, reduced, "drip: emergency release mode");
            (reduced, true)
        } else {
            (amount, false)
        };

        // Optimistic advance: a stuck external call cannot re-trigger
        // within the same period.
        self.state.last_release_time = now;

        match self
            .ledger
            .transfer_from(&self.source, &self.engine_id, &self.destination, amount)
        {
            Ok(()) => {
                self.state.record_success(amount);
                let balance_after = balance.saturating_sub(amount);
                self.events.push(DripEvent::ReleaseExecuted {
                    at: now,
                    amount,
                    destination: self.destination,
                    total_released: self.state.total_released,
                    releases_executed: self.state.releases_executed,
                });
                info!(amount, destination = %self.destination, "drip: release executed");

                if balance_after <= self.params.low_balance_threshold() {
                    let periods_remaining = balance_after / self.params.baseline_release;
                    self.events.push(DripEvent::LowBalanceWarning {
                        at: now,
                        balance: balance_after,
                        periods_remaining,
                    });
                    warn!(balance_after, periods_remaining, "drip: low balance");
                }
                Ok(ReleaseOutcome {
                    amount,
                    emergency,
                    balance_after,
                })
            }
            Err(err) => {
                // Retry sooner: the failed attempt must not push the
                // next eligibility a full period out.
                self.state.roll_back_timer(self.params.period_secs);
                let tripped = self.state.record_failure(self.params.failure_limit);
                self.events.push(DripEvent::ReleaseFailed {
                    at: now,
                    amount,
                    reason: err.to_string(),
                    consecutive_failures: self.state.consecutive_failures,
                    failed_attempts: self.state.failed_release_attempts,
                });
                error!(
                    reason = %err,
                    consecutive = self.state.consecutive_failures,
                    "drip: release failed"
                );
                if tripped {
                    self.halted = true;
                    self.events.push(DripEvent::CircuitBreakerTripped {
                        at: now,
                        consecutive_failures: self.state.consecutive_failures,
                    });
                    error!(
                        consecutive = self.state.consecutive_failures,
                        "drip: circuit breaker tripped, engine halted"
                    );
                }
                Err(ReleaseError::Transfer(err).into())
            }
        }
    }

    /// Read-only eligibility probe; never mutates state.
    pub fn probe(&self) -> Result<Probe, SluiceError> {
        let now = self.clock.now();
        let balance = self.ledger.balance_of(&self.source)?;
        let allowance = self.ledger.allowance(&self.source, &self.engine_id)?;
        let amount = calculator::compute_amount(&self.params, self.multiplier, balance);
        let breaker = self.state.breaker(self.params.failure_limit);

        let eligible = calculator::is_eligible(
            &self.params,
            self.state.last_release_time,
            now,
            amount,
            allowance,
        ) && breaker == BreakerStatus::Armed
            && !self.halted
            && self.automation_enabled;

        Ok(Probe {
            eligible,
            amount,
            balance,
            allowance,
            next_eligible_at: calculator::next_eligible_at(&self.params, self.state.last_release_time),
            breaker,
            halted: self.halted,
            automation_enabled: self.automation_enabled,
        })
    }

    // ------------------------------------------------------------------
    // Halt control
    // ------------------------------------------------------------------

    /// Halt all releases, recording a human-readable reason.
    pub fn pause(&mut self, caller: AccountId, reason: &str) -> Result<(), SluiceError> {
        self.ownership.require_authority(&caller)?;
        if self.halted {
            return Err(AdminError::AlreadyHalted.into());
        }
        self.halted = true;
        self.pause_reason = Some(reason.to_string());
        self.events.push(DripEvent::Paused {
            at: self.clock.now(),
            reason: reason.to_string(),
        });
        info!(reason, "drip: paused");
        Ok(())
    }

    pub fn unpause(&mut self, caller: AccountId) -> Result<(), SluiceError> {
        self.ownership.require_authority(&caller)?;
        if !self.halted {
            return Err(AdminError::NotHalted.into());
        }
        self.halted = false;
        self.pause_reason = None;
        self.events.push(DripEvent::Unpaused {
            at: self.clock.now(),
        });
        info!("drip: unpaused");
        Ok(())
    }

    /// Re-arm the breaker and clear any halt. Resets the consecutive
    /// run only; the permanent failure history is retained.
    pub fn reset_breaker(&mut self, caller: AccountId) -> Result<(), SluiceError> {
        self.ownership.require_authority(&caller)?;
        self.state.reset_breaker();
        self.halted = false;
        self.pause_reason = None;
        self.events.push(DripEvent::CircuitBreakerReset {
            at: self.clock.now(),
        });
        info!("drip: circuit breaker reset");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Set the release multiplier, in percent of baseline (1..=500).
    pub fn set_multiplier(&mut self, caller: AccountId, multiplier: u64) -> Result<(), SluiceError> {
        self.ownership.require_authority(&caller)?;
        if multiplier == 0 || multiplier > MAX_MULTIPLIER {
            return Err(AdminError::MultiplierOutOfBounds {
                got: multiplier,
                max: MAX_MULTIPLIER,
            }
            .into());
        }
        let old = self.multiplier;
        self.multiplier = multiplier;
        self.events.push(DripEvent::MultiplierUpdated {
            at: self.clock.now(),
            old,
            new: multiplier,
        });
        info!(old, new = multiplier, "drip: multiplier updated");
        Ok(())
    }

    pub fn set_automation_enabled(
        &mut self,
        caller: AccountId,
        enabled: bool,
    ) -> Result<(), SluiceError> {
        self.ownership.require_authority(&caller)?;
        self.automation_enabled = enabled;
        self.events.push(DripEvent::AutomationToggled {
            at: self.clock.now(),
            enabled,
        });
        info!(enabled, "drip: automation toggled");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Timelocked address changes
    // ------------------------------------------------------------------

    /// Propose a new address for a timelocked slot; returns the update id.
    pub fn propose_update(
        &mut self,
        caller: AccountId,
        category: UpdateCategory,
        new_address: AccountId,
    ) -> Result<u64, SluiceError> {
        self.ownership.require_authority(&caller)?;
        let now = self.clock.now();
        let update =
            self.timelock
                .propose(category, new_address, now, self.params.timelock_delay_secs)?;
        self.events.push(DripEvent::UpdateProposed {
            at: now,
            id: update.id,
            category,
            new_address,
            execute_after: update.execute_after,
        });
        info!(
            id = update.id,
            %category,
            address = %new_address,
            execute_after = update.execute_after,
            "drip: update proposed"
        );
        Ok(update.id)
    }

    /// Commit a matured update, applying the new address to its slot.
    pub fn execute_update(
        &mut self,
        caller: AccountId,
        category: UpdateCategory,
    ) -> Result<AccountId, SluiceError> {
        self.ownership.require_authority(&caller)?;
        let now = self.clock.now();
        let update = self.timelock.execute(category, now)?;
        match category {
            UpdateCategory::SourceWallet => self.source = update.new_address,
            UpdateCategory::DestinationWallet => self.destination = update.new_address,
        }
        self.events.push(DripEvent::UpdateExecuted {
            at: now,
            id: update.id,
            category,
            new_address: update.new_address,
        });
        info!(id = update.id, %category, address = %update.new_address, "drip: update executed");
        Ok(update.new_address)
    }

    /// Active pending update for a category, if any.
    pub fn pending_update(&self, category: UpdateCategory) -> Option<&PendingUpdate> {
        self.timelock.active(category)
    }

    /// Full proposal history, including superseded and consumed entries.
    pub fn update_history(&self) -> &[PendingUpdate] {
        self.timelock.history()
    }

    // ------------------------------------------------------------------
    // Trigger-caller authorization
    // ------------------------------------------------------------------

    pub fn authorize_caller(
        &mut self,
        caller: AccountId,
        target: AccountId,
    ) -> Result<(), SluiceError> {
        self.ownership.require_authority(&caller)?;
        if self.registry.authorize(target)? {
            self.events.push(DripEvent::CallerAuthorized {
                at: self.clock.now(),
                caller: target,
            });
            info!(target = %target, "drip: caller authorized");
        }
        Ok(())
    }

    pub fn revoke_caller(
        &mut self,
        caller: AccountId,
        target: AccountId,
    ) -> Result<(), SluiceError> {
        self.ownership.require_authority(&caller)?;
        if self.registry.revoke(&target) {
            self.events.push(DripEvent::CallerRevoked {
                at: self.clock.now(),
                caller: target,
            });
            info!(target = %target, "drip: caller revoked");
        }
        Ok(())
    }

    /// Authorize a batch atomically; a malformed entry rejects the
    /// whole batch before any mutation.
    pub fn authorize_callers(
        &mut self,
        caller: AccountId,
        targets: &[AccountId],
    ) -> Result<(), SluiceError> {
        self.ownership.require_authority(&caller)?;
        let added = self.registry.authorize_batch(targets)?;
        let at = self.clock.now();
        for target in added {
            self.events.push(DripEvent::CallerAuthorized { at, caller: target });
            info!(target = %target, "drip: caller authorized");
        }
        Ok(())
    }

    pub fn revoke_callers(
        &mut self,
        caller: AccountId,
        targets: &[AccountId],
    ) -> Result<(), SluiceError> {
        self.ownership.require_authority(&caller)?;
        let removed = self.registry.revoke_batch(targets)?;
        let at = self.clock.now();
        for target in removed {
            self.events.push(DripEvent::CallerRevoked { at, caller: target });
            info!(target = %target, "drip: caller revoked");
        }
        Ok(())
    }

    pub fn is_authorized_caller(&self, caller: &AccountId) -> bool {
        self.registry.is_authorized(caller)
    }

    // ------------------------------------------------------------------
    // Ownership handover
    // ------------------------------------------------------------------

    pub fn propose_authority(
        &mut self,
        caller: AccountId,
        successor: AccountId,
    ) -> Result<(), SluiceError> {
        self.ownership.propose(&caller, successor)?;
        self.events.push(DripEvent::AuthorityProposed {
            at: self.clock.now(),
            current: self.ownership.authority(),
            proposed: successor,
        });
        info!(successor = %successor, "drip: authority proposed");
        Ok(())
    }

    /// Accept a pending handover. Only the proposed successor may call.
    pub fn accept_authority(&mut self, caller: AccountId) -> Result<(), SluiceError> {
        let previous = self.ownership.accept(&caller)?;
        self.events.push(DripEvent::AuthorityTransferred {
            at: self.clock.now(),
            previous,
            new_authority: caller,
        });
        info!(previous = %previous, new = %caller, "drip: authority transferred");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Emergency drain
    // ------------------------------------------------------------------

    /// Move an explicit amount (or everything remaining) to the
    /// destination, bypassing the cadence. Permitted only while halted,
    /// so it cannot serve as a stealth high-frequency drain during
    /// normal operation. Returns the amount moved.
    pub fn emergency_drain(
        &mut self,
        caller: AccountId,
        amount: Option<u64>,
    ) -> Result<u64, SluiceError> {
        self.ownership.require_authority(&caller)?;
        if !self.halted {
            return Err(AdminError::NotHalted.into());
        }
        let balance = self.ledger.balance_of(&self.source)?;
        let requested = amount.unwrap_or(balance);
        if requested > balance {
            return Err(AdminError::DrainExceedsBalance {
                requested,
                available: balance,
            }
            .into());
        }
        self.ledger
            .transfer_from(&self.source, &self.engine_id, &self.destination, requested)
            .map_err(ReleaseError::Transfer)?;
        let at = self.clock.now();
        self.events.push(DripEvent::EmergencyDrained {
            at,
            amount: requested,
            destination: self.destination,
        });
        warn!(amount = requested, destination = %self.destination, "drip: emergency drain");
        Ok(requested)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> &ReleaseState {
        &self.state
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    pub fn automation_enabled(&self) -> bool {
        self.automation_enabled
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn pause_reason(&self) -> Option<&str> {
        self.pause_reason.as_deref()
    }

    pub fn authority(&self) -> AccountId {
        self.ownership.authority()
    }

    pub fn pending_authority(&self) -> Option<AccountId> {
        self.ownership.pending()
    }

    pub fn source(&self) -> AccountId {
        self.source
    }

    pub fn destination(&self) -> AccountId {
        self.destination
    }

    /// The complete event history since engine creation.
    pub fn events(&self) -> &[DripEvent] {
        &self.events
    }
}
