//! Timelocked configuration changes for sensitive addresses.
//!
//! Two-phase propose/execute with a mandatory fixed delay. Categories
//! are a closed enumeration ([`UpdateCategory`]), each with its own
//! active pointer over an append-only history: a new proposal for a
//! category supersedes the previous one, which stays in history but is
//! no longer reachable. Executability is a computed predicate of the
//! current time, never an explicit transition.

use serde::{Deserialize, Serialize};

use sluice_core::error::TimelockError;
use sluice_core::types::{AccountId, UpdateCategory};

/// One proposed address change, keyed by a monotonically increasing id.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingUpdate {
    pub id: u64,
    pub category: UpdateCategory,
    pub new_address: AccountId,
    /// Timestamp at or after which the update becomes executable.
    pub execute_after: u64,
    /// Set exactly once by a successful execute.
    pub executed: bool,
}

impl PendingUpdate {
    /// An update is executable iff it has not been consumed and the
    /// delay has elapsed.
    pub fn is_executable(&self, now: u64) -> bool {
        !self.executed && now >= self.execute_after
    }
}

/// Append-only update history with one active pointer per category.
#[derive(Clone, Debug, Default)]
pub struct TimelockQueue {
    next_id: u64,
    history: Vec<PendingUpdate>,
    active: [Option<usize>; UpdateCategory::COUNT],
}

impl TimelockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Propose a new address for a category, superseding any active
    /// pending update. Rejects the zero address.
    pub fn propose(
        &mut self,
        category: UpdateCategory,
        new_address: AccountId,
        now: u64,
        delay_secs: u64,
    ) -> Result<PendingUpdate, TimelockError> {
        if new_address.is_zero() {
            return Err(TimelockError::ZeroAddress);
        }
        let update = PendingUpdate {
            id: self.next_id,
            category,
            new_address,
            execute_after: now.saturating_add(delay_secs),
            executed: false,
        };
        self.next_id += 1;
        self.history.push(update);
        self.active[category.index()] = Some(self.history.len() - 1);
        Ok(update)
    }

    /// The active (reachable) pending update for a category, if any.
    pub fn active(&self, category: UpdateCategory) -> Option<&PendingUpdate> {
        self.active[category.index()].map(|idx| &self.history[idx])
    }

    /// Consume the active update for a category, marking it executed.
    ///
    /// # Errors
    ///
    /// - [`TimelockError::NoUpdatePending`] with nothing active
    /// - [`TimelockError::AlreadyExecuted`] if the active entry was consumed
    /// - [`TimelockError::TimelockNotReady`] strictly before `execute_after`
    pub fn execute(
        &mut self,
        category: UpdateCategory,
        now: u64,
    ) -> Result<PendingUpdate, TimelockError> {
        let idx = self.active[category.index()].ok_or(TimelockError::NoUpdatePending)?;
        let update = &mut self.history[idx];
        if update.executed {
            return Err(TimelockError::AlreadyExecuted);
        }
        if now < update.execute_after {
            return Err(TimelockError::TimelockNotReady {
                ready_at: update.execute_after,
            });
        }
        update.executed = true;
        Ok(*update)
    }

    /// Full proposal history, including superseded and consumed entries.
    pub fn history(&self) -> &[PendingUpdate] {
        &self.history
    }
}
