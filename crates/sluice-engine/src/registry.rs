//! Trigger-caller authorization and the two-step ownership handover.

use std::collections::HashSet;

use sluice_core::error::{AdminError, AuthError};
use sluice_core::types::AccountId;

/// Whitelist of identities allowed to invoke the automated trigger.
///
/// The control authority is always implicitly authorized and is never
/// stored here.
#[derive(Clone, Debug, Default)]
pub struct AuthorizationRegistry {
    authorized: HashSet<AccountId>,
}

impl AuthorizationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authorized(&self, caller: &AccountId) -> bool {
        self.authorized.contains(caller)
    }

    /// Add a single caller. Returns true if newly added.
    pub fn authorize(&mut self, caller: AccountId) -> Result<bool, AuthError> {
        if caller.is_zero() {
            return Err(AuthError::ZeroAddress);
        }
        Ok(self.authorized.insert(caller))
    }

    /// Remove a single caller. Returns true if it was present.
    pub fn revoke(&mut self, caller: &AccountId) -> bool {
        self.authorized.remove(caller)
    }

    /// Add a batch atomically: every entry is validated before any is
    /// applied, so a malformed entry leaves the registry unchanged.
    /// Returns the callers that were newly added.
    pub fn authorize_batch(&mut self, callers: &[AccountId]) -> Result<Vec<AccountId>, AdminError> {
        Self::validate_batch(callers)?;
        Ok(callers
            .iter()
            .filter(|c| self.authorized.insert(**c))
            .copied()
            .collect())
    }

    /// Remove a batch atomically, with the same validation as
    /// [`authorize_batch`](Self::authorize_batch). Returns the callers
    /// that were actually removed.
    pub fn revoke_batch(&mut self, callers: &[AccountId]) -> Result<Vec<AccountId>, AdminError> {
        Self::validate_batch(callers)?;
        Ok(callers
            .iter()
            .filter(|c| self.authorized.remove(c))
            .copied()
            .collect())
    }

    fn validate_batch(callers: &[AccountId]) -> Result<(), AdminError> {
        for (index, caller) in callers.iter().enumerate() {
            if caller.is_zero() {
                return Err(AdminError::InvalidBatchEntry { index });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.authorized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authorized.is_empty()
    }
}

/// The single control authority with a two-step handover.
///
/// The current authority proposes a successor; only that successor may
/// accept, at which point authority transfers and the pending slot
/// clears. Prevents accidental transfer to an unreachable address.
#[derive(Clone, Debug)]
pub struct Ownership {
    authority: AccountId,
    pending: Option<AccountId>,
}

impl Ownership {
    pub fn new(authority: AccountId) -> Self {
        Self {
            authority,
            pending: None,
        }
    }

    pub fn authority(&self) -> AccountId {
        self.authority
    }

    pub fn pending(&self) -> Option<AccountId> {
        self.pending
    }

    /// Reject any caller other than the current authority.
    pub fn require_authority(&self, caller: &AccountId) -> Result<(), AuthError> {
        if *caller != self.authority {
            return Err(AuthError::NotAuthority);
        }
        Ok(())
    }

    /// Propose a successor. Authority-only; rejects the zero address.
    pub fn propose(&mut self, caller: &AccountId, successor: AccountId) -> Result<(), AuthError> {
        self.require_authority(caller)?;
        if successor.is_zero() {
            return Err(AuthError::ZeroAddress);
        }
        self.pending = Some(successor);
        Ok(())
    }

    /// Accept a pending handover. Only the proposed successor may call;
    /// on success returns the previous authority and clears the slot.
    pub fn accept(&mut self, caller: &AccountId) -> Result<AccountId, AuthError> {
        let proposed = self.pending.ok_or(AuthError::NoHandoverPending)?;
        if *caller != proposed {
            return Err(AuthError::NotPendingAuthority);
        }
        let previous = self.authority;
        self.authority = proposed;
        self.pending = None;
        Ok(previous)
    }
}
