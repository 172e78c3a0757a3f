//! Core engine types: account identifiers, trigger kinds, update categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AccountIdError;

/// A 32-byte account identifier.
///
/// Identifies the custodial source, the destination, the engine itself
/// (as allowance spender), the control authority, and trigger callers.
/// The all-zero identifier is the null address and is rejected wherever
/// an address is set.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// The null address (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create an AccountId from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the null address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| AccountIdError::InvalidHex)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AccountIdError::InvalidLength)?;
        Ok(Self(arr))
    }
}

impl From<[u8; 32]> for AccountId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// How a release execution was triggered.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Invoked directly by the control authority.
    Manual,
    /// Invoked by a registered automated caller (or the authority).
    Automated,
}

/// The timelocked address slots, as a fixed enumeration.
///
/// Each category has its own independent pending-update pointer in the
/// timelock queue.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCategory {
    /// The custodial wallet funds are drawn from.
    SourceWallet,
    /// The operations wallet funds are sent to.
    DestinationWallet,
}

impl UpdateCategory {
    pub const COUNT: usize = 2;
    pub const ALL: [Self; Self::COUNT] = [Self::SourceWallet, Self::DestinationWallet];

    /// Stable index into per-category slot arrays.
    pub fn index(self) -> usize {
        match self {
            Self::SourceWallet => 0,
            Self::DestinationWallet => 1,
        }
    }
}

impl fmt::Display for UpdateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceWallet => write!(f, "source_wallet"),
            Self::DestinationWallet => write!(f, "destination_wallet"),
        }
    }
}
