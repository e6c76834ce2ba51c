//! Ledger root type.
//!
//! A root identifies a position in an account chain: the previous block hash
//! for existing accounts, or the account's public key for chains that have no
//! blocks yet. Both are 256-bit, so the root is an opaque 32-byte value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte ledger root — the contested position a vote refers to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Root([u8; 32]);

impl Default for Root {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Root {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl From<crate::block::BlockHash> for Root {
    fn from(hash: crate::block::BlockHash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl From<crate::keys::PublicKey> for Root {
    fn from(key: crate::keys::PublicKey) -> Self {
        Self(key.0)
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Root(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
