//! The signed vote message.
//!
//! A vote references up to twelve blocks by hash — one per contested root —
//! and is signed by a representative key. Votes are immutable after
//! construction and shared as `Arc<Vote>` between the local history, the
//! broadcast path, and per-peer replies.

use serde::{Deserialize, Serialize};
use strand_crypto::{blake2b_256_multi, sign_message, verify_signature};
use strand_types::{BlockHash, PrivateKey, PublicKey, Signature};

use crate::error::VoteError;

/// A representative's vote over a batch of block hashes.
///
/// The signature covers [`Vote::hash`]: a Blake2b digest of the block hashes
/// (domain-prefixed when more than one is present) followed by the sequence
/// number in little-endian form. Higher sequence numbers from the same
/// representative supersede lower ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// The voting representative's public key.
    pub account: PublicKey,
    /// Ed25519 signature over [`Vote::hash`].
    pub signature: Signature,
    /// Monotonically increasing per-representative counter.
    pub sequence: u64,
    /// Block hashes being voted for, one per contested root.
    pub hashes: Vec<BlockHash>,
}

/// Domain-separation prefix mixed into multi-hash vote digests.
const HASH_PREFIX: &[u8] = b"vote ";

impl Vote {
    /// Wire cap on hashes per vote (`confirm_ack` batch size).
    pub const MAX_HASHES: usize = 12;

    /// Construct and sign a vote with a representative key.
    pub fn new(
        account: PublicKey,
        private: &PrivateKey,
        sequence: u64,
        hashes: Vec<BlockHash>,
    ) -> Self {
        debug_assert!(!hashes.is_empty());
        debug_assert!(hashes.len() <= Self::MAX_HASHES);
        let mut vote = Self {
            account,
            signature: Signature([0u8; 64]),
            sequence,
            hashes,
        };
        vote.signature = sign_message(vote.hash().as_bytes(), private);
        vote
    }

    /// The digest that the representative signs.
    pub fn hash(&self) -> BlockHash {
        let sequence_bytes = self.sequence.to_le_bytes();
        let mut parts: Vec<&[u8]> = Vec::with_capacity(self.hashes.len() + 2);
        if self.hashes.len() > 1 {
            parts.push(HASH_PREFIX);
        }
        for hash in &self.hashes {
            parts.push(hash.as_bytes());
        }
        parts.push(&sequence_bytes);
        BlockHash::new(blake2b_256_multi(&parts))
    }

    /// The vote's deduplication identity: digest of the signed hash, the
    /// account, and the signature together.
    pub fn full_hash(&self) -> BlockHash {
        let inner = self.hash();
        BlockHash::new(blake2b_256_multi(&[
            inner.as_bytes(),
            self.account.as_bytes(),
            self.signature.as_bytes(),
        ]))
    }

    /// Verify the signature against the voting account.
    pub fn validate(&self) -> bool {
        verify_signature(self.hash().as_bytes(), &self.signature, &self.account)
    }

    /// Serialize for the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("vote is always serializable")
    }

    /// Deserialize from the wire, rejecting votes with an out-of-range hash
    /// count.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VoteError> {
        let vote: Vote =
            bincode::deserialize(bytes).map_err(|e| VoteError::Malformed(e.to_string()))?;
        if vote.hashes.is_empty() {
            return Err(VoteError::Empty);
        }
        if vote.hashes.len() > Self::MAX_HASHES {
            return Err(VoteError::TooManyHashes(vote.hashes.len()));
        }
        Ok(vote)
    }
}
