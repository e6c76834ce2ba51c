//! Read-side ledger access used by the voting core.

use crate::StoreError;
use strand_types::{BlockHash, PublicKey, Root};

/// Summary of an account's chain as stored in the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountInfo {
    /// The first block of the account's chain.
    pub open_block: BlockHash,
    /// The current chain head.
    pub head: BlockHash,
    /// Number of blocks in the chain.
    pub block_count: u64,
}

/// A ledger that can hand out read snapshots.
pub trait Ledger: Send + Sync {
    /// Open a consistent read snapshot. The snapshot borrows the ledger and
    /// is released when dropped.
    fn read(&self) -> Box<dyn LedgerSnapshot + '_>;
}

/// A scoped, consistent read view of the ledger.
///
/// One snapshot is held across a whole normalization or signing pass and
/// released on every exit path.
pub trait LedgerSnapshot {
    /// Whether a block with this hash is present in the ledger.
    fn block_exists(&self, hash: &BlockHash) -> bool;

    /// The block that follows the given root in its account chain, if any.
    fn successor(&self, root: &Root) -> Option<BlockHash>;

    /// Account metadata, treating the root as an account identifier.
    fn account_info(&self, root: &Root) -> Option<AccountInfo>;

    /// The serialized block stored under this hash.
    fn block_get(&self, hash: &BlockHash) -> Result<Vec<u8>, StoreError>;

    /// The next vote sequence number for a representative.
    ///
    /// Monotonically increasing per representative; the store is the sequence
    /// authority so later votes supersede earlier ones across restarts of the
    /// voting components.
    fn next_vote_sequence(&self, representative: &PublicKey) -> u64;
}
