//! Nullable ledger — thread-safe in-memory ledger state for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use strand_store::{AccountInfo, Ledger, LedgerSnapshot, StoreError};
use strand_types::{BlockHash, PublicKey, Root};

/// An in-memory ledger. Thread-safe so generator and aggregator workers can
/// read it concurrently with test setup.
pub struct NullLedger {
    blocks: Mutex<HashMap<BlockHash, Vec<u8>>>,
    successors: Mutex<HashMap<Root, BlockHash>>,
    accounts: Mutex<HashMap<Root, AccountInfo>>,
    sequences: Mutex<HashMap<PublicKey, u64>>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self {
            blocks: Mutex::new(HashMap::new()),
            successors: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            sequences: Mutex::new(HashMap::new()),
        }
    }

    /// Store a serialized block under its hash.
    pub fn put_block(&self, hash: BlockHash, bytes: Vec<u8>) {
        self.blocks.lock().unwrap().insert(hash, bytes);
    }

    /// Record the block that follows `root` in its account chain.
    pub fn set_successor(&self, root: Root, successor: BlockHash) {
        self.successors.lock().unwrap().insert(root, successor);
    }

    /// Record account metadata, treating `root` as the account identifier.
    pub fn put_account(&self, root: Root, info: AccountInfo) {
        self.accounts.lock().unwrap().insert(root, info);
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for NullLedger {
    fn read(&self) -> Box<dyn LedgerSnapshot + '_> {
        Box::new(NullSnapshot { ledger: self })
    }
}

struct NullSnapshot<'a> {
    ledger: &'a NullLedger,
}

impl LedgerSnapshot for NullSnapshot<'_> {
    fn block_exists(&self, hash: &BlockHash) -> bool {
        self.ledger.blocks.lock().unwrap().contains_key(hash)
    }

    fn successor(&self, root: &Root) -> Option<BlockHash> {
        self.ledger.successors.lock().unwrap().get(root).copied()
    }

    fn account_info(&self, root: &Root) -> Option<AccountInfo> {
        self.ledger.accounts.lock().unwrap().get(root).cloned()
    }

    fn block_get(&self, hash: &BlockHash) -> Result<Vec<u8>, StoreError> {
        self.ledger
            .blocks
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hash.to_string()))
    }

    fn next_vote_sequence(&self, representative: &PublicKey) -> u64 {
        let mut sequences = self.ledger.sequences.lock().unwrap();
        let sequence = sequences.entry(*representative).or_insert(0);
        *sequence += 1;
        *sequence
    }
}
