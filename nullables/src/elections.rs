//! Nullable election tracker — a settable winner table.

use std::collections::HashMap;
use std::sync::Mutex;

use strand_consensus::ElectionWinners;
use strand_types::BlockHash;

/// An election tracker double: maps contested block hashes to the current
/// election winner.
pub struct NullElections {
    winners: Mutex<HashMap<BlockHash, BlockHash>>,
}

impl NullElections {
    pub fn new() -> Self {
        Self {
            winners: Mutex::new(HashMap::new()),
        }
    }

    /// Declare `winner` the leading block of the election `hash` belongs to.
    pub fn set_winner(&self, hash: BlockHash, winner: BlockHash) {
        self.winners.lock().unwrap().insert(hash, winner);
    }
}

impl Default for NullElections {
    fn default() -> Self {
        Self::new()
    }
}

impl ElectionWinners for NullElections {
    fn winner(&self, hash: &BlockHash) -> Option<BlockHash> {
        self.winners.lock().unwrap().get(hash).copied()
    }
}
