//! Per-root vote reservation.
//!
//! A reservation marks a root as "voted recently": while it lives, no new
//! vote may be generated for that root. Reservations age out after the round
//! time, which is the minimum interval between successive regenerations.
//!
//! Not internally synchronized — the reserver is owned by the generator and
//! operated under the generator's mutex.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use strand_types::Root;

use crate::local_vote_history::LocalVoteHistory;

pub struct VoteReserver {
    reservations: HashMap<Root, Instant>,
    round_time: Duration,
    history: Arc<LocalVoteHistory>,
}

impl VoteReserver {
    pub fn new(round_time: Duration, history: Arc<LocalVoteHistory>) -> Self {
        Self {
            reservations: HashMap::new(),
            round_time,
            history,
        }
    }

    /// Try to reserve `root` for a fresh vote.
    ///
    /// Returns `true` when the root is already reserved, meaning the caller
    /// must refuse — a recent vote is still authoritative. Returns `false`
    /// on a fresh reservation, which also purges the root from the local
    /// history so no stale vote can be served while the new one is produced.
    pub fn add(&mut self, root: &Root) -> bool {
        self.clean();
        match self.reservations.entry(*root) {
            Entry::Occupied(_) => true,
            Entry::Vacant(vacant) => {
                vacant.insert(Instant::now());
                self.history.erase(root);
                false
            }
        }
    }

    /// Confirm that every root still holds its reservation, refreshing the
    /// reservation times.
    ///
    /// Called after vote signing, which runs outside the generator lock: if
    /// any reservation vanished mid-sign the batch is unusable. Returns
    /// `true` if any root was invalid.
    pub fn validate_and_update(&mut self, roots: &[Root]) -> bool {
        self.clean();
        let now = Instant::now();
        let mut any_invalid = false;
        for root in roots {
            match self.reservations.get_mut(root) {
                Some(time) => *time = now,
                None => any_invalid = true,
            }
        }
        any_invalid
    }

    /// Drop reservations older than the round time.
    pub fn clean(&mut self) {
        let round_time = self.round_time;
        self.reservations.retain(|_, time| time.elapsed() < round_time);
    }

    /// Number of live reservations.
    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    pub fn round_time(&self) -> Duration {
        self.round_time
    }
}
