//! Cache of recently issued local votes, keyed by ledger root.
//!
//! The cache always reflects the node's current opinion for a root: adding a
//! vote with a new hash evicts every older entry for that root, so stale
//! votes for a prior fork choice are never served. Multiple entries per
//! `(root, hash)` are permitted — one per representative.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use strand_types::{BlockHash, Root};

use crate::vote::Vote;

/// Votes held for one root. Invariant: every vote is for `hash`.
struct RootEntry {
    hash: BlockHash,
    votes: Vec<(u64, Arc<Vote>)>,
}

struct HistoryState {
    by_root: HashMap<Root, RootEntry>,
    /// Insertion order, tagged so stale entries (erased or superseded roots)
    /// can be discarded lazily.
    order: VecDeque<(u64, Root)>,
    next_tag: u64,
    len: usize,
}

/// Bounded, internally synchronized vote cache.
pub struct LocalVoteHistory {
    state: Mutex<HistoryState>,
    max_size: usize,
}

impl LocalVoteHistory {
    /// Default global capacity.
    pub const MAX_SIZE: usize = 100_000;

    pub fn new(max_size: usize) -> Self {
        debug_assert!(max_size > 0);
        Self {
            state: Mutex::new(HistoryState {
                by_root: HashMap::new(),
                order: VecDeque::new(),
                next_tag: 0,
                len: 0,
            }),
            max_size,
        }
    }

    /// Record a vote for `(root, hash)`, evicting entries for the same root
    /// with a different hash, then trimming oldest insertions to capacity.
    pub fn add(&self, root: Root, hash: BlockHash, vote: Arc<Vote>) {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let tag = state.next_tag;
        state.next_tag += 1;

        let entry = state.by_root.entry(root).or_insert_with(|| RootEntry {
            hash,
            votes: Vec::new(),
        });
        if entry.hash != hash {
            state.len -= entry.votes.len();
            entry.votes.clear();
            entry.hash = hash;
        }
        entry.votes.push((tag, vote));
        state.len += 1;
        state.order.push_back((tag, root));

        Self::trim(state, self.max_size);
        if state.order.len() > 2 * self.max_size {
            Self::compact(state);
        }
        debug_assert!(state.len <= self.max_size);
    }

    /// Remove all entries for `root`.
    pub fn erase(&self, root: &Root) {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if let Some(entry) = state.by_root.remove(root) {
            state.len -= entry.votes.len();
        }
    }

    /// All cached votes for `root`.
    pub fn votes(&self, root: &Root) -> Vec<Arc<Vote>> {
        let guard = self.state.lock().unwrap();
        guard
            .by_root
            .get(root)
            .map(|entry| entry.votes.iter().map(|(_, v)| Arc::clone(v)).collect())
            .unwrap_or_default()
    }

    /// Cached votes for `root` that are for `hash`. By the per-root invariant
    /// this is all of them or none.
    pub fn votes_for_hash(&self, root: &Root, hash: &BlockHash) -> Vec<Arc<Vote>> {
        let guard = self.state.lock().unwrap();
        match guard.by_root.get(root) {
            Some(entry) if entry.hash == *hash => {
                entry.votes.iter().map(|(_, v)| Arc::clone(v)).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn exists(&self, root: &Root) -> bool {
        self.state.lock().unwrap().by_root.contains_key(root)
    }

    pub fn size(&self) -> usize {
        self.state.lock().unwrap().len
    }

    /// Evict oldest insertions until within capacity. Order entries whose
    /// vote has already been removed (erase or hash supersession) are
    /// discarded without counting.
    fn trim(state: &mut HistoryState, max_size: usize) {
        while state.len > max_size {
            let Some((tag, root)) = state.order.pop_front() else {
                break;
            };
            if let Some(entry) = state.by_root.get_mut(&root) {
                if let Some(position) = entry.votes.iter().position(|(t, _)| *t == tag) {
                    entry.votes.remove(position);
                    state.len -= 1;
                    if entry.votes.is_empty() {
                        state.by_root.remove(&root);
                    }
                }
            }
        }
    }

    /// Drop stale order entries so erase-heavy workloads don't grow the
    /// order queue without bound.
    fn compact(state: &mut HistoryState) {
        let by_root = &state.by_root;
        state.order.retain(|(tag, root)| {
            by_root
                .get(root)
                .is_some_and(|entry| entry.votes.iter().any(|(t, _)| t == tag))
        });
    }
}

impl Default for LocalVoteHistory {
    fn default() -> Self {
        Self::new(Self::MAX_SIZE)
    }
}
