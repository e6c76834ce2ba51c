//! Vote generator — batches pending roots, signs votes, and broadcasts them.
//!
//! A dedicated worker thread drains the pending queue in batches of up to
//! [`Vote::MAX_HASHES`] entries. Under light load the worker uses a two-phase
//! wait: after the first delay expires, if the queue has crossed the
//! configured threshold but is not yet full, it waits one more delay for the
//! batch to fill before flushing. Near-simultaneous requests are consolidated
//! into fewer votes; the added latency is bounded by twice the configured
//! delay.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

use strand_store::{Ledger, LedgerSnapshot};
use strand_types::{BlockHash, PrivateKey, PublicKey, Root};

use crate::config::VotingConfig;
use crate::local_vote_history::LocalVoteHistory;
use crate::vote::Vote;
use crate::vote_reserver::VoteReserver;

/// The wallet's view of the representative keys this node votes with.
pub trait RepresentativeSet: Send + Sync {
    /// Invoke `f` once per voting representative. The wallet holds its own
    /// lock for the duration; callers must not hold theirs.
    fn foreach_representative(&self, f: &mut dyn FnMut(&PublicKey, &PrivateKey));

    /// Number of voting representatives held.
    fn voting_reps(&self) -> usize;
}

/// Network flood paths for outbound votes.
pub trait VoteBroadcaster: Send + Sync {
    /// Flood to principal-representative peers.
    fn flood_vote_pr(&self, vote: &Arc<Vote>);

    /// Flood to general peers with a fanout multiplier.
    fn flood_vote(&self, vote: &Arc<Vote>, fanout_scale: f32);
}

/// Local vote processor: every generated vote is also delivered to this node
/// as if received from itself.
pub trait VoteSink: Send + Sync {
    fn vote(&self, vote: Arc<Vote>);
}

/// Snapshot of the generator's internal container sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorInfo {
    pub queue_len: usize,
    pub reservation_count: usize,
}

struct GeneratorState {
    queue: VecDeque<(Root, BlockHash)>,
    reserver: VoteReserver,
    stopped: bool,
}

struct GeneratorShared {
    state: Mutex<GeneratorState>,
    condition: Condvar,
    config: VotingConfig,
    ledger: Arc<dyn Ledger>,
    wallet: Arc<dyn RepresentativeSet>,
    history: Arc<LocalVoteHistory>,
    broadcaster: Arc<dyn VoteBroadcaster>,
    processor: Arc<dyn VoteSink>,
}

pub struct VoteGenerator {
    shared: Arc<GeneratorShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl VoteGenerator {
    pub fn new(
        config: VotingConfig,
        ledger: Arc<dyn Ledger>,
        wallet: Arc<dyn RepresentativeSet>,
        history: Arc<LocalVoteHistory>,
        broadcaster: Arc<dyn VoteBroadcaster>,
        processor: Arc<dyn VoteSink>,
    ) -> Self {
        let reserver = VoteReserver::new(config.round_time(), Arc::clone(&history));
        let shared = Arc::new(GeneratorShared {
            state: Mutex::new(GeneratorState {
                queue: VecDeque::new(),
                reserver,
                stopped: false,
            }),
            condition: Condvar::new(),
            config,
            ledger,
            wallet,
            history,
            broadcaster,
            processor,
        });
        let worker = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("voting".to_string())
            .spawn(move || worker.run())
            .expect("spawn voting thread");
        Self {
            shared,
            thread: Mutex::new(Some(thread)),
        }
    }

    /// Request a vote for `(root, hash)`.
    ///
    /// Returns `true` when the request was refused because the root is
    /// rate-limited. Returns `false` when the request was served from the
    /// cache (each cached vote is re-broadcast) or enqueued for the worker.
    pub fn add(&self, root: Root, hash: BlockHash) -> bool {
        let cached = self.shared.history.votes_for_hash(&root, &hash);
        if !cached.is_empty() {
            for vote in &cached {
                self.shared.broadcast(vote);
            }
            return false;
        }
        let mut notify = false;
        let refused;
        {
            let mut state = self.shared.state.lock().unwrap();
            refused = state.reserver.add(&root);
            if !refused {
                state.queue.push_back((root, hash));
                // A lone entry rides the worker's timed wakeup; only a full
                // batch is worth an immediate notification.
                notify = state.queue.len() >= Vote::MAX_HASHES;
            }
        }
        if notify {
            self.shared.condition.notify_all();
        }
        refused
    }

    /// Generate votes for `requests` synchronously, applying `action` to each
    /// produced vote.
    ///
    /// Used by the request aggregator on its own worker thread. Roots that
    /// are rate-limited are skipped; the remainder is signed in batches of
    /// [`Vote::MAX_HASHES`].
    pub fn generate(&self, requests: &[(BlockHash, Root)], action: &dyn Fn(&Arc<Vote>)) {
        if requests.is_empty() {
            return;
        }
        let mut hashes = Vec::with_capacity(Vote::MAX_HASHES);
        let mut roots = Vec::with_capacity(Vote::MAX_HASHES);
        let mut state = self.shared.state.lock().unwrap();
        for (hash, root) in requests {
            if !state.reserver.add(root) {
                hashes.push(*hash);
                roots.push(*root);
                if hashes.len() == Vote::MAX_HASHES {
                    state = self.shared.vote(state, &hashes, &roots, action);
                    hashes.clear();
                    roots.clear();
                }
            }
        }
        if !hashes.is_empty() {
            let _state = self.shared.vote(state, &hashes, &roots, action);
        }
    }

    /// Cooperative shutdown: flags the worker, wakes it, and joins.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.stopped = true;
        }
        self.shared.condition.notify_all();
        if let Some(handle) = self.thread.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Container sizes, with the reservation count reported as such.
    pub fn info(&self) -> GeneratorInfo {
        let state = self.shared.state.lock().unwrap();
        GeneratorInfo {
            queue_len: state.queue.len(),
            reservation_count: state.reserver.reservation_count(),
        }
    }
}

impl Drop for VoteGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl GeneratorShared {
    fn run(&self) {
        let delay = self.config.vote_generator_delay();
        let threshold = self.config.vote_generator_threshold;
        let mut guard = self.state.lock().unwrap();
        while !guard.stopped {
            if guard.queue.len() >= Vote::MAX_HASHES {
                guard = self.send(guard);
            } else {
                guard = self
                    .condition
                    .wait_timeout_while(guard, delay, |state| {
                        !state.stopped && state.queue.len() < Vote::MAX_HASHES
                    })
                    .unwrap()
                    .0;
                if guard.queue.len() >= threshold && guard.queue.len() < Vote::MAX_HASHES {
                    // Second phase: the queue is filling, give it one more
                    // delay to reach a full batch.
                    guard = self
                        .condition
                        .wait_timeout_while(guard, delay, |state| {
                            !state.stopped && state.queue.len() < Vote::MAX_HASHES
                        })
                        .unwrap()
                        .0;
                }
                if !guard.queue.is_empty() {
                    guard = self.send(guard);
                }
            }
        }
    }

    /// Drain one batch off the queue and vote on it with the broadcast
    /// action.
    fn send<'a>(
        &'a self,
        mut guard: MutexGuard<'a, GeneratorState>,
    ) -> MutexGuard<'a, GeneratorState> {
        let mut hashes = Vec::with_capacity(Vote::MAX_HASHES);
        let mut roots = Vec::with_capacity(Vote::MAX_HASHES);
        {
            let state = &mut *guard;
            while hashes.len() < Vote::MAX_HASHES {
                let Some((root, hash)) = state.queue.pop_front() else {
                    break;
                };
                // Queued entries hold a reservation made in `add`.
                debug_assert!(state.reserver.add(&root));
                roots.push(root);
                hashes.push(hash);
            }
        }
        if !hashes.is_empty() {
            guard = self.vote(guard, &hashes, &roots, &|vote| self.broadcast(vote));
        }
        guard
    }

    /// Sign one batch and hand each produced vote to `action`.
    ///
    /// Signing runs outside the lock, under a single ledger read snapshot.
    /// Validation must come after signing: if any root's reservation vanished
    /// while the lock was released, none of the signed votes are used.
    fn vote<'a>(
        &'a self,
        guard: MutexGuard<'a, GeneratorState>,
        hashes: &[BlockHash],
        roots: &[Root],
        action: &dyn Fn(&Arc<Vote>),
    ) -> MutexGuard<'a, GeneratorState> {
        debug_assert_eq!(hashes.len(), roots.len());
        drop(guard);

        let mut votes: Vec<Arc<Vote>> = Vec::new();
        {
            let snapshot = self.ledger.read();
            self.wallet.foreach_representative(&mut |public, private| {
                let sequence = snapshot.next_vote_sequence(public);
                votes.push(Arc::new(Vote::new(
                    *public,
                    private,
                    sequence,
                    hashes.to_vec(),
                )));
            });
        }

        let mut guard = self.state.lock().unwrap();
        if !guard.reserver.validate_and_update(roots) {
            drop(guard);
            for vote in &votes {
                for (root, hash) in roots.iter().zip(hashes) {
                    self.history.add(*root, *hash, Arc::clone(vote));
                }
                action(vote);
            }
            guard = self.state.lock().unwrap();
        } else {
            tracing::debug!(
                batch = hashes.len(),
                "discarding vote batch, reservation expired during signing"
            );
        }
        guard
    }

    fn broadcast(&self, vote: &Arc<Vote>) {
        self.broadcaster.flood_vote_pr(vote);
        self.broadcaster.flood_vote(vote, 2.0);
        self.processor.vote(Arc::clone(vote));
    }
}
