//! Request aggregator — pools inbound vote requests per peer, canonicalizes
//! them against ledger state, and drives the vote generator.
//!
//! Each peer gets a small coalescing window (`small_delay`, refreshed on
//! every addition but never past `start + max_delay`), so bursts of requests
//! from one peer are answered with as few votes as possible. When the worker
//! falls behind and even the oldest pool's deadline is more than
//! `2 * max_delay` stale, new work is shed rather than queued.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use strand_store::{Ledger, LedgerSnapshot};
use strand_types::{BlockHash, Root};
use strand_utils::StatsCounter;

use crate::config::VotingConfig;
use crate::local_vote_history::LocalVoteHistory;
use crate::message::{ConfirmAckMessage, Message, PeerChannel, PublishMessage};
use crate::vote_generator::{RepresentativeSet, VoteGenerator};

/// Counter names emitted by the aggregator. Pass to
/// [`StatsCounter::new`] when wiring one up.
pub const AGGREGATOR_COUNTERS: &[&str] = &[
    "aggregator_accepted",
    "aggregator_dropped",
    "requests_cached_hashes",
    "requests_cached_votes",
    "requests_generated_hashes",
    "requests_generated_votes",
    "requests_unknown",
];

/// The election tracker's view of ongoing contests.
pub trait ElectionWinners: Send + Sync {
    /// The leading block of the election the given block participates in,
    /// if such an election is active.
    fn winner(&self, hash: &BlockHash) -> Option<BlockHash>;
}

/// One peer's aggregation bucket.
struct ChannelPool {
    channel: Arc<dyn PeerChannel>,
    start: Instant,
    deadline: Instant,
    hashes_roots: Vec<(BlockHash, Root)>,
}

struct AggregatorState {
    pools: HashMap<SocketAddr, ChannelPool>,
    stopped: bool,
}

struct AggregatorShared {
    state: Mutex<AggregatorState>,
    condition: Condvar,
    config: VotingConfig,
    stats: Arc<StatsCounter>,
    generator: Arc<VoteGenerator>,
    ledger: Arc<dyn Ledger>,
    wallet: Arc<dyn RepresentativeSet>,
    elections: Arc<dyn ElectionWinners>,
    history: Arc<LocalVoteHistory>,
}

pub struct RequestAggregator {
    shared: Arc<AggregatorShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl RequestAggregator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: VotingConfig,
        stats: Arc<StatsCounter>,
        generator: Arc<VoteGenerator>,
        ledger: Arc<dyn Ledger>,
        wallet: Arc<dyn RepresentativeSet>,
        elections: Arc<dyn ElectionWinners>,
        history: Arc<LocalVoteHistory>,
    ) -> Self {
        let shared = Arc::new(AggregatorShared {
            state: Mutex::new(AggregatorState {
                pools: HashMap::new(),
                stopped: false,
            }),
            condition: Condvar::new(),
            config,
            stats,
            generator,
            ledger,
            wallet,
            elections,
            history,
        });
        let worker = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("request_agg".to_string())
            .spawn(move || worker.run())
            .expect("spawn request aggregator thread");
        Self {
            shared,
            thread: Mutex::new(Some(thread)),
        }
    }

    /// Queue a peer's vote request.
    ///
    /// Callers must ensure the wallet holds at least one voting
    /// representative; a node with nothing to vote with has no business
    /// aggregating requests.
    pub fn add(&self, channel: &Arc<dyn PeerChannel>, hashes_roots: &[(BlockHash, Root)]) {
        debug_assert!(self.shared.wallet.voting_reps() > 0);
        let endpoint = channel.endpoint();
        let mut accepted = false;
        let mut notify = false;
        {
            let mut guard = self.shared.state.lock().unwrap();
            let now = Instant::now();
            // Protect against ever-growing memory when requests are consumed
            // slower than they arrive: if even the oldest pool is well past
            // its deadline, the worker has fallen behind and new work is shed.
            let overloaded = guard
                .pools
                .values()
                .map(|pool| pool.deadline)
                .min()
                .is_some_and(|oldest| oldest + 2 * self.shared.config.max_delay() <= now);
            if !overloaded {
                let state = &mut *guard;
                let pool = state.pools.entry(endpoint).or_insert_with(|| ChannelPool {
                    channel: Arc::clone(channel),
                    start: now,
                    deadline: now + self.shared.config.small_delay(),
                    hashes_roots: Vec::new(),
                });
                // Latest channel wins; the pool extends its lifetime by at
                // most max_delay.
                pool.channel = Arc::clone(channel);
                if pool.hashes_roots.len() + hashes_roots.len()
                    <= self.shared.config.max_channel_requests
                {
                    accepted = true;
                    pool.deadline = (pool.start + self.shared.config.max_delay())
                        .min(now + self.shared.config.small_delay());
                    pool.hashes_roots.extend_from_slice(hashes_roots);
                }
                notify = state.pools.len() == 1;
            } else {
                tracing::debug!(%endpoint, "shedding request, aggregator overloaded");
            }
        }
        if notify {
            self.shared.condition.notify_all();
        }
        self.shared.stats.increment(if accepted {
            "aggregator_accepted"
        } else {
            "aggregator_dropped"
        });
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

    /// Number of pending peer pools.
    pub fn size(&self) -> usize {
        self.shared.state.lock().unwrap().pools.len()
    }

    pub fn empty(&self) -> bool {
        self.size() == 0
    }
}

impl Drop for RequestAggregator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl AggregatorShared {
    fn run(&self) {
        let mut guard = self.state.lock().unwrap();
        while !guard.stopped {
            if guard.pools.is_empty() {
                guard = self
                    .condition
                    .wait_timeout_while(guard, self.config.small_delay(), |state| {
                        !state.stopped && state.pools.is_empty()
                    })
                    .unwrap()
                    .0;
            } else {
                let now = Instant::now();
                let Some((endpoint, deadline)) = guard
                    .pools
                    .iter()
                    .map(|(endpoint, pool)| (*endpoint, pool.deadline))
                    .min_by_key(|(_, deadline)| *deadline)
                else {
                    continue;
                };
                if deadline <= now {
                    let Some(pool) = guard.pools.remove(&endpoint) else {
                        continue;
                    };
                    drop(guard);
                    self.process(pool);
                    guard = self.state.lock().unwrap();
                } else {
                    let wait = deadline.saturating_duration_since(now);
                    guard = self
                        .condition
                        .wait_timeout_while(guard, wait, |state| {
                            !state.stopped && Instant::now() < deadline
                        })
                        .unwrap()
                        .0;
                }
            }
        }
    }

    /// Normalize, serve from cache, then generate the remainder — all
    /// outside the aggregator lock.
    fn process(&self, pool: ChannelPool) {
        let ChannelPool {
            channel,
            mut hashes_roots,
            ..
        } = pool;
        self.normalize_requests(&mut hashes_roots, channel.as_ref());
        self.send_cached(&mut hashes_roots, channel.as_ref());

        let stats = Arc::clone(&self.stats);
        let reply_channel = Arc::clone(&channel);
        self.generator.generate(&hashes_roots, &move |vote| {
            reply_channel.send(Message::ConfirmAck(ConfirmAckMessage {
                vote: (**vote).clone(),
            }));
            stats.increment("requests_generated_votes");
        });
        self.stats
            .add("requests_generated_hashes", hashes_roots.len() as u64);
    }

    /// Canonicalize each requested `(hash, root)` against elections and the
    /// ledger.
    ///
    /// A requested hash is overridden by the active election's winner when
    /// one exists. A hash behind our chain tip is replaced by the root's
    /// successor (the account's open block for rootless requests), and the
    /// successor block is published back to the peer so it can catch up.
    /// Entries that resolve to nothing are dropped.
    fn normalize_requests(
        &self,
        requests: &mut Vec<(BlockHash, Root)>,
        channel: &dyn PeerChannel,
    ) {
        let snapshot = self.ledger.read();
        requests.retain_mut(|(hash, root)| {
            if let Some(winner) = self.elections.winner(hash) {
                *hash = winner;
                return true;
            }
            if snapshot.block_exists(hash) {
                return true;
            }
            let successor = snapshot
                .successor(root)
                .or_else(|| snapshot.account_info(root).map(|info| info.open_block));
            match successor {
                Some(successor) => {
                    if *hash != successor {
                        let block = snapshot.block_get(&successor);
                        debug_assert!(block.is_ok());
                        if let Ok(block) = block {
                            channel.send(Message::Publish(PublishMessage { block }));
                        }
                        *hash = successor;
                    }
                    true
                }
                None => {
                    self.stats.increment("requests_unknown");
                    false
                }
            }
        });
    }

    /// Serve entries with cached votes, removing them from the request list.
    /// Each distinct vote goes to the peer exactly once even when it covers
    /// several requested hashes.
    fn send_cached(&self, requests: &mut Vec<(BlockHash, Root)>, channel: &dyn PeerChannel) {
        let mut sent_votes: HashSet<BlockHash> = HashSet::new();
        requests.retain(|(hash, root)| {
            let votes = self.history.votes_for_hash(root, hash);
            if votes.is_empty() {
                return true;
            }
            for vote in &votes {
                if sent_votes.insert(vote.full_hash()) {
                    channel.send(Message::ConfirmAck(ConfirmAckMessage {
                        vote: (**vote).clone(),
                    }));
                    self.stats.increment("requests_cached_votes");
                }
            }
            self.stats.increment("requests_cached_hashes");
            false
        });
    }
}
