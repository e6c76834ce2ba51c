//! Vote generation and request aggregation for the strand protocol.
//!
//! When peers ask which block is canonical for a ledger root, this crate
//! produces signed votes from the node's representative keys, subject to
//! rate-limiting, deduplication, and batching constraints that keep the
//! network stable during fork contention.
//!
//! ## Module overview
//!
//! - [`vote`] — The signed vote message and its digest/dedup identities.
//! - [`local_vote_history`] — Cache of recently issued votes keyed by root.
//! - [`vote_reserver`] — Time-windowed per-root lock limiting regeneration.
//! - [`vote_generator`] — Batching engine that signs and broadcasts votes.
//! - [`request_aggregator`] — Per-peer queue that canonicalizes peer requests
//!   and drives the generator.
//! - [`message`] — Wire messages emitted back to peers.
//! - [`config`] — Tunables with TOML support.

pub mod config;
pub mod error;
pub mod local_vote_history;
pub mod message;
pub mod request_aggregator;
pub mod vote;
pub mod vote_generator;
pub mod vote_reserver;

pub use config::VotingConfig;
pub use error::VoteError;
pub use local_vote_history::LocalVoteHistory;
pub use message::{ConfirmAckMessage, Message, PeerChannel, PublishMessage};
pub use request_aggregator::{ElectionWinners, RequestAggregator, AGGREGATOR_COUNTERS};
pub use vote::Vote;
pub use vote_generator::{
    GeneratorInfo, RepresentativeSet, VoteBroadcaster, VoteGenerator, VoteSink,
};
pub use vote_reserver::VoteReserver;
