//! Nullable network — records outbound votes and messages instead of
//! sending them.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use strand_consensus::{Message, PeerChannel, Vote, VoteBroadcaster, VoteSink};

/// Records flooded votes for assertions.
pub struct NullBroadcaster {
    pr_floods: Mutex<Vec<Arc<Vote>>>,
    floods: Mutex<Vec<(Arc<Vote>, f32)>>,
}

impl NullBroadcaster {
    pub fn new() -> Self {
        Self {
            pr_floods: Mutex::new(Vec::new()),
            floods: Mutex::new(Vec::new()),
        }
    }

    /// Votes flooded to principal representatives.
    pub fn pr_floods(&self) -> Vec<Arc<Vote>> {
        self.pr_floods.lock().unwrap().clone()
    }

    /// Votes flooded to general peers, with their fanout scale.
    pub fn floods(&self) -> Vec<(Arc<Vote>, f32)> {
        self.floods.lock().unwrap().clone()
    }
}

impl Default for NullBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteBroadcaster for NullBroadcaster {
    fn flood_vote_pr(&self, vote: &Arc<Vote>) {
        self.pr_floods.lock().unwrap().push(Arc::clone(vote));
    }

    fn flood_vote(&self, vote: &Arc<Vote>, fanout_scale: f32) {
        self.floods
            .lock()
            .unwrap()
            .push((Arc::clone(vote), fanout_scale));
    }
}

/// Records votes self-delivered to the local vote processor.
pub struct NullProcessor {
    received: Mutex<Vec<Arc<Vote>>>,
}

impl NullProcessor {
    pub fn new() -> Self {
        Self {
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<Arc<Vote>> {
        self.received.lock().unwrap().clone()
    }
}

impl Default for NullProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteSink for NullProcessor {
    fn vote(&self, vote: Arc<Vote>) {
        self.received.lock().unwrap().push(vote);
    }
}

/// A peer channel that records every message "sent" to it.
pub struct RecordingChannel {
    endpoint: SocketAddr,
    sent: Mutex<Vec<Message>>,
}

impl RecordingChannel {
    pub fn new(endpoint: SocketAddr) -> Self {
        Self {
            endpoint,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// All messages sent so far.
    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    /// Votes delivered as `confirm_ack`.
    pub fn confirm_acks(&self) -> Vec<Vote> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|message| match message {
                Message::ConfirmAck(ack) => Some(ack.vote.clone()),
                _ => None,
            })
            .collect()
    }

    /// Serialized blocks delivered as `publish`.
    pub fn publishes(&self) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|message| match message {
                Message::Publish(publish) => Some(publish.block.clone()),
                _ => None,
            })
            .collect()
    }
}

impl PeerChannel for RecordingChannel {
    fn send(&self, message: Message) {
        self.sent.lock().unwrap().push(message);
    }

    fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }
}
