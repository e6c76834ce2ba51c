//! Wire messages emitted by the voting core.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::vote::Vote;

/// Maximum block hashes carried by one `confirm_ack` on the wire.
pub const CONFIRM_ACK_HASHES_MAX: usize = Vote::MAX_HASHES;

/// Confirmation acknowledgment: a representative vote sent to a peer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfirmAckMessage {
    pub vote: Vote,
}

/// Block publish, sent when a peer requested a hash behind our chain tip.
/// Carries the successor block in its serialized form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishMessage {
    pub block: Vec<u8>,
}

/// Messages this core sends to an individual peer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Message {
    ConfirmAck(ConfirmAckMessage),
    Publish(PublishMessage),
}

/// An outbound channel to a single peer.
///
/// Pools hold the channel alive for at most the pool's lifetime
/// (`max_delay`), so a shared handle is acceptable here.
pub trait PeerChannel: Send + Sync {
    fn send(&self, message: Message);
    fn endpoint(&self) -> SocketAddr;
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_crypto::keypair_from_seed;
    use strand_types::BlockHash;

    #[test]
    fn message_serde_roundtrip() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let vote = Vote::new(kp.public, &kp.private, 1, vec![BlockHash::new([9u8; 32])]);
        let message = Message::ConfirmAck(ConfirmAckMessage { vote: vote.clone() });
        let bytes = bincode::serialize(&message).unwrap();
        match bincode::deserialize::<Message>(&bytes).unwrap() {
            Message::ConfirmAck(ack) => assert_eq!(ack.vote, vote),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn publish_carries_opaque_block_bytes() {
        let message = Message::Publish(PublishMessage {
            block: vec![1, 2, 3],
        });
        let bytes = bincode::serialize(&message).unwrap();
        match bincode::deserialize::<Message>(&bytes).unwrap() {
            Message::Publish(publish) => assert_eq!(publish.block, vec![1, 2, 3]),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
