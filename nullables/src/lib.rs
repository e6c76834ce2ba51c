//! Nullable collaborators — in-memory stand-ins for the ledger, wallet,
//! network, elections, and vote processor, used to exercise the voting core
//! without a real node around it.

pub mod elections;
pub mod ledger;
pub mod network;
pub mod wallet;

pub use elections::NullElections;
pub use ledger::NullLedger;
pub use network::{NullBroadcaster, NullProcessor, RecordingChannel};
pub use wallet::NullWallet;
