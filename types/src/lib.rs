//! Fundamental types for the strand protocol.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: block hashes, ledger roots, and cryptographic key material.

pub mod block;
pub mod keys;
pub mod root;

pub use block::BlockHash;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use root::Root;
