//! Cryptographic primitives for the strand protocol: Blake2b-256 hashing and
//! Ed25519 key generation, signing, and verification.

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
