//! Nullable wallet — holds representative keys in memory.

use std::sync::Mutex;

use strand_consensus::RepresentativeSet;
use strand_types::{KeyPair, PrivateKey, PublicKey};

/// A wallet double holding representative key pairs.
pub struct NullWallet {
    reps: Mutex<Vec<(PublicKey, [u8; 32])>>,
}

impl NullWallet {
    pub fn new() -> Self {
        Self {
            reps: Mutex::new(Vec::new()),
        }
    }

    /// Add a representative key pair.
    pub fn insert(&self, keypair: KeyPair) {
        self.reps
            .lock()
            .unwrap()
            .push((keypair.public, keypair.private.0));
    }
}

impl Default for NullWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl RepresentativeSet for NullWallet {
    fn foreach_representative(&self, f: &mut dyn FnMut(&PublicKey, &PrivateKey)) {
        let reps = self.reps.lock().unwrap();
        for (public, private_bytes) in reps.iter() {
            let private = PrivateKey(*private_bytes);
            f(public, &private);
        }
    }

    fn voting_reps(&self) -> usize {
        self.reps.lock().unwrap().len()
    }
}
