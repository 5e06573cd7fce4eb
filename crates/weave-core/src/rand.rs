//! Deterministic per-deploy randomness
//!
//! Unforgeable names created inside a deploy are drawn from a ChaCha20
//! generator keyed by the deploy's seed, so replaying the deploy recreates
//! exactly the same names.

use crate::types::Deploy;
use crate::serialization::SerializationError;
use rand_chacha::{
    rand_core::{RngCore, SeedableRng},
    ChaCha20Rng,
};

/// Seeded generator handed to the interpreter for one evaluation
#[derive(Debug, Clone)]
pub struct SeededRand {
    rng: ChaCha20Rng,
}

impl SeededRand {
    /// Generator keyed by raw seed bytes
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(seed),
        }
    }

    /// Generator keyed by a deploy's unsigned encoding
    pub fn for_deploy(deploy: &Deploy) -> Result<Self, SerializationError> {
        Ok(Self::from_seed(deploy.seed()?))
    }

    /// Next unforgeable name id
    pub fn next_name(&mut self) -> [u8; 32] {
        let mut id = [0u8; 32];
        self.rng.fill_bytes(&mut id);
        id
    }
}
