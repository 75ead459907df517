//! Hash-chain randomness commitment.
//!
//! The operator commits to a chain of digests built by repeated
//! hashing of a secret. The treasury stores only the chain tail; every
//! play must reveal the tail's pre-image, which then becomes the new
//! tail. Links are consumed back-to-front, so a captured hash can
//! never be replayed and concurrent plays against one tail serialize
//! to a single winner.

use crate::errors::{CasinoError, CasinoResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DIGEST_LEN: usize = 32;

pub type Digest32 = [u8; DIGEST_LEN];

/// One Sha256 round.
pub fn sha256(data: impl AsRef<[u8]>) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hasher.finalize().into()
}

/// Builds a commitment chain from a secret.
///
/// `out[0] = H(secret)`, `out[i] = H(out[i-1])`. The operator commits
/// `out[length-1]` as the tail and reveals `out[length-2]`,
/// `out[length-3]`, ... one per play.
pub fn chain_from_secret(secret: &[u8], length: usize) -> Vec<Digest32> {
    let mut chain = Vec::with_capacity(length);
    let mut current = sha256(secret);
    for _ in 0..length {
        chain.push(current);
        current = sha256(current);
    }
    chain
}

/// Game seed derived from a consumed chain link and the play location.
///
/// Binding the land and machine ids into the digest keeps one revealed
/// link from steering outcomes on any other machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seed(Digest32);

impl Seed {
    pub fn as_bytes(&self) -> &Digest32 {
        &self.0
    }

    /// Uniform-enough draw in `0..modulus` from the leading bytes.
    pub fn number(&self, modulus: u64) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(raw) % modulus.max(1)
    }
}

pub fn derive_seed(local_hash: &Digest32, land_id: u64, machine_id: u64) -> Seed {
    let mut hasher = Sha256::new();
    hasher.update(local_hash);
    hasher.update(land_id.to_be_bytes());
    hasher.update(machine_id.to_be_bytes());
    Seed(hasher.finalize().into())
}

/// The stored commitment tail.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HashChain {
    tail: Option<Digest32>,
}

impl HashChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tail(&self) -> Option<Digest32> {
        self.tail
    }

    /// Replaces the commitment tail. Admin operation.
    pub fn set_tail(&mut self, tail: Digest32) {
        self.tail = Some(tail);
    }

    /// Checks that `local_hash` is the pre-image of the stored tail
    /// without consuming it.
    pub fn verify(&self, local_hash: &Digest32) -> CasinoResult<()> {
        match self.tail {
            Some(tail) if sha256(local_hash) == tail => Ok(()),
            _ => Err(CasinoError::HashChainViolation),
        }
    }

    /// Verifies `local_hash` and advances the tail onto it.
    pub fn consume(&mut self, local_hash: &Digest32) -> CasinoResult<()> {
        self.verify(local_hash)?;
        self.tail = Some(*local_hash);
        Ok(())
    }
}
