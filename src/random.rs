//! Random sources: OS entropy and a deterministic ChaCha DRBG.
//!
//! Algorithm instances own a [`SecureRandom`] handle for nonce and key
//! generation. The default draws straight from the operating system;
//! tests inject a seeded [`ChaChaDrbg`] to get reproducible nonces. The
//! DRBG re-keys itself from its own output after every refill (fast key
//! erasure), so compromising its state never reveals bytes it already
//! produced.

use std::sync::{Arc, Mutex};

use zeroize::Zeroize;

use crate::bytes;
use crate::config::DRBG_RESEED_INTERVAL;
use crate::primitive::chacha;

/// Keystream bytes produced per refill, after the 32 ratchet bytes.
const BUFFER_SIZE: usize = 256;

/// A ChaCha20-based deterministic random bit generator.
///
/// Each refill runs the block function over a zero nonce with an
/// incrementing counter, takes the first 32 bytes of output as the next
/// internal key and serves the remaining 256 as output. Entropy-backed
/// instances additionally fold fresh OS entropy into the key every
/// [`DRBG_RESEED_INTERVAL`] output bytes; seeded instances never reseed
/// and are fully deterministic.
pub struct ChaChaDrbg {
    key: [u8; 32],
    buffer: [u8; BUFFER_SIZE],
    /// Unconsumed bytes at the tail of `buffer`.
    available: usize,
    produced_since_reseed: u64,
    reseeds: bool,
}

impl ChaChaDrbg {
    /// A deterministic generator; identical seeds yield identical output.
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { key: seed, buffer: [0; BUFFER_SIZE], available: 0, produced_since_reseed: 0, reseeds: false }
    }

    /// An OS-entropy-backed generator with periodic reseeding.
    #[must_use]
    pub fn from_entropy() -> Self {
        let mut drbg = Self::from_seed(bytes::random_bytes());
        drbg.reseeds = true;
        drbg
    }

    /// Fills `dest` with generator output.
    pub fn fill(&mut self, dest: &mut [u8]) {
        if self.reseeds && self.produced_since_reseed >= DRBG_RESEED_INTERVAL {
            self.reseed();
        }

        let mut filled = 0usize;
        while filled < dest.len() {
            if self.available == 0 {
                self.refill();
            }
            let take = self.available.min(dest.len() - filled);
            let start = BUFFER_SIZE - self.available;
            dest[filled..filled + take].copy_from_slice(&self.buffer[start..start + take]);
            // Consumed output must not survive in the buffer.
            self.buffer[start..start + take].fill(0);
            self.available -= take;
            filled += take;
        }
        self.produced_since_reseed += dest.len() as u64;
    }

    fn refill(&mut self) {
        let zero_nonce = [0u8; 12];
        let mut stream = [0u8; 32 + BUFFER_SIZE];
        for (i, chunk) in stream.chunks_mut(64).enumerate() {
            let block = chacha::block(&self.key, i as u32, &zero_nonce);
            chunk.copy_from_slice(&block[..chunk.len()]);
        }

        // Ratchet: the first 32 bytes become the next key and are never
        // released, so earlier output cannot be reconstructed from the
        // current state.
        self.key.copy_from_slice(&stream[..32]);
        self.buffer.copy_from_slice(&stream[32..]);
        self.available = BUFFER_SIZE;
        stream.zeroize();
    }

    fn reseed(&mut self) {
        tracing::debug!("reseeding DRBG from OS entropy");
        let entropy: [u8; 32] = bytes::random_bytes();
        for (key_byte, entropy_byte) in self.key.iter_mut().zip(entropy) {
            *key_byte ^= entropy_byte;
        }
        self.available = 0;
        self.produced_since_reseed = 0;
    }
}

impl Drop for ChaChaDrbg {
    fn drop(&mut self) {
        self.key.zeroize();
        self.buffer.zeroize();
    }
}

/// A cloneable random-source handle owned by algorithm instances.
///
/// `System` draws from the OS on every call and is safe for concurrent
/// use. `Seeded` serializes access to one [`ChaChaDrbg`] behind a mutex;
/// callers that need a reproducible sequence must serialize the
/// operations that consume it.
#[derive(Clone, Default)]
pub enum SecureRandom {
    #[default]
    System,
    Seeded(Arc<Mutex<ChaChaDrbg>>),
}

impl SecureRandom {
    /// The OS entropy source.
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    /// A deterministic source for tests and reproducible runs.
    #[must_use]
    pub fn seeded(seed: [u8; 32]) -> Self {
        Self::Seeded(Arc::new(Mutex::new(ChaChaDrbg::from_seed(seed))))
    }

    pub fn fill(&self, dest: &mut [u8]) {
        match self {
            Self::System => bytes::fill_random(dest),
            Self::Seeded(drbg) => drbg.lock().expect("DRBG lock poisoned").fill(dest),
        }
    }

    #[must_use]
    pub fn bytes(&self, length: usize) -> Vec<u8> {
        let mut out = vec![0u8; length];
        self.fill(&mut out);
        out
    }
}

impl std::fmt::Debug for SecureRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => f.write_str("SecureRandom::System"),
            Self::Seeded(_) => f.write_str("SecureRandom::Seeded"),
        }
    }
}
