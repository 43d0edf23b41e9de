//! BLAKE2b (RFC 7693): 64-bit words, 128-byte blocks, 12 rounds.
//!
//! Supports the parameter block's digest length, key, salt and
//! personalization fields with fanout 1 / depth 1 (sequential mode).
//! Keyed mode prepends a zero-padded key block to the message, which is
//! how BLAKE2 provides a MAC without HMAC's double hashing.

use crate::error::{CryptoError, Result};
use crate::hash::{HashAlgorithm, HashContext};
use crate::types::{AlgorithmId, HashDigest};

pub(crate) const BLOCK_SIZE: usize = 128;
pub(crate) const MAX_HASH_LENGTH: usize = 64;
const MAX_KEY_LENGTH: usize = 64;
const SALT_LENGTH: usize = 16;
const PERSONAL_LENGTH: usize = 16;

const IV: [u64; 8] = [
    0x6a09e667f3bcc908, 0xbb67ae8584caa73b, 0x3c6ef372fe94f82b, 0xa54ff53a5f1d36f1,
    0x510e527fade682d1, 0x9b05688c2b3e6c1f, 0x1f83d9abfb41bd6b, 0x5be0cd19137e2179,
];

/// Message word schedule; rounds 10 and 11 reuse rows 0 and 1.
const SIGMA: [[usize; 16]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
];

/// BLAKE2b with a configurable digest length in `[1, 64]`.
#[derive(Clone, Debug)]
pub struct Blake2b {
    hash_length: usize,
    salt: [u8; SALT_LENGTH],
    personal: [u8; PERSONAL_LENGTH],
}

impl Default for Blake2b {
    fn default() -> Self {
        Self { hash_length: MAX_HASH_LENGTH, salt: [0; SALT_LENGTH], personal: [0; PERSONAL_LENGTH] }
    }
}

impl Blake2b {
    /// # Errors
    /// [`CryptoError::InvalidHashLength`] outside `[1, 64]`.
    pub fn new(hash_length: usize) -> Result<Self> {
        if !(1..=MAX_HASH_LENGTH).contains(&hash_length) {
            return Err(CryptoError::InvalidHashLength { actual: hash_length, min: 1, max: MAX_HASH_LENGTH });
        }
        Ok(Self { hash_length, ..Self::default() })
    }

    /// Sets the 16-byte parameter-block salt (shorter values zero-pad).
    ///
    /// # Errors
    /// [`CryptoError::InvalidParameter`] when longer than 16 bytes.
    pub fn with_salt(mut self, salt: &[u8]) -> Result<Self> {
        if salt.len() > SALT_LENGTH {
            return Err(CryptoError::InvalidParameter("BLAKE2b salt longer than 16 bytes"));
        }
        self.salt = [0; SALT_LENGTH];
        self.salt[..salt.len()].copy_from_slice(salt);
        Ok(self)
    }

    /// Sets the 16-byte personalization string (shorter values zero-pad).
    ///
    /// # Errors
    /// [`CryptoError::InvalidParameter`] when longer than 16 bytes.
    pub fn with_personalization(mut self, personal: &[u8]) -> Result<Self> {
        if personal.len() > PERSONAL_LENGTH {
            return Err(CryptoError::InvalidParameter("BLAKE2b personalization longer than 16 bytes"));
        }
        self.personal = [0; PERSONAL_LENGTH];
        self.personal[..personal.len()].copy_from_slice(personal);
        Ok(self)
    }

    /// Starts a keyed (MAC-mode) computation.
    ///
    /// # Errors
    /// [`CryptoError::InvalidKeyLength`] when the key exceeds 64 bytes or
    /// is empty.
    pub fn begin_keyed(&self, key: &[u8]) -> Result<Box<dyn HashContext>> {
        if key.is_empty() || key.len() > MAX_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength { expected: MAX_KEY_LENGTH, actual: key.len() });
        }
        Ok(Box::new(Blake2bContext::new(self.hash_length, key, &self.salt, &self.personal)))
    }
}

impl HashAlgorithm for Blake2b {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Blake2b
    }

    fn hash_length(&self) -> usize {
        self.hash_length
    }

    fn block_length(&self) -> usize {
        BLOCK_SIZE
    }

    fn begin(&self) -> Box<dyn HashContext> {
        Box::new(Blake2bContext::new(self.hash_length, &[], &self.salt, &self.personal))
    }
}

pub(crate) struct Blake2bContext {
    h: [u64; 8],
    t: u128,
    buffer: [u8; BLOCK_SIZE],
    buffered: usize,
    hash_length: usize,
}

impl Blake2bContext {
    pub(crate) fn new(hash_length: usize, key: &[u8], salt: &[u8; SALT_LENGTH], personal: &[u8; PERSONAL_LENGTH]) -> Self {
        debug_assert!((1..=MAX_HASH_LENGTH).contains(&hash_length));
        debug_assert!(key.len() <= MAX_KEY_LENGTH);

        // Parameter block: digest_length, key_length, fanout = 1, depth = 1,
        // everything else zero except salt and personalization.
        let mut param = [0u8; 64];
        param[0] = hash_length as u8;
        param[1] = key.len() as u8;
        param[2] = 1;
        param[3] = 1;
        param[32..48].copy_from_slice(salt);
        param[48..64].copy_from_slice(personal);

        let mut h = IV;
        for (word, chunk) in h.iter_mut().zip(param.chunks_exact(8)) {
            *word ^= u64::from_le_bytes(chunk.try_into().expect("8-byte chunk"));
        }

        let mut context = Self { h, t: 0, buffer: [0; BLOCK_SIZE], buffered: 0, hash_length };
        if !key.is_empty() {
            // Keyed mode: one zero-padded key block precedes the message.
            context.buffer[..key.len()].copy_from_slice(key);
            context.buffered = BLOCK_SIZE;
        }
        context
    }

    /// Variable-length output used by the Argon2 H' construction.
    pub(crate) fn new_unkeyed(hash_length: usize) -> Self {
        Self::new(hash_length, &[], &[0; SALT_LENGTH], &[0; PERSONAL_LENGTH])
    }

    pub(crate) fn update_bytes(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            if self.buffered == BLOCK_SIZE {
                // Only compress a full buffer once we know more input
                // follows; the final block needs the finalization flag.
                self.t += BLOCK_SIZE as u128;
                self.compress(false);
                self.buffered = 0;
            }
            let take = (BLOCK_SIZE - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];
        }
    }

    pub(crate) fn finalize_bytes(mut self) -> Vec<u8> {
        self.t += self.buffered as u128;
        self.buffer[self.buffered..].fill(0);
        self.compress(true);

        let mut out = Vec::with_capacity(MAX_HASH_LENGTH);
        for word in self.h {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.truncate(self.hash_length);
        out
    }

    fn compress(&mut self, last: bool) {
        let mut m = [0u64; 16];
        for (word, chunk) in m.iter_mut().zip(self.buffer.chunks_exact(8)) {
            *word = u64::from_le_bytes(chunk.try_into().expect("8-byte chunk"));
        }

        let mut v = [0u64; 16];
        v[..8].copy_from_slice(&self.h);
        v[8..].copy_from_slice(&IV);
        v[12] ^= self.t as u64;
        v[13] ^= (self.t >> 64) as u64;
        if last {
            v[14] = !v[14];
        }

        for round in 0..12 {
            let s = &SIGMA[round % 10];
            g(&mut v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
            g(&mut v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
            g(&mut v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
            g(&mut v, 3, 7, 11, 15, m[s[6]], m[s[7]]);

            g(&mut v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
            g(&mut v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
            g(&mut v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
            g(&mut v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
        }

        for (i, word) in self.h.iter_mut().enumerate() {
            *word ^= v[i] ^ v[i + 8];
        }
    }
}

#[inline(always)]
fn g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize, x: u64, y: u64) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

impl HashContext for Blake2bContext {
    fn update(&mut self, data: &[u8]) {
        self.update_bytes(data);
    }

    fn finalize(self: Box<Self>) -> HashDigest {
        HashDigest::new(self.finalize_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7693_abc() {
        let digest = Blake2b::default().hash(b"abc");
        assert_eq!(
            hex::encode(digest.as_bytes()),
            "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1\
             7d87c5392aaa790ed1fbc3bf03c5c0a19b5ab4a9e5c1a58d19de5fa4d8a3e07f"
        );
    }

    #[test]
    fn test_keyed_kat_empty_message() {
        // blake2b KAT: 64-byte key 00..3f, empty input
        let key: Vec<u8> = (0u8..64).collect();
        let mut context = Blake2b::default().begin_keyed(&key).unwrap();
        context.update(b"");
        let digest = context.finalize();
        assert_eq!(
            hex::encode(digest.as_bytes()),
            "10ebb67700b1868efb4417987acf4690ae9d972fb7a590c2f02871799aaa4786\
             b5e996e8f0f4eb981fc214b005f42d2ff4233499391653df7aefcbc13fc51568"
        );
    }

    #[test]
    fn test_truncated_digest_is_not_a_prefix() {
        let full = Blake2b::default().hash(b"hello");
        let short = Blake2b::new(32).unwrap().hash(b"hello");
        assert_eq!(short.len(), 32);
        // Different digest_length changes the parameter block, so the
        // short digest is a different hash, not a truncation.
        assert_ne!(short.as_bytes(), &full.as_bytes()[..32]);
    }

    #[test]
    fn test_rejects_bad_lengths() {
        assert!(Blake2b::new(0).is_err());
        assert!(Blake2b::new(65).is_err());
        assert!(Blake2b::default().begin_keyed(&[0u8; 65]).is_err());
    }

    #[test]
    fn test_multi_block_incremental() {
        let data = vec![0xabu8; 700];
        let mut context = Blake2b::default().begin();
        for chunk in data.chunks(100) {
            context.update(chunk);
        }
        assert_eq!(context.finalize(), Blake2b::default().hash(&data));
    }

    #[test]
    fn test_personalization_separates_domains() {
        let plain = Blake2b::default().hash(b"data");
        let tagged = Blake2b::default().with_personalization(b"mydomain").unwrap().hash(b"data");
        assert_ne!(plain, tagged);
    }
}
