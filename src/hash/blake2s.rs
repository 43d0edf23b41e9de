//! BLAKE2s (RFC 7693): 32-bit words, 64-byte blocks, 10 rounds.
//!
//! The small-word sibling of BLAKE2b for constrained targets; same
//! parameter-block layout with 8-byte salt and personalization fields.

use crate::error::{CryptoError, Result};
use crate::hash::{HashAlgorithm, HashContext};
use crate::types::{AlgorithmId, HashDigest};

const BLOCK_SIZE: usize = 64;
const MAX_HASH_LENGTH: usize = 32;
const MAX_KEY_LENGTH: usize = 32;
const SALT_LENGTH: usize = 8;
const PERSONAL_LENGTH: usize = 8;

const IV: [u32; 8] = [0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19];

/// Same message schedule as BLAKE2b; BLAKE2s stops after 10 rounds.
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

/// BLAKE2s with a configurable digest length in `[1, 32]`.
#[derive(Clone, Debug)]
pub struct Blake2s {
    hash_length: usize,
    salt: [u8; SALT_LENGTH],
    personal: [u8; PERSONAL_LENGTH],
}

impl Default for Blake2s {
    fn default() -> Self {
        Self { hash_length: MAX_HASH_LENGTH, salt: [0; SALT_LENGTH], personal: [0; PERSONAL_LENGTH] }
    }
}

impl Blake2s {
    /// # Errors
    /// [`CryptoError::InvalidHashLength`] outside `[1, 32]`.
    pub fn new(hash_length: usize) -> Result<Self> {
        if !(1..=MAX_HASH_LENGTH).contains(&hash_length) {
            return Err(CryptoError::InvalidHashLength { actual: hash_length, min: 1, max: MAX_HASH_LENGTH });
        }
        Ok(Self { hash_length, ..Self::default() })
    }

    /// Sets the 8-byte parameter-block salt (shorter values zero-pad).
    ///
    /// # Errors
    /// [`CryptoError::InvalidParameter`] when longer than 8 bytes.
    pub fn with_salt(mut self, salt: &[u8]) -> Result<Self> {
        if salt.len() > SALT_LENGTH {
            return Err(CryptoError::InvalidParameter("BLAKE2s salt longer than 8 bytes"));
        }
        self.salt = [0; SALT_LENGTH];
        self.salt[..salt.len()].copy_from_slice(salt);
        Ok(self)
    }

    /// Sets the 8-byte personalization string (shorter values zero-pad).
    ///
    /// # Errors
    /// [`CryptoError::InvalidParameter`] when longer than 8 bytes.
    pub fn with_personalization(mut self, personal: &[u8]) -> Result<Self> {
        if personal.len() > PERSONAL_LENGTH {
            return Err(CryptoError::InvalidParameter("BLAKE2s personalization longer than 8 bytes"));
        }
        self.personal = [0; PERSONAL_LENGTH];
        self.personal[..personal.len()].copy_from_slice(personal);
        Ok(self)
    }

    /// Starts a keyed (MAC-mode) computation.
    ///
    /// # Errors
    /// [`CryptoError::InvalidKeyLength`] when the key exceeds 32 bytes or
    /// is empty.
    pub fn begin_keyed(&self, key: &[u8]) -> Result<Box<dyn HashContext>> {
        if key.is_empty() || key.len() > MAX_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength { expected: MAX_KEY_LENGTH, actual: key.len() });
        }
        Ok(Box::new(Blake2sContext::new(self.hash_length, key, &self.salt, &self.personal)))
    }
}

impl HashAlgorithm for Blake2s {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Blake2s
    }

    fn hash_length(&self) -> usize {
        self.hash_length
    }

    fn block_length(&self) -> usize {
        BLOCK_SIZE
    }

    fn begin(&self) -> Box<dyn HashContext> {
        Box::new(Blake2sContext::new(self.hash_length, &[], &self.salt, &self.personal))
    }
}

struct Blake2sContext {
    h: [u32; 8],
    t: u64,
    buffer: [u8; BLOCK_SIZE],
    buffered: usize,
    hash_length: usize,
}

impl Blake2sContext {
    fn new(hash_length: usize, key: &[u8], salt: &[u8; SALT_LENGTH], personal: &[u8; PERSONAL_LENGTH]) -> Self {
        debug_assert!((1..=MAX_HASH_LENGTH).contains(&hash_length));
        debug_assert!(key.len() <= MAX_KEY_LENGTH);

        let mut param = [0u8; 32];
        param[0] = hash_length as u8;
        param[1] = key.len() as u8;
        param[2] = 1;
        param[3] = 1;
        param[16..24].copy_from_slice(salt);
        param[24..32].copy_from_slice(personal);

        let mut h = IV;
        for (word, chunk) in h.iter_mut().zip(param.chunks_exact(4)) {
            *word ^= u32::from_le_bytes(chunk.try_into().expect("4-byte chunk"));
        }

        let mut context = Self { h, t: 0, buffer: [0; BLOCK_SIZE], buffered: 0, hash_length };
        if !key.is_empty() {
            context.buffer[..key.len()].copy_from_slice(key);
            context.buffered = BLOCK_SIZE;
        }
        context
    }

    fn compress(&mut self, last: bool) {
        let mut m = [0u32; 16];
        for (word, chunk) in m.iter_mut().zip(self.buffer.chunks_exact(4)) {
            *word = u32::from_le_bytes(chunk.try_into().expect("4-byte chunk"));
        }

        let mut v = [0u32; 16];
        v[..8].copy_from_slice(&self.h);
        v[8..].copy_from_slice(&IV);
        v[12] ^= self.t as u32;
        v[13] ^= (self.t >> 32) as u32;
        if last {
            v[14] = !v[14];
        }

        for round in 0..10 {
            let s = &SIGMA[round];
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
fn g(v: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, x: u32, y: u32) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(12);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(8);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(7);
}

impl HashContext for Blake2sContext {
    fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            if self.buffered == BLOCK_SIZE {
                self.t += BLOCK_SIZE as u64;
                self.compress(false);
                self.buffered = 0;
            }
            let take = (BLOCK_SIZE - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];
        }
    }

    fn finalize(mut self: Box<Self>) -> HashDigest {
        self.t += self.buffered as u64;
        self.buffer[self.buffered..].fill(0);
        self.compress(true);

        let mut out = Vec::with_capacity(MAX_HASH_LENGTH);
        for word in self.h {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.truncate(self.hash_length);
        HashDigest::new(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7693_abc() {
        let digest = Blake2s::default().hash(b"abc");
        assert_eq!(hex::encode(digest.as_bytes()), "508c5e8c327c14e2e1a72ba34eeb452f37458b209ed63a294d999b4c86675982");
    }

    #[test]
    fn test_keyed_kat_empty_message() {
        // blake2s KAT: 32-byte key 00..1f, empty input
        let key: Vec<u8> = (0u8..32).collect();
        let mut context = Blake2s::default().begin_keyed(&key).unwrap();
        context.update(b"");
        let digest = context.finalize();
        assert_eq!(hex::encode(digest.as_bytes()), "48a8997da407876b3d79c0d92325ad3b89cbb754d86ab71aee047ad345fd2c49");
    }

    #[test]
    fn test_rejects_bad_lengths() {
        assert!(Blake2s::new(0).is_err());
        assert!(Blake2s::new(33).is_err());
        assert!(Blake2s::default().begin_keyed(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data = vec![0x5au8; 300];
        let mut context = Blake2s::default().begin();
        for chunk in data.chunks(7) {
            context.update(chunk);
        }
        assert_eq!(context.finalize(), Blake2s::default().hash(&data));
    }
}
