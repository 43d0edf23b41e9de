//! SHA-1 (FIPS 180-4).
//!
//! Kept for interoperability with legacy protocols; new designs should
//! pick SHA-256 or BLAKE2. Not collision resistant.

use crate::hash::{HashAlgorithm, HashContext};
use crate::types::{AlgorithmId, HashDigest};

const INITIAL_STATE: [u32; 5] = [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476, 0xc3d2_e1f0];

/// SHA-1 with its fixed 20-byte digest.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha1;

impl HashAlgorithm for Sha1 {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Sha1
    }

    fn hash_length(&self) -> usize {
        20
    }

    fn block_length(&self) -> usize {
        64
    }

    fn begin(&self) -> Box<dyn HashContext> {
        Box::new(Sha1Context { state: INITIAL_STATE, buffer: [0; 64], buffered: 0, length: 0 })
    }
}

struct Sha1Context {
    state: [u32; 5],
    buffer: [u8; 64],
    buffered: usize,
    length: u64,
}

impl Sha1Context {
    fn compress(&mut self, block: &[u8; 64]) {
        let mut w = [0u32; 80];
        for (word, chunk) in w[..16].iter_mut().zip(block.chunks_exact(4)) {
            *word = u32::from_be_bytes(chunk.try_into().expect("4-byte chunk"));
        }
        for t in 16..80 {
            w[t] = (w[t - 3] ^ w[t - 8] ^ w[t - 14] ^ w[t - 16]).rotate_left(1);
        }

        let [mut a, mut b, mut c, mut d, mut e] = self.state;
        for (t, &word) in w.iter().enumerate() {
            let (f, k) = match t {
                0..=19 => ((b & c) | (!b & d), 0x5a82_7999),
                20..=39 => (b ^ c ^ d, 0x6ed9_eba1),
                40..=59 => ((b & c) | (b & d) | (c & d), 0x8f1b_bcdc),
                _ => (b ^ c ^ d, 0xca62_c1d6),
            };
            let temp = a.rotate_left(5).wrapping_add(f).wrapping_add(e).wrapping_add(k).wrapping_add(word);
            e = d;
            d = c;
            c = b.rotate_left(30);
            b = a;
            a = temp;
        }

        self.state[0] = self.state[0].wrapping_add(a);
        self.state[1] = self.state[1].wrapping_add(b);
        self.state[2] = self.state[2].wrapping_add(c);
        self.state[3] = self.state[3].wrapping_add(d);
        self.state[4] = self.state[4].wrapping_add(e);
    }
}

impl HashContext for Sha1Context {
    fn update(&mut self, mut data: &[u8]) {
        self.length += data.len() as u64;

        if self.buffered > 0 {
            let take = (64 - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];
            if self.buffered == 64 {
                let block = self.buffer;
                self.compress(&block);
                self.buffered = 0;
            }
        }

        while data.len() >= 64 {
            let block: [u8; 64] = data[..64].try_into().expect("64-byte block");
            self.compress(&block);
            data = &data[64..];
        }

        self.buffer[..data.len()].copy_from_slice(data);
        self.buffered = data.len();
    }

    fn finalize(mut self: Box<Self>) -> HashDigest {
        let bit_length = self.length * 8;
        self.buffer[self.buffered] = 0x80;
        self.buffered += 1;
        if self.buffered > 56 {
            self.buffer[self.buffered..].fill(0);
            let block = self.buffer;
            self.compress(&block);
            self.buffered = 0;
        }
        self.buffer[self.buffered..56].fill(0);
        self.buffer[56..].copy_from_slice(&bit_length.to_be_bytes());
        let block = self.buffer;
        self.compress(&block);

        let mut out = Vec::with_capacity(20);
        for word in self.state {
            out.extend_from_slice(&word.to_be_bytes());
        }
        HashDigest::new(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fips_vector_abc() {
        assert_eq!(hex::encode(Sha1.hash(b"abc").as_bytes()), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(hex::encode(Sha1.hash(b"").as_bytes()), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn test_two_block_message() {
        assert_eq!(
            hex::encode(Sha1.hash(b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq").as_bytes()),
            "84983e441c3bd26ebaae4aa1f95129e5e54670f1"
        );
    }
}
