//! Poly1305 one-shot MAC (RFC 8439 section 2.5).
//!
//! The 32-byte key splits into a clamped multiplier `r` and a final
//! addend `s`. Each 16-octet message block, extended with one high bit,
//! is folded into the accumulator modulo 2^130 - 5. The arithmetic runs
//! on `BigUint`; the prime is tiny, so the per-block cost is dominated by
//! one short multiplication.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Key size in bytes.
pub const KEY_SIZE: usize = 32;

fn clamp_r(key: &[u8; KEY_SIZE]) -> BigUint {
    let mut r = [0u8; 16];
    r.copy_from_slice(&key[..16]);
    r[3] &= 15;
    r[7] &= 15;
    r[11] &= 15;
    r[15] &= 15;
    r[4] &= 252;
    r[8] &= 252;
    r[12] &= 252;
    BigUint::from_bytes_le(&r)
}

/// Computes the Poly1305 tag of `message` under a one-time key.
///
/// The key must never authenticate two different messages; the AEAD
/// constructions derive a fresh one from the cipher keystream per nonce.
#[must_use]
pub fn compute(key: &[u8; KEY_SIZE], message: &[u8]) -> [u8; TAG_SIZE] {
    let p: BigUint = (BigUint::one() << 130u32) - BigUint::from(5u8);
    let r = clamp_r(key);
    let s = BigUint::from_bytes_le(&key[16..]);

    let mut acc = BigUint::zero();
    for chunk in message.chunks(16) {
        // The block plus 2^(8 * len) so trailing zeros stay significant.
        let n = BigUint::from_bytes_le(chunk) + (BigUint::one() << (8 * chunk.len()));
        acc = (acc + n) * &r % &p;
    }
    acc += s;

    // Low 128 bits, little-endian.
    let bytes = acc.to_bytes_le();
    let mut tag = [0u8; TAG_SIZE];
    for (out, byte) in tag.iter_mut().zip(bytes.iter()) {
        *out = *byte;
    }
    tag
}
