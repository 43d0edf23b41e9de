//! Byte-level utilities shared by the algorithm implementations.
//!
//! Everything here operates on plain byte slices: constant-time
//! comparison, in-place XOR, big-endian counter arithmetic, secure random
//! fill, and a zeroize-on-drop wrapper for transient key material.

use std::fmt::{Debug, Formatter};
use std::ops::Deref;

use rand::TryRng;
use rand::rngs::SysRng;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Compares two byte slices in constant time.
///
/// The length check itself is not constant time; every comparison in this
/// crate is between fixed-length values (tags, digests, keys), so only the
/// content comparison needs to resist timing analysis.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// XORs `src` into `dst` element-wise, over the shorter of the two
/// lengths.
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    dst.iter_mut().zip(src).for_each(|(d, s)| *d ^= s);
}

/// Adds `n` into a big-endian integer stored in `bytes`, in place.
///
/// The value wraps at the width of the array, which is exactly the
/// behavior a block counter needs.
pub fn add_be(bytes: &mut [u8], n: u64) {
    let mut carry = n as u128;
    for byte in bytes.iter_mut().rev() {
        if carry == 0 {
            break;
        }
        let sum = u128::from(*byte) + (carry & 0xff);
        *byte = sum as u8;
        carry = (carry >> 8) + (sum >> 8);
    }
}

/// Increments the low 32 bits of a 16-byte counter block, big-endian.
///
/// This is the `inc32` function of NIST SP 800-38D: the high 96 bits are
/// never touched, and the low word wraps modulo 2^32.
pub fn inc32_be(block: &mut [u8; 16]) {
    let mut word = u32::from_be_bytes([block[12], block[13], block[14], block[15]]);
    word = word.wrapping_add(1);
    block[12..16].copy_from_slice(&word.to_be_bytes());
}

/// Fills `dest` with cryptographically secure random bytes from the OS.
pub fn fill_random(dest: &mut [u8]) {
    SysRng
        .try_fill_bytes(dest)
        .expect("failed to get secure randomness from OS");
}

/// Generates an array of N cryptographically secure random bytes.
#[must_use]
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    fill_random(&mut bytes);
    bytes
}

/// A byte buffer that zeroizes its contents on drop.
///
/// Used for intermediate key material (expanded keys, one-time MAC keys,
/// derived subkeys) that must not linger in memory after use. `Debug`
/// never prints the contents.
#[derive(Clone, Default)]
pub struct SensitiveBytes {
    data: Vec<u8>,
}

impl SensitiveBytes {
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn from_slice(data: &[u8]) -> Self {
        Self { data: data.to_vec() }
    }

    #[must_use]
    pub fn expose(&self) -> &[u8] {
        &self.data
    }
}

impl Deref for SensitiveBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl Drop for SensitiveBytes {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

impl Debug for SensitiveBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}
