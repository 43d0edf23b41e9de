//! Low-level cryptographic primitives.
//!
//! Everything in this module is a synchronous pure function (or a small
//! stateful accumulator) over byte buffers: the AES block cipher, the
//! ChaCha20 permutation, the Poly1305 one-shot MAC and the GHASH field
//! multiplier. The mode engines in [`crate::cipher`] compose these into
//! full encryption schemes; nothing here should be used directly unless
//! you are building a new mode.

pub mod aes;
pub mod chacha;
pub mod ghash;
pub mod poly1305;
