//! Key agreement and digital signatures.
//!
//! Two dispatch traits bind the curve implementations: [`KeyExchange`]
//! for X25519 and NIST ECDH, [`Signature`] for Ed25519 and ECDSA. Group
//! arithmetic runs on `num-bigint`; none of it is constant-time, which
//! the crate documents as an accepted trade-off.

pub(crate) mod curve25519;
mod ecdh;
mod ecdsa;
mod ed25519;
pub(crate) mod nist;
mod x25519;

pub use ecdh::Ecdh;
pub use ecdsa::Ecdsa;
pub use ed25519::Ed25519;
pub use x25519::X25519;

use crate::error::Result;
use crate::secret::SecretKey;
use crate::types::{AlgorithmId, KeyPair, KeyPairType, PublicKey};

/// A Diffie-Hellman style key-agreement algorithm.
pub trait KeyExchange: Send + Sync {
    /// The bridge identifier of this algorithm.
    fn algorithm(&self) -> AlgorithmId;

    /// The key-pair geometry this algorithm works with.
    fn key_pair_type(&self) -> KeyPairType;

    /// Generates a fresh key pair from the algorithm's random source.
    fn new_key_pair(&self) -> Result<KeyPair>;

    /// Rebuilds a key pair from private-key bytes; the public half is
    /// re-derived.
    fn key_pair_from_seed(&self, seed: &[u8]) -> Result<KeyPair>;

    /// Computes the shared secret with a remote public key.
    fn shared_secret_key(&self, key_pair: &KeyPair, remote_public_key: &PublicKey) -> Result<SecretKey>;
}

/// A digital-signature algorithm.
pub trait Signature: Send + Sync {
    /// The bridge identifier of this algorithm.
    fn algorithm(&self) -> AlgorithmId;

    /// The key-pair geometry this algorithm works with.
    fn key_pair_type(&self) -> KeyPairType;

    /// Generates a fresh key pair from the algorithm's random source.
    fn new_key_pair(&self) -> Result<KeyPair>;

    /// Rebuilds a key pair from seed/private bytes; the public half is
    /// re-derived.
    fn key_pair_from_seed(&self, seed: &[u8]) -> Result<KeyPair>;

    /// Signs a message.
    fn sign(&self, message: &[u8], key_pair: &KeyPair) -> Result<Vec<u8>>;

    /// Verifies a signature.
    ///
    /// Returns `Ok(false)` for any non-matching or malformed signature
    /// or public key; errors are reserved for parameter-shape problems
    /// on the caller's side of the contract.
    fn verify(&self, signature: &[u8], message: &[u8], public_key: &PublicKey) -> Result<bool>;
}
