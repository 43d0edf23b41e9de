//! Ed25519 signatures (RFC 8032).
//!
//! The private key is the 32-byte seed; the expanded scalar and prefix
//! are re-derived from SHA-512 on demand, so key material at rest is
//! always just the seed.

use num_bigint::BigUint;

use crate::ecc::{Signature, curve25519};
use crate::ecc::curve25519::EdPoint;
use crate::error::{CryptoError, Result};
use crate::hash::{HashAlgorithm, Sha512};
use crate::random::SecureRandom;
use crate::secret::SecretKey;
use crate::types::{AlgorithmId, KeyPair, KeyPairType, PublicKey};

/// The expanded form of a seed: clamped scalar plus signing prefix.
struct ExpandedKey {
    scalar: BigUint,
    prefix: [u8; 32],
}

fn expand_seed(seed: &[u8; 32]) -> ExpandedKey {
    let digest = Sha512.hash(seed);
    let bytes = digest.as_bytes();

    let mut scalar_bytes: [u8; 32] = bytes[..32].try_into().expect("digest half");
    curve25519::clamp(&mut scalar_bytes);
    let scalar = BigUint::from_bytes_le(&scalar_bytes);

    let prefix: [u8; 32] = bytes[32..].try_into().expect("digest half");
    ExpandedKey { scalar, prefix }
}

/// Ed25519 with deterministic nonces per RFC 8032.
#[derive(Default)]
pub struct Ed25519 {
    random: SecureRandom,
}

impl Ed25519 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the random source used for seed generation.
    #[must_use]
    pub fn with_random(mut self, random: SecureRandom) -> Self {
        self.random = random;
        self
    }

    fn build_key_pair(&self, seed: [u8; 32]) -> Result<KeyPair> {
        let expanded = expand_seed(&seed);
        let public = EdPoint::base().scalar_mul(&expanded.scalar).encode();
        KeyPair::new(KeyPairType::Ed25519, SecretKey::new(seed.to_vec()), PublicKey::new(KeyPairType::Ed25519, public.to_vec())?)
    }
}

impl Signature for Ed25519 {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Ed25519
    }

    fn key_pair_type(&self) -> KeyPairType {
        KeyPairType::Ed25519
    }

    fn new_key_pair(&self) -> Result<KeyPair> {
        let mut seed = [0u8; 32];
        self.random.fill(&mut seed);
        self.build_key_pair(seed)
    }

    fn key_pair_from_seed(&self, seed: &[u8]) -> Result<KeyPair> {
        let seed: [u8; 32] = seed.try_into().map_err(|_| CryptoError::InvalidKeyLength { expected: 32, actual: seed.len() })?;
        self.build_key_pair(seed)
    }

    fn sign(&self, message: &[u8], key_pair: &KeyPair) -> Result<Vec<u8>> {
        let seed_bytes = key_pair.private_key().extract_exact(32)?;
        let seed: [u8; 32] = seed_bytes.as_slice().try_into().expect("length checked");
        let expanded = expand_seed(&seed);
        let public_bytes = key_pair.public_key().as_bytes();

        // r = SHA-512(prefix || M) mod l
        let mut context = Sha512.begin();
        context.update(&expanded.prefix);
        context.update(message);
        let r = curve25519::reduce_mod_l(context.finalize().as_bytes());

        let r_point = EdPoint::base().scalar_mul(&r).encode();

        // k = SHA-512(R || A || M) mod l
        let mut context = Sha512.begin();
        context.update(&r_point);
        context.update(public_bytes);
        context.update(message);
        let k = curve25519::reduce_mod_l(context.finalize().as_bytes());

        // S = (r + k * a) mod l
        let s = (r + k * &expanded.scalar) % &*curve25519::L;

        let mut signature = Vec::with_capacity(64);
        signature.extend_from_slice(&r_point);
        let s_bytes = s.to_bytes_le();
        signature.extend_from_slice(&s_bytes);
        signature.resize(64, 0);
        Ok(signature)
    }

    fn verify(&self, signature: &[u8], message: &[u8], public_key: &PublicKey) -> Result<bool> {
        if signature.len() != 64 || public_key.key_pair_type() != KeyPairType::Ed25519 {
            return Ok(false);
        }

        let r_bytes: [u8; 32] = signature[..32].try_into().expect("signature half");
        let s = BigUint::from_bytes_le(&signature[32..]);
        if s >= *curve25519::L {
            return Ok(false);
        }

        let public_bytes: [u8; 32] = public_key.as_bytes().try_into().expect("type-checked length");
        let (Some(r_point), Some(a_point)) = (EdPoint::decode(&r_bytes), EdPoint::decode(&public_bytes)) else {
            return Ok(false);
        };

        let mut context = Sha512.begin();
        context.update(&r_bytes);
        context.update(&public_bytes);
        context.update(message);
        let k = curve25519::reduce_mod_l(context.finalize().as_bytes());

        // Accept iff S * B == R + k * A
        let left = EdPoint::base().scalar_mul(&s);
        let right = r_point.add(&a_point.scalar_mul(&k));
        Ok(left.equals(&right))
    }
}
