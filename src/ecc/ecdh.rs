//! ECDH over the NIST curves.

use num_bigint::BigUint;
use num_traits::One;

use crate::ecc::nist::{CurveParams, P256, P384, P521};
use crate::ecc::KeyExchange;
use crate::error::{CryptoError, Result};
use crate::random::SecureRandom;
use crate::secret::SecretKey;
use crate::types::{AlgorithmId, KeyPair, KeyPairType, PublicKey};

/// ECDH with the curve chosen at construction.
///
/// The shared secret is the affine x-coordinate of `d_A * Q_B`,
/// serialized big-endian to the curve byte length.
pub struct Ecdh {
    curve: &'static CurveParams,
    algorithm: AlgorithmId,
    random: SecureRandom,
}

impl Ecdh {
    #[must_use]
    pub fn p256() -> Self {
        Self::from_parts(&P256, AlgorithmId::EcdhP256)
    }

    #[must_use]
    pub fn p384() -> Self {
        Self::from_parts(&P384, AlgorithmId::EcdhP384)
    }

    #[must_use]
    pub fn p521() -> Self {
        Self::from_parts(&P521, AlgorithmId::EcdhP521)
    }

    fn from_parts(curve: &'static CurveParams, algorithm: AlgorithmId) -> Self {
        Self { curve, algorithm, random: SecureRandom::default() }
    }

    /// Replaces the random source used for key generation.
    #[must_use]
    pub fn with_random(mut self, random: SecureRandom) -> Self {
        self.random = random;
        self
    }
}

/// Draws a uniform scalar in `[1, n - 1]` by rejection sampling.
pub(crate) fn random_scalar(curve: &CurveParams, random: &SecureRandom) -> BigUint {
    let excess_bits = (curve.byte_length * 8) as u64 - curve.n.bits();
    loop {
        let mut bytes = random.bytes(curve.byte_length);
        if excess_bits > 0 {
            bytes[0] &= 0xff >> excess_bits;
        }
        let candidate = BigUint::from_bytes_be(&bytes);
        if candidate >= BigUint::one() && candidate < curve.n {
            return candidate;
        }
    }
}

/// Builds the `x || y` public key for a private scalar.
pub(crate) fn derive_public(curve: &'static CurveParams, d: &BigUint) -> Result<PublicKey> {
    let point = curve.scalar_mul(d, &curve.generator());
    let (x, y) = point.ok_or(CryptoError::InvalidParameter("private scalar maps to infinity"))?;
    let mut bytes = curve.encode_coordinate(&x);
    bytes.extend_from_slice(&curve.encode_coordinate(&y));
    PublicKey::new(curve.key_pair_type, bytes)
}

/// Builds a key pair from a validated private scalar.
pub(crate) fn build_key_pair(curve: &'static CurveParams, d: &BigUint) -> Result<KeyPair> {
    let public = derive_public(curve, d)?;
    KeyPair::new(curve.key_pair_type, SecretKey::new(curve.encode_coordinate(d)), public)
}

/// Decodes and validates a remote public key against the curve.
pub(crate) fn decode_public(curve: &CurveParams, public_key: &PublicKey) -> Result<(BigUint, BigUint)> {
    if public_key.key_pair_type() != curve.key_pair_type {
        return Err(CryptoError::InvalidParameter("public key belongs to a different curve"));
    }
    let x = BigUint::from_bytes_be(public_key.x());
    let y = BigUint::from_bytes_be(public_key.y());
    if !curve.contains(&x, &y) {
        return Err(CryptoError::PointNotOnCurve);
    }
    Ok((x, y))
}

/// Parses private-key bytes as a scalar in `[1, n - 1]`.
pub(crate) fn decode_scalar(curve: &CurveParams, bytes: &[u8]) -> Result<BigUint> {
    if bytes.len() != curve.byte_length {
        return Err(CryptoError::InvalidKeyLength { expected: curve.byte_length, actual: bytes.len() });
    }
    let d = BigUint::from_bytes_be(bytes);
    if d < BigUint::one() || d >= curve.n {
        return Err(CryptoError::InvalidParameter("private scalar out of range"));
    }
    Ok(d)
}

impl KeyExchange for Ecdh {
    fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    fn key_pair_type(&self) -> KeyPairType {
        self.curve.key_pair_type
    }

    fn new_key_pair(&self) -> Result<KeyPair> {
        let d = random_scalar(self.curve, &self.random);
        build_key_pair(self.curve, &d)
    }

    fn key_pair_from_seed(&self, seed: &[u8]) -> Result<KeyPair> {
        let d = decode_scalar(self.curve, seed)?;
        build_key_pair(self.curve, &d)
    }

    fn shared_secret_key(&self, key_pair: &KeyPair, remote_public_key: &PublicKey) -> Result<SecretKey> {
        let d_bytes = key_pair.private_key().extract_exact(self.curve.byte_length)?;
        let d = decode_scalar(self.curve, &d_bytes)?;
        let remote = decode_public(self.curve, remote_public_key)?;

        let shared = self.curve.scalar_mul(&d, &Some(remote));
        let (x, _) = shared.ok_or(CryptoError::WeakKey)?;
        Ok(SecretKey::new(self.curve.encode_coordinate(&x)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agreement_on_every_curve() {
        for ecdh in [Ecdh::p256(), Ecdh::p384(), Ecdh::p521()] {
            let alice = ecdh.new_key_pair().unwrap();
            let bob = ecdh.new_key_pair().unwrap();
            let shared_a = ecdh.shared_secret_key(&alice, bob.public_key()).unwrap();
            let shared_b = ecdh.shared_secret_key(&bob, alice.public_key()).unwrap();
            assert_eq!(shared_a, shared_b);
            assert_eq!(shared_a.length(), ecdh.key_pair_type().private_key_length());
        }
    }

    #[test]
    fn test_d_equals_one_gives_generator() {
        let mut seed = vec![0u8; 32];
        seed[31] = 1;
        let pair = Ecdh::p256().key_pair_from_seed(&seed).unwrap();
        assert_eq!(hex::encode(pair.public_key().x()), "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296");
        assert_eq!(hex::encode(pair.public_key().y()), "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5");
    }

    #[test]
    fn test_off_curve_public_key_is_rejected() {
        let ecdh = Ecdh::p256();
        let keys = ecdh.new_key_pair().unwrap();
        let mut bytes = keys.public_key().as_bytes().to_vec();
        bytes[40] ^= 1;
        let forged = PublicKey::new(KeyPairType::P256, bytes).unwrap();
        assert_eq!(ecdh.shared_secret_key(&keys, &forged).unwrap_err(), CryptoError::PointNotOnCurve);
    }

    #[test]
    fn test_zero_scalar_is_rejected() {
        assert!(Ecdh::p256().key_pair_from_seed(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_cross_curve_key_is_rejected() {
        let p256 = Ecdh::p256();
        let p384 = Ecdh::p384();
        let a = p256.new_key_pair().unwrap();
        let b = p384.new_key_pair().unwrap();
        assert!(p256.shared_secret_key(&a, b.public_key()).is_err());
    }

    #[test]
    fn test_deterministic_with_seeded_random() {
        let a = Ecdh::p521().with_random(SecureRandom::seeded([9; 32])).new_key_pair().unwrap();
        let b = Ecdh::p521().with_random(SecureRandom::seeded([9; 32])).new_key_pair().unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }
}
