//! ECDSA over the NIST curves, with the digest chosen at construction.

use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::ecc::nist::{CurveParams, P256, P384, P521};
use crate::ecc::{Signature, ecdh};
use crate::error::Result;
use crate::hash::HashAlgorithm;
use crate::random::SecureRandom;
use crate::types::{AlgorithmId, KeyPair, KeyPairType, PublicKey};

/// ECDSA with curve and hash fixed at construction.
///
/// Signatures are fixed-width `r || s`, each coordinate big-endian and
/// padded to the curve byte length.
pub struct Ecdsa {
    curve: &'static CurveParams,
    algorithm: AlgorithmId,
    hash: Arc<dyn HashAlgorithm>,
    random: SecureRandom,
}

impl Ecdsa {
    #[must_use]
    pub fn p256(hash: Arc<dyn HashAlgorithm>) -> Self {
        Self::from_parts(&P256, AlgorithmId::EcdsaP256, hash)
    }

    #[must_use]
    pub fn p384(hash: Arc<dyn HashAlgorithm>) -> Self {
        Self::from_parts(&P384, AlgorithmId::EcdsaP384, hash)
    }

    #[must_use]
    pub fn p521(hash: Arc<dyn HashAlgorithm>) -> Self {
        Self::from_parts(&P521, AlgorithmId::EcdsaP521, hash)
    }

    fn from_parts(curve: &'static CurveParams, algorithm: AlgorithmId, hash: Arc<dyn HashAlgorithm>) -> Self {
        Self { curve, algorithm, hash, random: SecureRandom::default() }
    }

    /// Replaces the random source used for keys and per-signature
    /// nonces.
    #[must_use]
    pub fn with_random(mut self, random: SecureRandom) -> Self {
        self.random = random;
        self
    }

    /// `e`: the digest as an integer, truncated to the order's bit
    /// length.
    fn message_scalar(&self, message: &[u8]) -> BigUint {
        let digest = self.hash.hash(message);
        let mut e = BigUint::from_bytes_be(digest.as_bytes());
        let digest_bits = (digest.len() * 8) as u64;
        let order_bits = self.curve.n.bits();
        if digest_bits > order_bits {
            e >>= digest_bits - order_bits;
        }
        e
    }

    fn scalar_inverse(&self, value: &BigUint) -> BigUint {
        // n is prime, so Fermat gives the inverse.
        let exponent = &self.curve.n - BigUint::from(2u8);
        value.modpow(&exponent, &self.curve.n)
    }
}

impl Signature for Ecdsa {
    fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    fn key_pair_type(&self) -> KeyPairType {
        self.curve.key_pair_type
    }

    fn new_key_pair(&self) -> Result<KeyPair> {
        let d = ecdh::random_scalar(self.curve, &self.random);
        ecdh::build_key_pair(self.curve, &d)
    }

    fn key_pair_from_seed(&self, seed: &[u8]) -> Result<KeyPair> {
        let d = ecdh::decode_scalar(self.curve, seed)?;
        ecdh::build_key_pair(self.curve, &d)
    }

    fn sign(&self, message: &[u8], key_pair: &KeyPair) -> Result<Vec<u8>> {
        let d_bytes = key_pair.private_key().extract_exact(self.curve.byte_length)?;
        let d = ecdh::decode_scalar(self.curve, &d_bytes)?;
        let e = self.message_scalar(message);

        loop {
            let k = ecdh::random_scalar(self.curve, &self.random);
            let point = self.curve.scalar_mul(&k, &self.curve.generator());
            let Some((x1, _)) = point else { continue };

            let r = x1 % &self.curve.n;
            if r.is_zero() {
                continue;
            }

            let s = self.scalar_inverse(&k) * (&e + &r * &d) % &self.curve.n;
            if s.is_zero() {
                continue;
            }

            let mut signature = self.curve.encode_coordinate(&r);
            signature.extend_from_slice(&self.curve.encode_coordinate(&s));
            return Ok(signature);
        }
    }

    fn verify(&self, signature: &[u8], message: &[u8], public_key: &PublicKey) -> Result<bool> {
        if signature.len() != 2 * self.curve.byte_length {
            return Ok(false);
        }
        let (r_bytes, s_bytes) = signature.split_at(self.curve.byte_length);
        let r = BigUint::from_bytes_be(r_bytes);
        let s = BigUint::from_bytes_be(s_bytes);
        if r < BigUint::one() || r >= self.curve.n || s < BigUint::one() || s >= self.curve.n {
            return Ok(false);
        }

        let Ok(q) = ecdh::decode_public(self.curve, public_key) else {
            return Ok(false);
        };

        let e = self.message_scalar(message);
        let w = self.scalar_inverse(&s);
        let u1 = &e * &w % &self.curve.n;
        let u2 = &r * &w % &self.curve.n;

        let point = self.curve.add(&self.curve.scalar_mul(&u1, &self.curve.generator()), &self.curve.scalar_mul(&u2, &Some(q)));
        let Some((x, _)) = point else {
            return Ok(false);
        };
        Ok(x % &self.curve.n == r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Sha256, Sha384, Sha512};

    #[test]
    fn test_sign_verify_roundtrip_all_curves() {
        let algorithms: Vec<Ecdsa> =
            vec![Ecdsa::p256(Arc::new(Sha256)), Ecdsa::p384(Arc::new(Sha384)), Ecdsa::p521(Arc::new(Sha512))];
        for ecdsa in &algorithms {
            let pair = ecdsa.new_key_pair().unwrap();
            let signature = ecdsa.sign(b"signed payload", &pair).unwrap();
            assert_eq!(signature.len(), 2 * pair.key_pair_type().private_key_length());
            assert!(ecdsa.verify(&signature, b"signed payload", pair.public_key()).unwrap());
        }
    }

    #[test]
    fn test_tampering_fails_verification() {
        let ecdsa = Ecdsa::p256(Arc::new(Sha256));
        let pair = ecdsa.new_key_pair().unwrap();
        let signature = ecdsa.sign(b"message", &pair).unwrap();

        assert!(!ecdsa.verify(&signature, b"massage", pair.public_key()).unwrap());

        let mut bad = signature.clone();
        bad[10] ^= 1;
        assert!(!ecdsa.verify(&bad, b"message", pair.public_key()).unwrap());

        let other = ecdsa.new_key_pair().unwrap();
        assert!(!ecdsa.verify(&signature, b"message", other.public_key()).unwrap());
    }

    #[test]
    fn test_out_of_range_components_are_rejected() {
        let ecdsa = Ecdsa::p256(Arc::new(Sha256));
        let pair = ecdsa.new_key_pair().unwrap();
        // r = 0
        let zero_r = vec![0u8; 64];
        assert!(!ecdsa.verify(&zero_r, b"message", pair.public_key()).unwrap());
        // wrong length
        assert!(!ecdsa.verify(&[0u8; 63], b"message", pair.public_key()).unwrap());
    }

    #[test]
    fn test_signatures_are_randomized() {
        let ecdsa = Ecdsa::p256(Arc::new(Sha256));
        let pair = ecdsa.new_key_pair().unwrap();
        let a = ecdsa.sign(b"same message", &pair).unwrap();
        let b = ecdsa.sign(b"same message", &pair).unwrap();
        // Fresh k per signature
        assert_ne!(a, b);
        assert!(ecdsa.verify(&a, b"same message", pair.public_key()).unwrap());
        assert!(ecdsa.verify(&b, b"same message", pair.public_key()).unwrap());
    }

    #[test]
    fn test_seeded_random_gives_deterministic_signature() {
        let pair = Ecdsa::p256(Arc::new(Sha256)).new_key_pair().unwrap();
        let seed_bytes = pair.private_key().extract().unwrap();

        let a = Ecdsa::p256(Arc::new(Sha256)).with_random(SecureRandom::seeded([4; 32]));
        let b = Ecdsa::p256(Arc::new(Sha256)).with_random(SecureRandom::seeded([4; 32]));
        let pair_a = a.key_pair_from_seed(&seed_bytes).unwrap();
        let pair_b = b.key_pair_from_seed(&seed_bytes).unwrap();
        assert_eq!(a.sign(b"msg", &pair_a).unwrap(), b.sign(b"msg", &pair_b).unwrap());
    }

    #[test]
    fn test_sha512_digest_truncation_on_p256() {
        // A 512-bit digest must truncate to the 256-bit order cleanly.
        let ecdsa = Ecdsa::p256(Arc::new(Sha512));
        let pair = ecdsa.new_key_pair().unwrap();
        let signature = ecdsa.sign(b"long digest", &pair).unwrap();
        assert!(ecdsa.verify(&signature, b"long digest", pair.public_key()).unwrap());
    }
}
