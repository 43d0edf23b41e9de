//! X25519 key agreement (RFC 7748).

use crate::ecc::{KeyExchange, curve25519};
use crate::error::{CryptoError, Result};
use crate::random::SecureRandom;
use crate::secret::SecretKey;
use crate::types::{AlgorithmId, KeyPair, KeyPairType, PublicKey};

/// The u-coordinate of the X25519 base point.
const BASE_POINT: [u8; 32] = {
    let mut u = [0u8; 32];
    u[0] = 9;
    u
};

/// X25519 over Curve25519.
///
/// Private keys are 32 random bytes, clamped at use. The shared secret
/// is rejected when it comes out all-zero (the contributory check), so a
/// malicious peer cannot force a known key with a small-order point.
#[derive(Default)]
pub struct X25519 {
    random: SecureRandom,
}

impl X25519 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the random source used for key generation.
    #[must_use]
    pub fn with_random(mut self, random: SecureRandom) -> Self {
        self.random = random;
        self
    }

    fn build_key_pair(&self, private: [u8; 32]) -> Result<KeyPair> {
        let public = curve25519::x25519(&private, &BASE_POINT);
        KeyPair::new(KeyPairType::X25519, SecretKey::new(private.to_vec()), PublicKey::new(KeyPairType::X25519, public.to_vec())?)
    }
}

impl KeyExchange for X25519 {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::X25519
    }

    fn key_pair_type(&self) -> KeyPairType {
        KeyPairType::X25519
    }

    fn new_key_pair(&self) -> Result<KeyPair> {
        let mut private = [0u8; 32];
        self.random.fill(&mut private);
        self.build_key_pair(private)
    }

    fn key_pair_from_seed(&self, seed: &[u8]) -> Result<KeyPair> {
        let private: [u8; 32] = seed.try_into().map_err(|_| CryptoError::InvalidKeyLength { expected: 32, actual: seed.len() })?;
        self.build_key_pair(private)
    }

    fn shared_secret_key(&self, key_pair: &KeyPair, remote_public_key: &PublicKey) -> Result<SecretKey> {
        if remote_public_key.key_pair_type() != KeyPairType::X25519 {
            return Err(CryptoError::InvalidParameter("remote public key is not an X25519 key"));
        }
        let private_bytes = key_pair.private_key().extract_exact(32)?;
        let private: [u8; 32] = private_bytes.as_slice().try_into().expect("length checked");
        let remote: [u8; 32] = remote_public_key.as_bytes().try_into().expect("type-checked length");

        let shared = curve25519::x25519(&private, &remote);
        if shared == [0u8; 32] {
            return Err(CryptoError::WeakKey);
        }
        Ok(SecretKey::new(shared.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7748_alice_and_bob() {
        // RFC 7748 section 6.1
        let x25519 = X25519::new();
        let alice = x25519
            .key_pair_from_seed(&hex::decode("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a").unwrap())
            .unwrap();
        let bob = x25519
            .key_pair_from_seed(&hex::decode("5dab087e624a8a4b79e17f8b83800ee66f3bb1292618b6fd1c2f8b27ff88e0eb").unwrap())
            .unwrap();

        assert_eq!(hex::encode(alice.public_key().as_bytes()), "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a");
        assert_eq!(hex::encode(bob.public_key().as_bytes()), "de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f");

        let shared_a = x25519.shared_secret_key(&alice, bob.public_key()).unwrap();
        let shared_b = x25519.shared_secret_key(&bob, alice.public_key()).unwrap();
        assert_eq!(shared_a, shared_b);
        assert_eq!(
            hex::encode(shared_a.extract().unwrap().as_slice()),
            "4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742"
        );
    }

    #[test]
    fn test_commutativity_with_random_keys() {
        let x25519 = X25519::new();
        let a = x25519.new_key_pair().unwrap();
        let b = x25519.new_key_pair().unwrap();
        let shared_ab = x25519.shared_secret_key(&a, b.public_key()).unwrap();
        let shared_ba = x25519.shared_secret_key(&b, a.public_key()).unwrap();
        assert_eq!(shared_ab, shared_ba);
    }

    #[test]
    fn test_small_order_point_is_rejected() {
        let x25519 = X25519::new();
        let keys = x25519.new_key_pair().unwrap();
        // The all-zero u-coordinate is a small-order point; the ladder
        // returns zero and the contributory check fires.
        let zero_point = PublicKey::new(KeyPairType::X25519, vec![0u8; 32]).unwrap();
        assert_eq!(x25519.shared_secret_key(&keys, &zero_point).unwrap_err(), CryptoError::WeakKey);
    }

    #[test]
    fn test_seed_length_is_checked() {
        assert!(X25519::new().key_pair_from_seed(&[0u8; 31]).is_err());
    }

    #[test]
    fn test_deterministic_with_seeded_random() {
        let a = X25519::new().with_random(SecureRandom::seeded([1; 32])).new_key_pair().unwrap();
        let b = X25519::new().with_random(SecureRandom::seeded([1; 32])).new_key_pair().unwrap();
        assert_eq!(a.public_key(), b.public_key());
    }
}
