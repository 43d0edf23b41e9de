//! Message authentication codes and their dispatch trait.
//!
//! [`MacAlgorithm`] is what the cipher layer programs against: CBC and
//! CTR pair with a caller-chosen MAC over the ciphertext, the AEAD modes
//! carry their own, and [`EmptyMac`] stands in when a cipher is used
//! unauthenticated. Verification is always constant-time and returns a
//! boolean; a mismatch is a result, not an error.

mod hmac;
mod poly1305;

pub use hmac::Hmac;
pub use poly1305::Poly1305Mac;

use crate::error::Result;
use crate::secret::SecretKey;
use crate::types::Mac;

/// A message authentication algorithm with fixed parameters.
pub trait MacAlgorithm: Send + Sync {
    /// Tag length in bytes.
    fn mac_length(&self) -> usize;

    /// Computes the tag of `message` under `key`.
    ///
    /// `nonce` and `aad` are accepted so that nonce-bound MACs slot into
    /// the same surface; algorithms that do not use them ignore them.
    fn compute(&self, message: &[u8], key: &SecretKey, nonce: &[u8], aad: &[u8]) -> Result<Mac>;

    /// Verifies a tag in constant time.
    ///
    /// Returns `Ok(false)` on mismatch; errors are reserved for parameter
    /// problems (wrong key length, destroyed key).
    fn verify(&self, expected: &Mac, message: &[u8], key: &SecretKey, nonce: &[u8], aad: &[u8]) -> Result<bool> {
        let computed = self.compute(message, key, nonce, aad)?;
        Ok(*expected == computed)
    }
}

/// The zero-length MAC paired with unauthenticated cipher configurations.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyMac;

impl MacAlgorithm for EmptyMac {
    fn mac_length(&self) -> usize {
        0
    }

    fn compute(&self, _message: &[u8], _key: &SecretKey, _nonce: &[u8], _aad: &[u8]) -> Result<Mac> {
        Ok(Mac::EMPTY)
    }

    fn verify(&self, expected: &Mac, _message: &[u8], _key: &SecretKey, _nonce: &[u8], _aad: &[u8]) -> Result<bool> {
        Ok(expected.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mac_accepts_only_empty_tags() {
        let key = SecretKey::from_slice(&[0u8; 16]);
        let mac = EmptyMac.compute(b"anything", &key, &[], &[]).unwrap();
        assert!(mac.is_empty());
        assert!(EmptyMac.verify(&Mac::EMPTY, b"anything", &key, &[], &[]).unwrap());
        assert!(!EmptyMac.verify(&Mac::from_slice(&[1]), b"anything", &key, &[], &[]).unwrap());
    }
}
