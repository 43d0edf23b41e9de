//! HKDF extract-and-expand (RFC 5869) over any HMAC.

use crate::error::{CryptoError, Result};
use crate::kdf::Kdf;
use crate::mac::Hmac;
use crate::secret::SecretKey;
use crate::types::AlgorithmId;

/// HKDF with its HMAC and output length fixed at construction.
#[derive(Clone)]
pub struct Hkdf {
    hmac: Hmac,
    output_length: usize,
}

impl std::fmt::Debug for Hkdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hkdf")
            .field("output_length", &self.output_length)
            .finish_non_exhaustive()
    }
}

impl Hkdf {
    /// # Errors
    /// [`CryptoError::OutputTooLong`] above `255 * hash_length`, or
    /// [`CryptoError::InvalidParameter`] for zero.
    pub fn new(hmac: Hmac, output_length: usize) -> Result<Self> {
        let max = 255 * hmac.hash_algorithm().hash_length();
        if output_length > max {
            return Err(CryptoError::OutputTooLong { requested: output_length, max });
        }
        if output_length == 0 {
            return Err(CryptoError::InvalidParameter("HKDF output length must be at least 1"));
        }
        Ok(Self { hmac, output_length })
    }

    /// Derives with an application-specific `info` string.
    ///
    /// An empty salt falls back to `hash_length` zero bytes, per the RFC.
    pub fn derive_with_info(&self, input_key_material: &[u8], salt: &[u8], info: &[u8]) -> Result<SecretKey> {
        let hash_length = self.hmac.hash_algorithm().hash_length();

        // Extract
        let zero_salt = vec![0u8; hash_length];
        let effective_salt = if salt.is_empty() { zero_salt.as_slice() } else { salt };
        let pseudo_random_key = self.hmac.compute_parts(effective_salt, &[input_key_material]);

        // Expand: T_i = HMAC(PRK, T_{i-1} || info || i)
        let mut output = Vec::with_capacity(self.output_length);
        let mut previous: Vec<u8> = Vec::new();
        let mut counter = 1u8;
        while output.len() < self.output_length {
            previous = self.hmac.compute_parts(&pseudo_random_key, &[previous.as_slice(), info, &[counter]]);
            output.extend_from_slice(&previous);
            counter = counter.wrapping_add(1);
        }
        output.truncate(self.output_length);
        Ok(SecretKey::new(output))
    }
}

impl Kdf for Hkdf {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Hkdf
    }

    fn output_length(&self) -> usize {
        self.output_length
    }

    fn derive_key(&self, secret: &[u8], salt: &[u8]) -> Result<SecretKey> {
        self.derive_with_info(secret, salt, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc5869_case_1() {
        let hkdf = Hkdf::new(Hmac::sha256(), 42).unwrap();
        let ikm = vec![0x0b; 22];
        let salt = hex::decode("000102030405060708090a0b0c").unwrap();
        let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();
        let okm = hkdf.derive_with_info(&ikm, &salt, &info).unwrap();
        assert_eq!(
            hex::encode(okm.extract().unwrap().as_slice()),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
        );
    }

    #[test]
    fn test_rfc5869_case_3_empty_salt_and_info() {
        let hkdf = Hkdf::new(Hmac::sha256(), 42).unwrap();
        let ikm = vec![0x0b; 22];
        let okm = hkdf.derive_with_info(&ikm, &[], &[]).unwrap();
        assert_eq!(
            hex::encode(okm.extract().unwrap().as_slice()),
            "8da4e775a563c18f715f802a063c5a31b8a11f5c5ee1879ec3454e5f3c738d2d9d201395faa4b61a96c8"
        );
    }

    #[test]
    fn test_output_length_cap() {
        assert!(Hkdf::new(Hmac::sha256(), 255 * 32).is_ok());
        let err = Hkdf::new(Hmac::sha256(), 255 * 32 + 1).unwrap_err();
        assert_eq!(err, CryptoError::OutputTooLong { requested: 255 * 32 + 1, max: 255 * 32 });
    }

    #[test]
    fn test_multi_block_expansion() {
        // 100 bytes needs four SHA-256 blocks of expansion.
        let hkdf = Hkdf::new(Hmac::sha256(), 100).unwrap();
        let key = hkdf.derive_key(b"input", b"salt").unwrap();
        assert_eq!(key.length(), 100);
    }
}
