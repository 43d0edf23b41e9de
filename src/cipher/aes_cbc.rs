//! AES-CBC with PKCS#7 (or zero) padding and an external MAC.
//!
//! CBC provides no authentication of its own: the configured
//! [`MacAlgorithm`] is computed over the ciphertext under the same secret
//! key, keeping the encrypt-then-MAC shape. Associated data is rejected,
//! and the IV is exactly one block.

use std::sync::Arc;

use crate::bytes;
use crate::cipher::{Cipher, reject_key_stream_index, resolve_nonce};
use crate::config::AES_BLOCK_SIZE;
use crate::error::{CryptoError, Result};
use crate::mac::MacAlgorithm;
use crate::padding::PaddingAlgorithm;
use crate::primitive::aes::AesKey;
use crate::random::SecureRandom;
use crate::secret::SecretKey;
use crate::types::{AlgorithmId, SecretBox};

/// AES-CBC with a caller-chosen key size, padding and MAC.
pub struct AesCbc {
    secret_key_length: usize,
    padding: PaddingAlgorithm,
    mac: Arc<dyn MacAlgorithm>,
    random: SecureRandom,
}

impl AesCbc {
    /// Creates the cipher for a 16, 24 or 32 byte key, PKCS#7 padding.
    ///
    /// # Errors
    /// [`CryptoError::InvalidKeyLength`] for other key sizes.
    pub fn new(secret_key_length: usize, mac: Arc<dyn MacAlgorithm>) -> Result<Self> {
        if !matches!(secret_key_length, 16 | 24 | 32) {
            return Err(CryptoError::InvalidKeyLength { expected: 32, actual: secret_key_length });
        }
        Ok(Self { secret_key_length, padding: PaddingAlgorithm::Pkcs7, mac, random: SecureRandom::default() })
    }

    /// Selects the padding scheme (default PKCS#7).
    #[must_use]
    pub fn with_padding(mut self, padding: PaddingAlgorithm) -> Self {
        self.padding = padding;
        self
    }

    /// Replaces the random source used for generated nonces and keys.
    #[must_use]
    pub fn with_random(mut self, random: SecureRandom) -> Self {
        self.random = random;
        self
    }

    fn check_aad(aad: &[u8]) -> Result<()> {
        if !aad.is_empty() {
            return Err(CryptoError::AadUnsupported);
        }
        Ok(())
    }
}

impl Cipher for AesCbc {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::AesCbc
    }

    fn secret_key_length(&self) -> usize {
        self.secret_key_length
    }

    fn nonce_length(&self) -> usize {
        AES_BLOCK_SIZE
    }

    fn mac_length(&self) -> usize {
        self.mac.mac_length()
    }

    fn mac_algorithm(&self) -> Option<&dyn MacAlgorithm> {
        Some(self.mac.as_ref())
    }

    fn cipher_text_length(&self, clear_text_length: usize) -> usize {
        clear_text_length + self.padding.compute_length(AES_BLOCK_SIZE, clear_text_length)
    }

    fn random(&self) -> &SecureRandom {
        &self.random
    }

    fn encrypt_at(&self, clear_text: &[u8], key: &SecretKey, nonce: Option<&[u8]>, aad: &[u8], key_stream_index: u64) -> Result<SecretBox> {
        reject_key_stream_index(key_stream_index)?;
        Self::check_aad(aad)?;
        let nonce = resolve_nonce(self, nonce)?;
        let key_bytes = key.extract_exact(self.secret_key_length)?;
        let aes = AesKey::new(&key_bytes)?;

        let padded = self.padding.pad(clear_text, AES_BLOCK_SIZE);
        let mut cipher_text = Vec::with_capacity(padded.len());
        let mut previous: [u8; AES_BLOCK_SIZE] = nonce.as_slice().try_into().expect("IV is one block");
        for chunk in padded.chunks_exact(AES_BLOCK_SIZE) {
            let mut block: [u8; AES_BLOCK_SIZE] = chunk.try_into().expect("block-aligned");
            bytes::xor_in_place(&mut block, &previous);
            aes.encrypt_block(&mut block);
            cipher_text.extend_from_slice(&block);
            previous = block;
        }

        let mac = self.mac.compute(&cipher_text, key, &nonce, &[])?;
        Ok(SecretBox::new(cipher_text, nonce, mac))
    }

    fn decrypt_at(&self, secret_box: &SecretBox, key: &SecretKey, aad: &[u8], key_stream_index: u64) -> Result<Vec<u8>> {
        reject_key_stream_index(key_stream_index)?;
        Self::check_aad(aad)?;
        let nonce = secret_box.nonce();
        if nonce.len() != AES_BLOCK_SIZE {
            return Err(CryptoError::InvalidNonceLength { expected: AES_BLOCK_SIZE, actual: nonce.len() });
        }
        let cipher_text = secret_box.cipher_text();

        // Authenticate before padding or plaintext are even looked at, so
        // truncation cannot be told apart from tampering.
        if !self.mac.verify(secret_box.mac(), cipher_text, key, nonce, &[])? {
            return Err(CryptoError::AuthFailure);
        }

        if cipher_text.is_empty() && self.padding == PaddingAlgorithm::Zero {
            return Ok(Vec::new());
        }
        if cipher_text.is_empty() || cipher_text.len() % AES_BLOCK_SIZE != 0 {
            return Err(CryptoError::BadPadding);
        }

        let key_bytes = key.extract_exact(self.secret_key_length)?;
        let aes = AesKey::new(&key_bytes)?;

        let mut clear_text = Vec::with_capacity(cipher_text.len());
        let mut previous: [u8; AES_BLOCK_SIZE] = nonce.try_into().expect("IV is one block");
        for chunk in cipher_text.chunks_exact(AES_BLOCK_SIZE) {
            let encrypted: [u8; AES_BLOCK_SIZE] = chunk.try_into().expect("block-aligned");
            let mut block = encrypted;
            aes.decrypt_block(&mut block);
            bytes::xor_in_place(&mut block, &previous);
            clear_text.extend_from_slice(&block);
            previous = encrypted;
        }

        self.padding.unpad(&clear_text, AES_BLOCK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::{EmptyMac, Hmac};

    fn cipher() -> AesCbc {
        AesCbc::new(32, Arc::new(Hmac::sha256())).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let cbc = cipher();
        let key = cbc.new_secret_key();
        let sealed = cbc.encrypt(b"Hello, World!", &key, None, b"").unwrap();
        assert_eq!(sealed.cipher_text().len(), 16);
        assert_eq!(sealed.mac().len(), 32);
        assert_eq!(cbc.decrypt(&sealed, &key, b"").unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_single_zero_byte_roundtrip() {
        // Zero key, zero IV, plaintext [0x00]: one padded block out.
        let cbc = AesCbc::new(16, Arc::new(EmptyMac)).unwrap();
        let key = SecretKey::new(vec![0u8; 16]);
        let sealed = cbc.encrypt(&[0u8], &key, Some(&[0u8; 16]), b"").unwrap();
        assert_eq!(sealed.cipher_text().len(), 16);
        assert_eq!(cbc.decrypt(&sealed, &key, b"").unwrap(), vec![0u8]);
    }

    #[test]
    fn test_known_ciphertext_length() {
        let cbc = cipher();
        assert_eq!(cbc.cipher_text_length(0), 16);
        assert_eq!(cbc.cipher_text_length(15), 16);
        assert_eq!(cbc.cipher_text_length(16), 32);
        assert_eq!(cbc.cipher_text_length(17), 32);
    }

    #[test]
    fn test_rejects_aad() {
        let cbc = cipher();
        let key = cbc.new_secret_key();
        assert_eq!(cbc.encrypt(b"x", &key, None, b"aad").unwrap_err(), CryptoError::AadUnsupported);
    }

    #[test]
    fn test_rejects_bad_nonce_length() {
        let cbc = cipher();
        let key = cbc.new_secret_key();
        let err = cbc.encrypt(b"x", &key, Some(&[0u8; 12]), b"").unwrap_err();
        assert_eq!(err, CryptoError::InvalidNonceLength { expected: 16, actual: 12 });
    }

    #[test]
    fn test_rejects_key_stream_index() {
        let cbc = cipher();
        let key = cbc.new_secret_key();
        assert_eq!(cbc.encrypt_at(b"x", &key, None, b"", 16).unwrap_err(), CryptoError::KeyStreamIndexUnsupported);
    }

    #[test]
    fn test_tampered_ciphertext_fails_auth() {
        let cbc = cipher();
        let key = cbc.new_secret_key();
        let sealed = cbc.encrypt(b"payload", &key, None, b"").unwrap();
        let mut tampered = sealed.cipher_text().to_vec();
        tampered[0] ^= 1;
        let forged = SecretBox::new(tampered, sealed.nonce().to_vec(), sealed.mac().clone());
        assert_eq!(cbc.decrypt(&forged, &key, b"").unwrap_err(), CryptoError::AuthFailure);
    }

    #[test]
    fn test_bad_padding_without_mac() {
        // With the empty MAC nothing catches tampering except the padding
        // check itself. CBC malleability: flipping a bit in ciphertext
        // block 1 flips the same bit in plaintext block 2, breaking the
        // 15-byte padding run of a 17-byte message.
        let cbc = AesCbc::new(16, Arc::new(EmptyMac)).unwrap();
        let key = SecretKey::new(vec![7u8; 16]);
        let sealed = cbc.encrypt(&[0x61; 17], &key, Some(&[0u8; 16]), b"").unwrap();
        let mut tampered = sealed.cipher_text().to_vec();
        tampered[15] ^= 0x01;
        let forged = SecretBox::new(tampered, sealed.nonce().to_vec(), crate::types::Mac::EMPTY);
        assert_eq!(cbc.decrypt(&forged, &key, b"").unwrap_err(), CryptoError::BadPadding);
    }

    #[test]
    fn test_zero_padding_mode() {
        let cbc = AesCbc::new(16, Arc::new(EmptyMac)).unwrap().with_padding(PaddingAlgorithm::Zero);
        let key = cbc.new_secret_key();
        let sealed = cbc.encrypt(b"exactly sixteen!", &key, None, b"").unwrap();
        // Aligned input gains no padding block.
        assert_eq!(sealed.cipher_text().len(), 16);
        assert_eq!(cbc.decrypt(&sealed, &key, b"").unwrap(), b"exactly sixteen!");
    }

    #[test]
    fn test_wrong_key_fails() {
        let cbc = cipher();
        let key = cbc.new_secret_key();
        let other = cbc.new_secret_key();
        let sealed = cbc.encrypt(b"secret", &key, None, b"").unwrap();
        assert!(cbc.decrypt(&sealed, &other, b"").is_err());
    }
}
