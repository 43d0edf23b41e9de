//! AES-CTR: the block cipher as a random-access stream cipher.
//!
//! The 16-byte counter block is `nonce || counter`: the low
//! `counter_bits` bits (default 64) hold a big-endian block counter that
//! wraps within its own width, the rest carry the caller's nonce
//! untouched. Random access comes from `key_stream_index`, which names an
//! absolute octet of the keystream. CTR has no authentication of its own;
//! a configured external MAC covers the ciphertext.

use std::sync::Arc;

use crate::cipher::{Cipher, resolve_nonce};
use crate::config::{AES_BLOCK_SIZE, CTR_DEFAULT_COUNTER_BITS};
use crate::error::{CryptoError, Result};
use crate::mac::MacAlgorithm;
use crate::primitive::aes::AesKey;
use crate::random::SecureRandom;
use crate::secret::SecretKey;
use crate::types::{AlgorithmId, SecretBox};

/// AES-CTR with a configurable counter width and external MAC.
pub struct AesCtr {
    secret_key_length: usize,
    counter_bits: u32,
    mac: Arc<dyn MacAlgorithm>,
    random: SecureRandom,
}

impl AesCtr {
    /// Creates the cipher with the default 64-bit counter.
    ///
    /// # Errors
    /// [`CryptoError::InvalidKeyLength`] for key sizes other than
    /// 16/24/32.
    pub fn new(secret_key_length: usize, mac: Arc<dyn MacAlgorithm>) -> Result<Self> {
        if !matches!(secret_key_length, 16 | 24 | 32) {
            return Err(CryptoError::InvalidKeyLength { expected: 32, actual: secret_key_length });
        }
        Ok(Self { secret_key_length, counter_bits: CTR_DEFAULT_COUNTER_BITS, mac, random: SecureRandom::default() })
    }

    /// Sets the counter width in bits.
    ///
    /// # Errors
    /// [`CryptoError::InvalidCounterBits`] outside `[1, 128]`.
    pub fn with_counter_bits(mut self, counter_bits: u32) -> Result<Self> {
        if !(1..=128).contains(&counter_bits) {
            return Err(CryptoError::InvalidCounterBits(counter_bits));
        }
        self.counter_bits = counter_bits;
        Ok(self)
    }

    /// Replaces the random source used for generated nonces and keys.
    #[must_use]
    pub fn with_random(mut self, random: SecureRandom) -> Self {
        self.random = random;
        self
    }

    fn counter_mask(&self) -> u128 {
        if self.counter_bits == 128 {
            u128::MAX
        } else {
            (1u128 << self.counter_bits) - 1
        }
    }

    /// XORs the keystream into `data`, starting at `key_stream_index`.
    fn apply_keystream(&self, aes: &AesKey, nonce: &[u8], key_stream_index: u64, data: &mut [u8]) {
        let mut iv_block = [0u8; AES_BLOCK_SIZE];
        iv_block[..nonce.len()].copy_from_slice(nonce);
        let iv = u128::from_be_bytes(iv_block);
        let mask = self.counter_mask();
        let initial_counter = iv & mask;
        let prefix = iv & !mask;

        let mut block_index = key_stream_index / AES_BLOCK_SIZE as u64;
        let mut offset = (key_stream_index % AES_BLOCK_SIZE as u64) as usize;
        let mut processed = 0usize;

        while processed < data.len() {
            let counter = initial_counter.wrapping_add(u128::from(block_index)) & mask;
            let counter_block = (prefix | counter).to_be_bytes();
            let keystream = aes.encrypt_copy(&counter_block);

            let take = (AES_BLOCK_SIZE - offset).min(data.len() - processed);
            for (byte, ks) in data[processed..processed + take].iter_mut().zip(&keystream[offset..]) {
                *byte ^= ks;
            }
            processed += take;
            offset = 0;
            block_index += 1;
        }
    }
}

impl Cipher for AesCtr {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::AesCtr
    }

    fn secret_key_length(&self) -> usize {
        self.secret_key_length
    }

    /// The bytes of the counter block not claimed by the counter.
    fn nonce_length(&self) -> usize {
        (128 - self.counter_bits as usize) / 8
    }

    fn mac_length(&self) -> usize {
        self.mac.mac_length()
    }

    fn mac_algorithm(&self) -> Option<&dyn MacAlgorithm> {
        Some(self.mac.as_ref())
    }

    fn random(&self) -> &SecureRandom {
        &self.random
    }

    fn encrypt_at(&self, clear_text: &[u8], key: &SecretKey, nonce: Option<&[u8]>, aad: &[u8], key_stream_index: u64) -> Result<SecretBox> {
        let nonce = resolve_nonce(self, nonce)?;
        let key_bytes = key.extract_exact(self.secret_key_length)?;
        let aes = AesKey::new(&key_bytes)?;

        let mut cipher_text = clear_text.to_vec();
        self.apply_keystream(&aes, &nonce, key_stream_index, &mut cipher_text);

        let mac = self.mac.compute(&cipher_text, key, &nonce, aad)?;
        Ok(SecretBox::new(cipher_text, nonce, mac))
    }

    fn decrypt_at(&self, secret_box: &SecretBox, key: &SecretKey, aad: &[u8], key_stream_index: u64) -> Result<Vec<u8>> {
        let nonce = secret_box.nonce();
        if nonce.len() != self.nonce_length() {
            return Err(CryptoError::InvalidNonceLength { expected: self.nonce_length(), actual: nonce.len() });
        }

        if !self.mac.verify(secret_box.mac(), secret_box.cipher_text(), key, nonce, aad)? {
            return Err(CryptoError::AuthFailure);
        }

        let key_bytes = key.extract_exact(self.secret_key_length)?;
        let aes = AesKey::new(&key_bytes)?;

        let mut clear_text = secret_box.cipher_text().to_vec();
        self.apply_keystream(&aes, nonce, key_stream_index, &mut clear_text);
        Ok(clear_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::{EmptyMac, Hmac};

    fn cipher() -> AesCtr {
        AesCtr::new(32, Arc::new(Hmac::sha256())).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let ctr = cipher();
        let key = ctr.new_secret_key();
        let sealed = ctr.encrypt(b"stream me through the counter", &key, None, b"").unwrap();
        // No padding: ciphertext length equals clear-text length.
        assert_eq!(sealed.cipher_text().len(), 29);
        assert_eq!(ctr.decrypt(&sealed, &key, b"").unwrap(), b"stream me through the counter");
    }

    #[test]
    fn test_nist_sp800_38a_f51_first_block() {
        // NIST SP 800-38A F.5.1 starts from counter block
        // f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff. With an 8-bit counter the
        // nonce carries the first 15 bytes and a keystream index of
        // 255 blocks positions the counter byte at 0xff.
        let ctr = AesCtr::new(16, Arc::new(EmptyMac)).unwrap().with_counter_bits(8).unwrap();
        let key = SecretKey::new(hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap());
        let nonce = hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfe").unwrap();
        let clear_text = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        let sealed = ctr.encrypt_at(&clear_text, &key, Some(&nonce), b"", 255 * 16).unwrap();
        assert_eq!(hex::encode(sealed.cipher_text()), "874d6191b620e3261bef6864990db6ce");
    }

    #[test]
    fn test_key_stream_index_random_access() {
        let ctr = AesCtr::new(16, Arc::new(EmptyMac)).unwrap();
        let key = ctr.new_secret_key();
        let nonce = ctr.new_nonce();
        let clear_text = vec![0x5au8; 100];

        let full = ctr.encrypt(&clear_text, &key, Some(&nonce), b"").unwrap();

        // Encrypting the tail alone, with the right index, must produce
        // the same ciphertext bytes.
        let tail = ctr.encrypt_at(&clear_text[37..], &key, Some(&nonce), b"", 37).unwrap();
        assert_eq!(tail.cipher_text(), &full.cipher_text()[37..]);
    }

    #[test]
    fn test_counter_bits_bounds() {
        assert!(AesCtr::new(16, Arc::new(EmptyMac)).unwrap().with_counter_bits(0).is_err());
        assert!(AesCtr::new(16, Arc::new(EmptyMac)).unwrap().with_counter_bits(129).is_err());
        let ctr = AesCtr::new(16, Arc::new(EmptyMac)).unwrap().with_counter_bits(32).unwrap();
        assert_eq!(ctr.nonce_length(), 12);
    }

    #[test]
    fn test_default_nonce_length() {
        assert_eq!(cipher().nonce_length(), 8);
    }

    #[test]
    fn test_mac_failure_blocks_decryption() {
        let ctr = cipher();
        let key = ctr.new_secret_key();
        let sealed = ctr.encrypt(b"authenticated stream", &key, None, b"").unwrap();
        let mut tampered = sealed.cipher_text().to_vec();
        tampered[3] ^= 0x80;
        let forged = SecretBox::new(tampered, sealed.nonce().to_vec(), sealed.mac().clone());
        assert_eq!(ctr.decrypt(&forged, &key, b"").unwrap_err(), CryptoError::AuthFailure);
    }
}
