//! XChaCha20: the 24-byte-nonce extension of ChaCha20, raw and AEAD.
//!
//! HChaCha20 folds the first 16 nonce bytes into a derived subkey; the
//! remaining 8 bytes, prefixed with 4 zero bytes, form the IETF nonce for
//! ordinary ChaCha20 under that subkey. The long nonce makes random
//! nonces collision-safe, which is the configuration every caller without
//! a counter discipline should pick.

use std::sync::Arc;

use zeroize::Zeroize;

use crate::cipher::{Cipher, chacha20, reject_key_stream_index, resolve_nonce};
use crate::config::{CHACHA_KEY_SIZE, CHACHA_NONCE_SIZE, POLY1305_TAG_SIZE, XCHACHA_NONCE_SIZE};
use crate::error::{CryptoError, Result};
use crate::mac::MacAlgorithm;
use crate::primitive::chacha;
use crate::random::SecureRandom;
use crate::secret::SecretKey;
use crate::types::{AlgorithmId, Mac, SecretBox};

/// Splits a 24-byte nonce into the HChaCha20 subkey and the inner nonce.
fn derive(key: &[u8; CHACHA_KEY_SIZE], nonce: &[u8; XCHACHA_NONCE_SIZE]) -> ([u8; CHACHA_KEY_SIZE], [u8; CHACHA_NONCE_SIZE]) {
    let hchacha_nonce: [u8; 16] = nonce[..16].try_into().expect("16-byte prefix");
    let subkey = chacha::hchacha20(key, &hchacha_nonce);

    let mut inner_nonce = [0u8; CHACHA_NONCE_SIZE];
    inner_nonce[4..].copy_from_slice(&nonce[16..]);
    (subkey, inner_nonce)
}

fn extract_key(key: &SecretKey) -> Result<[u8; CHACHA_KEY_SIZE]> {
    let key_bytes = key.extract_exact(CHACHA_KEY_SIZE)?;
    Ok(key_bytes.as_slice().try_into().expect("length checked"))
}

fn check_nonce(nonce: &[u8]) -> Result<[u8; XCHACHA_NONCE_SIZE]> {
    nonce.try_into().map_err(|_| CryptoError::InvalidNonceLength { expected: XCHACHA_NONCE_SIZE, actual: nonce.len() })
}

/// The raw XChaCha20 stream cipher with an external MAC.
pub struct XChaCha20 {
    mac: Arc<dyn MacAlgorithm>,
    random: SecureRandom,
}

impl XChaCha20 {
    #[must_use]
    pub fn new(mac: Arc<dyn MacAlgorithm>) -> Self {
        Self { mac, random: SecureRandom::default() }
    }

    /// Replaces the random source used for generated nonces and keys.
    #[must_use]
    pub fn with_random(mut self, random: SecureRandom) -> Self {
        self.random = random;
        self
    }
}

impl Cipher for XChaCha20 {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Xchacha20
    }

    fn secret_key_length(&self) -> usize {
        CHACHA_KEY_SIZE
    }

    fn nonce_length(&self) -> usize {
        XCHACHA_NONCE_SIZE
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
        let nonce_array = check_nonce(&nonce)?;
        let (mut subkey, inner_nonce) = derive(&extract_key(key)?, &nonce_array);

        let mut cipher_text = clear_text.to_vec();
        chacha::xor_at(&subkey, &inner_nonce, 0, key_stream_index, &mut cipher_text);
        subkey.zeroize();

        let mac = self.mac.compute(&cipher_text, key, &nonce, aad)?;
        Ok(SecretBox::new(cipher_text, nonce, mac))
    }

    fn decrypt_at(&self, secret_box: &SecretBox, key: &SecretKey, aad: &[u8], key_stream_index: u64) -> Result<Vec<u8>> {
        let nonce_array = check_nonce(secret_box.nonce())?;
        if !self.mac.verify(secret_box.mac(), secret_box.cipher_text(), key, secret_box.nonce(), aad)? {
            return Err(CryptoError::AuthFailure);
        }

        let (mut subkey, inner_nonce) = derive(&extract_key(key)?, &nonce_array);
        let mut clear_text = secret_box.cipher_text().to_vec();
        chacha::xor_at(&subkey, &inner_nonce, 0, key_stream_index, &mut clear_text);
        subkey.zeroize();
        Ok(clear_text)
    }
}

/// XChaCha20-Poly1305 AEAD (draft-irtf-cfrg-xchacha).
#[derive(Default)]
pub struct XChaCha20Poly1305 {
    random: SecureRandom,
}

impl XChaCha20Poly1305 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the random source used for generated nonces and keys.
    #[must_use]
    pub fn with_random(mut self, random: SecureRandom) -> Self {
        self.random = random;
        self
    }
}

impl Cipher for XChaCha20Poly1305 {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Xchacha20Poly1305Aead
    }

    fn secret_key_length(&self) -> usize {
        CHACHA_KEY_SIZE
    }

    fn nonce_length(&self) -> usize {
        XCHACHA_NONCE_SIZE
    }

    fn mac_length(&self) -> usize {
        POLY1305_TAG_SIZE
    }

    fn supports_aad(&self) -> bool {
        true
    }

    fn random(&self) -> &SecureRandom {
        &self.random
    }

    fn encrypt_at(&self, clear_text: &[u8], key: &SecretKey, nonce: Option<&[u8]>, aad: &[u8], key_stream_index: u64) -> Result<SecretBox> {
        reject_key_stream_index(key_stream_index)?;
        let nonce = resolve_nonce(self, nonce)?;
        let nonce_array = check_nonce(&nonce)?;
        let (mut subkey, inner_nonce) = derive(&extract_key(key)?, &nonce_array);

        let (cipher_text, tag) = chacha20::seal(&subkey, &inner_nonce, aad, clear_text);
        subkey.zeroize();
        Ok(SecretBox::new(cipher_text, nonce, Mac::new(tag.to_vec())))
    }

    fn decrypt_at(&self, secret_box: &SecretBox, key: &SecretKey, aad: &[u8], key_stream_index: u64) -> Result<Vec<u8>> {
        reject_key_stream_index(key_stream_index)?;
        let nonce_array = check_nonce(secret_box.nonce())?;
        let (mut subkey, inner_nonce) = derive(&extract_key(key)?, &nonce_array);

        let result = chacha20::open(&subkey, &inner_nonce, aad, secret_box.cipher_text(), secret_box.mac());
        subkey.zeroize();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::EmptyMac;

    #[test]
    fn test_draft_aead_vector() {
        // draft-irtf-cfrg-xchacha appendix A.1
        let aead = XChaCha20Poly1305::new();
        let key = SecretKey::new(hex::decode("808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f").unwrap());
        let nonce = hex::decode("404142434445464748494a4b4c4d4e4f5051525354555657").unwrap();
        let aad = hex::decode("50515253c0c1c2c3c4c5c6c7").unwrap();
        let clear_text = b"Ladies and Gentlemen of the class of '99: \
If I could offer you only one tip for the future, sunscreen would be it.";

        let sealed = aead.encrypt(clear_text, &key, Some(&nonce), &aad).unwrap();
        assert_eq!(hex::encode(&sealed.cipher_text()[..16]), "bd6d179d3e83d43b9576579493c0e939");
        assert_eq!(hex::encode(sealed.mac().as_bytes()), "c0875924c1c7987947deafd8780acf49");
        assert_eq!(aead.decrypt(&sealed, &key, &aad).unwrap(), clear_text);
    }

    #[test]
    fn test_roundtrip_random_nonce() {
        let aead = XChaCha20Poly1305::new();
        let key = aead.new_secret_key();
        let sealed = aead.encrypt(b"long nonce land", &key, None, b"").unwrap();
        assert_eq!(sealed.nonce().len(), 24);
        assert_eq!(aead.decrypt(&sealed, &key, b"").unwrap(), b"long nonce land");
    }

    #[test]
    fn test_nonce_prefix_changes_subkey() {
        let aead = XChaCha20Poly1305::new();
        let key = aead.new_secret_key();
        let nonce_a = [1u8; 24];
        let mut nonce_b = nonce_a;
        nonce_b[0] ^= 1;
        let sealed_a = aead.encrypt(b"same text", &key, Some(&nonce_a), b"").unwrap();
        let sealed_b = aead.encrypt(b"same text", &key, Some(&nonce_b), b"").unwrap();
        assert_ne!(sealed_a.cipher_text(), sealed_b.cipher_text());
    }

    #[test]
    fn test_raw_xchacha_roundtrip() {
        let cipher = XChaCha20::new(Arc::new(EmptyMac));
        let key = cipher.new_secret_key();
        let sealed = cipher.encrypt(b"raw extended nonce", &key, None, b"").unwrap();
        assert_eq!(cipher.decrypt(&sealed, &key, b"").unwrap(), b"raw extended nonce");
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let aead = XChaCha20Poly1305::new();
        let key = aead.new_secret_key();
        let sealed = aead.encrypt(b"payload", &key, None, b"").unwrap();
        let mut bad_nonce = sealed.nonce().to_vec();
        bad_nonce[23] ^= 1;
        let forged = SecretBox::new(sealed.cipher_text().to_vec(), bad_nonce, sealed.mac().clone());
        assert_eq!(aead.decrypt(&forged, &key, b"").unwrap_err(), CryptoError::AuthFailure);
    }
}
