//! ChaCha20 stream cipher and the ChaCha20-Poly1305 AEAD (RFC 8439).
//!
//! The raw cipher pairs with an external MAC like AES-CTR does; the AEAD
//! derives a one-time Poly1305 key from keystream block zero, encrypts
//! from block one, and authenticates `aad || pad || ciphertext || pad ||
//! lengths`.

use std::sync::Arc;

use zeroize::Zeroize;

use crate::cipher::{Cipher, reject_key_stream_index, resolve_nonce};
use crate::config::{CHACHA_KEY_SIZE, CHACHA_NONCE_SIZE, POLY1305_TAG_SIZE};
use crate::error::{CryptoError, Result};
use crate::mac::MacAlgorithm;
use crate::primitive::{chacha, poly1305};
use crate::random::SecureRandom;
use crate::secret::SecretKey;
use crate::types::{AlgorithmId, Mac, SecretBox};

/// The raw ChaCha20 stream cipher with an external MAC.
///
/// Keystream counter starts at zero; `key_stream_index` gives random
/// access into the stream.
pub struct ChaCha20 {
    mac: Arc<dyn MacAlgorithm>,
    random: SecureRandom,
}

impl ChaCha20 {
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

impl Cipher for ChaCha20 {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Chacha20
    }

    fn secret_key_length(&self) -> usize {
        CHACHA_KEY_SIZE
    }

    fn nonce_length(&self) -> usize {
        CHACHA_NONCE_SIZE
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
        let key_array = extract_key(key)?;
        let nonce_array: [u8; CHACHA_NONCE_SIZE] = nonce.as_slice().try_into().expect("length checked");

        let mut cipher_text = clear_text.to_vec();
        chacha::xor_at(&key_array, &nonce_array, 0, key_stream_index, &mut cipher_text);

        let mac = self.mac.compute(&cipher_text, key, &nonce, aad)?;
        Ok(SecretBox::new(cipher_text, nonce, mac))
    }

    fn decrypt_at(&self, secret_box: &SecretBox, key: &SecretKey, aad: &[u8], key_stream_index: u64) -> Result<Vec<u8>> {
        let nonce = secret_box.nonce();
        if nonce.len() != CHACHA_NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength { expected: CHACHA_NONCE_SIZE, actual: nonce.len() });
        }
        if !self.mac.verify(secret_box.mac(), secret_box.cipher_text(), key, nonce, aad)? {
            return Err(CryptoError::AuthFailure);
        }

        let key_array = extract_key(key)?;
        let nonce_array: [u8; CHACHA_NONCE_SIZE] = nonce.try_into().expect("length checked");

        let mut clear_text = secret_box.cipher_text().to_vec();
        chacha::xor_at(&key_array, &nonce_array, 0, key_stream_index, &mut clear_text);
        Ok(clear_text)
    }
}

/// ChaCha20-Poly1305 AEAD (RFC 8439 section 2.8).
#[derive(Default)]
pub struct ChaCha20Poly1305 {
    random: SecureRandom,
}

impl ChaCha20Poly1305 {
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

impl Cipher for ChaCha20Poly1305 {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Chacha20Poly1305Aead
    }

    fn secret_key_length(&self) -> usize {
        CHACHA_KEY_SIZE
    }

    fn nonce_length(&self) -> usize {
        CHACHA_NONCE_SIZE
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
        let key_array = extract_key(key)?;
        let nonce_array: [u8; CHACHA_NONCE_SIZE] = nonce.as_slice().try_into().expect("length checked");

        let (cipher_text, tag) = seal(&key_array, &nonce_array, aad, clear_text);
        Ok(SecretBox::new(cipher_text, nonce, Mac::new(tag.to_vec())))
    }

    fn decrypt_at(&self, secret_box: &SecretBox, key: &SecretKey, aad: &[u8], key_stream_index: u64) -> Result<Vec<u8>> {
        reject_key_stream_index(key_stream_index)?;
        let nonce = secret_box.nonce();
        if nonce.len() != CHACHA_NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength { expected: CHACHA_NONCE_SIZE, actual: nonce.len() });
        }
        let key_array = extract_key(key)?;
        let nonce_array: [u8; CHACHA_NONCE_SIZE] = nonce.try_into().expect("length checked");

        open(&key_array, &nonce_array, aad, secret_box.cipher_text(), secret_box.mac())
    }
}

fn extract_key(key: &SecretKey) -> Result<[u8; CHACHA_KEY_SIZE]> {
    let key_bytes = key.extract_exact(CHACHA_KEY_SIZE)?;
    Ok(key_bytes.as_slice().try_into().expect("length checked"))
}

/// The AEAD authentication input: `aad || pad16 || ct || pad16 ||
/// le64(|aad|) || le64(|ct|)`.
fn mac_data(aad: &[u8], cipher_text: &[u8]) -> Vec<u8> {
    let pad = |len: usize| (16 - len % 16) % 16;
    let mut data = Vec::with_capacity(aad.len() + pad(aad.len()) + cipher_text.len() + pad(cipher_text.len()) + 16);
    data.extend_from_slice(aad);
    data.resize(data.len() + pad(aad.len()), 0);
    data.extend_from_slice(cipher_text);
    data.resize(data.len() + pad(cipher_text.len()), 0);
    data.extend_from_slice(&(aad.len() as u64).to_le_bytes());
    data.extend_from_slice(&(cipher_text.len() as u64).to_le_bytes());
    data
}

/// Derives the one-time Poly1305 key from keystream block zero.
fn one_time_key(key: &[u8; CHACHA_KEY_SIZE], nonce: &[u8; CHACHA_NONCE_SIZE]) -> [u8; poly1305::KEY_SIZE] {
    let block = chacha::block(key, 0, nonce);
    let mut otk = [0u8; poly1305::KEY_SIZE];
    otk.copy_from_slice(&block[..poly1305::KEY_SIZE]);
    otk
}

/// Encrypt-then-MAC, shared with the XChaCha20 construction.
pub(crate) fn seal(key: &[u8; CHACHA_KEY_SIZE], nonce: &[u8; CHACHA_NONCE_SIZE], aad: &[u8], clear_text: &[u8]) -> (Vec<u8>, [u8; POLY1305_TAG_SIZE]) {
    let mut otk = one_time_key(key, nonce);

    let mut cipher_text = clear_text.to_vec();
    chacha::xor_at(key, nonce, 1, 0, &mut cipher_text);

    let tag = poly1305::compute(&otk, &mac_data(aad, &cipher_text));
    otk.zeroize();
    (cipher_text, tag)
}

/// MAC-then-decrypt, shared with the XChaCha20 construction.
pub(crate) fn open(key: &[u8; CHACHA_KEY_SIZE], nonce: &[u8; CHACHA_NONCE_SIZE], aad: &[u8], cipher_text: &[u8], expected_mac: &Mac) -> Result<Vec<u8>> {
    let mut otk = one_time_key(key, nonce);
    let tag = poly1305::compute(&otk, &mac_data(aad, cipher_text));
    otk.zeroize();

    if *expected_mac != Mac::new(tag.to_vec()) {
        return Err(CryptoError::AuthFailure);
    }

    let mut clear_text = cipher_text.to_vec();
    chacha::xor_at(key, nonce, 1, 0, &mut clear_text);
    Ok(clear_text)
}
