//! AES-GCM authenticated encryption (NIST SP 800-38D).
//!
//! The hash subkey is `H = E_K(0^128)`. A 12-byte IV forms the
//! pre-counter block directly as `IV || 0x00000001`; other IV lengths are
//! folded through GHASH. The keystream runs CTR mode from `inc32(J0)`,
//! touching only the low 32 counter bits, and the tag is
//! `E_K(J0) XOR GHASH(AAD, C, lengths)`.

use crate::bytes;
use crate::cipher::{Cipher, reject_key_stream_index, resolve_nonce};
use crate::config::{AES_BLOCK_SIZE, GCM_STANDARD_NONCE_SIZE, GCM_TAG_SIZE};
use crate::error::{CryptoError, Result};
use crate::primitive::aes::AesKey;
use crate::primitive::ghash::Ghash;
use crate::random::SecureRandom;
use crate::secret::SecretKey;
use crate::types::{AlgorithmId, Mac, SecretBox};

/// AES-GCM with a configurable nonce length (default 12).
pub struct AesGcm {
    secret_key_length: usize,
    nonce_length: usize,
    random: SecureRandom,
}

impl AesGcm {
    /// Creates the cipher with the standard 12-byte nonce.
    ///
    /// # Errors
    /// [`CryptoError::InvalidKeyLength`] for key sizes other than
    /// 16/24/32.
    pub fn new(secret_key_length: usize) -> Result<Self> {
        if !matches!(secret_key_length, 16 | 24 | 32) {
            return Err(CryptoError::InvalidKeyLength { expected: 32, actual: secret_key_length });
        }
        Ok(Self { secret_key_length, nonce_length: GCM_STANDARD_NONCE_SIZE, random: SecureRandom::default() })
    }

    /// Sets a non-standard nonce length (any value of at least one byte).
    ///
    /// # Errors
    /// [`CryptoError::InvalidNonceLength`] for zero.
    pub fn with_nonce_length(mut self, nonce_length: usize) -> Result<Self> {
        if nonce_length == 0 {
            return Err(CryptoError::InvalidNonceLength { expected: GCM_STANDARD_NONCE_SIZE, actual: 0 });
        }
        self.nonce_length = nonce_length;
        Ok(self)
    }

    /// Replaces the random source used for generated nonces and keys.
    #[must_use]
    pub fn with_random(mut self, random: SecureRandom) -> Self {
        self.random = random;
        self
    }

    /// Derives the pre-counter block J0 from an IV of any length.
    fn pre_counter(h: &[u8; 16], iv: &[u8]) -> [u8; 16] {
        if iv.len() == GCM_STANDARD_NONCE_SIZE {
            let mut j0 = [0u8; 16];
            j0[..12].copy_from_slice(iv);
            j0[15] = 1;
            j0
        } else {
            let mut ghash = Ghash::new(h);
            ghash.update_padded(iv);
            ghash.update_lengths(0, iv.len() as u64);
            ghash.finalize()
        }
    }

    /// CTR keystream XOR starting at `inc32(J0)`.
    fn apply_keystream(aes: &AesKey, j0: &[u8; 16], data: &mut [u8]) {
        let mut counter_block = *j0;
        for chunk in data.chunks_mut(AES_BLOCK_SIZE) {
            bytes::inc32_be(&mut counter_block);
            let keystream = aes.encrypt_copy(&counter_block);
            bytes::xor_in_place(chunk, &keystream);
        }
    }

    /// The full tag over `aad` and `cipher_text` under `J0`.
    fn compute_tag(aes: &AesKey, h: &[u8; 16], j0: &[u8; 16], aad: &[u8], cipher_text: &[u8]) -> [u8; 16] {
        let mut ghash = Ghash::new(h);
        ghash.update_padded(aad);
        ghash.update_padded(cipher_text);
        ghash.update_lengths(aad.len() as u64, cipher_text.len() as u64);
        let mut tag = ghash.finalize();
        let masked = aes.encrypt_copy(j0);
        bytes::xor_in_place(&mut tag, &masked);
        tag
    }
}

impl Cipher for AesGcm {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::AesGcm
    }

    fn secret_key_length(&self) -> usize {
        self.secret_key_length
    }

    fn nonce_length(&self) -> usize {
        self.nonce_length
    }

    fn mac_length(&self) -> usize {
        GCM_TAG_SIZE
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
        let key_bytes = key.extract_exact(self.secret_key_length)?;
        let aes = AesKey::new(&key_bytes)?;

        let h = aes.encrypt_copy(&[0u8; 16]);
        let j0 = Self::pre_counter(&h, &nonce);

        let mut cipher_text = clear_text.to_vec();
        Self::apply_keystream(&aes, &j0, &mut cipher_text);

        let tag = Self::compute_tag(&aes, &h, &j0, aad, &cipher_text);
        Ok(SecretBox::new(cipher_text, nonce, Mac::new(tag.to_vec())))
    }

    fn decrypt_at(&self, secret_box: &SecretBox, key: &SecretKey, aad: &[u8], key_stream_index: u64) -> Result<Vec<u8>> {
        reject_key_stream_index(key_stream_index)?;
        let nonce = secret_box.nonce();
        if nonce.len() != self.nonce_length {
            return Err(CryptoError::InvalidNonceLength { expected: self.nonce_length, actual: nonce.len() });
        }
        let key_bytes = key.extract_exact(self.secret_key_length)?;
        let aes = AesKey::new(&key_bytes)?;

        let h = aes.encrypt_copy(&[0u8; 16]);
        let j0 = Self::pre_counter(&h, nonce);

        // Recompute the tag over the received ciphertext and compare in
        // constant time before any plaintext is produced.
        let tag = Self::compute_tag(&aes, &h, &j0, aad, secret_box.cipher_text());
        if *secret_box.mac() != Mac::new(tag.to_vec()) {
            return Err(CryptoError::AuthFailure);
        }

        let mut clear_text = secret_box.cipher_text().to_vec();
        Self::apply_keystream(&aes, &j0, &mut clear_text);
        Ok(clear_text)
    }
}
