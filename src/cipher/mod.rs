//! Symmetric ciphers: the dispatch trait, the mode engines and the
//! chunk-wise cipher state.
//!
//! Every mode engine is an immutable algorithm object carrying its fixed
//! parameters (key length, padding, MAC choice, counter width) plus the
//! random source used for generated nonces and keys. The [`Cipher`] trait
//! is object-safe, so callers can hold `Arc<dyn Cipher>` and switch
//! algorithms at runtime.

mod aes_cbc;
mod aes_ctr;
mod aes_gcm;
mod chacha20;
mod xchacha20;

pub use aes_cbc::AesCbc;
pub use aes_ctr::AesCtr;
pub use aes_gcm::AesGcm;
pub use chacha20::{ChaCha20, ChaCha20Poly1305};
pub use xchacha20::{XChaCha20, XChaCha20Poly1305};

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};
use crate::mac::MacAlgorithm;
use crate::random::SecureRandom;
use crate::secret::SecretKey;
use crate::types::{AlgorithmId, Mac, SecretBox};

/// An authenticated or unauthenticated symmetric cipher with fixed
/// parameters.
pub trait Cipher: Send + Sync {
    /// The bridge identifier of this algorithm.
    fn algorithm(&self) -> AlgorithmId;

    /// Secret key length in bytes.
    fn secret_key_length(&self) -> usize;

    /// Nonce length in bytes.
    fn nonce_length(&self) -> usize;

    /// MAC length in bytes; 0 for unauthenticated configurations.
    fn mac_length(&self) -> usize;

    /// The external MAC paired with this cipher, when it has one.
    ///
    /// AEAD modes integrate their tag computation and return `None`.
    fn mac_algorithm(&self) -> Option<&dyn MacAlgorithm> {
        None
    }

    /// Ciphertext length produced for a clear text of `clear_text_length`
    /// bytes (identical for stream ciphers, padded up for CBC).
    fn cipher_text_length(&self, clear_text_length: usize) -> usize {
        clear_text_length
    }

    /// Whether associated data is authenticated rather than rejected.
    fn supports_aad(&self) -> bool {
        false
    }

    /// The random source used for generated nonces and keys.
    fn random(&self) -> &SecureRandom;

    /// Generates a fresh random secret key of the right length.
    fn new_secret_key(&self) -> SecretKey {
        SecretKey::new(self.random().bytes(self.secret_key_length()))
    }

    /// Generates a fresh random nonce of the right length.
    fn new_nonce(&self) -> Vec<u8> {
        self.random().bytes(self.nonce_length())
    }

    /// Encrypts `clear_text`, drawing a fresh nonce when none is given.
    ///
    /// Reusing a `(key, nonce)` pair across encryptions breaks every
    /// cipher in this crate; the library cannot detect it, so the
    /// contract is the caller's to keep.
    fn encrypt(&self, clear_text: &[u8], key: &SecretKey, nonce: Option<&[u8]>, aad: &[u8]) -> Result<SecretBox> {
        self.encrypt_at(clear_text, key, nonce, aad, 0)
    }

    /// Verifies the MAC in constant time, then decrypts.
    ///
    /// On mismatch fails with [`CryptoError::AuthFailure`] without
    /// yielding any plaintext.
    fn decrypt(&self, secret_box: &SecretBox, key: &SecretKey, aad: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_at(secret_box, key, aad, 0)
    }

    /// [`Cipher::encrypt`] starting `key_stream_index` octets into the
    /// keystream.
    ///
    /// Only stream ciphers with random access accept a non-zero index;
    /// everything else fails with
    /// [`CryptoError::KeyStreamIndexUnsupported`].
    fn encrypt_at(&self, clear_text: &[u8], key: &SecretKey, nonce: Option<&[u8]>, aad: &[u8], key_stream_index: u64) -> Result<SecretBox>;

    /// [`Cipher::decrypt`] starting `key_stream_index` octets into the
    /// keystream.
    fn decrypt_at(&self, secret_box: &SecretBox, key: &SecretKey, aad: &[u8], key_stream_index: u64) -> Result<Vec<u8>>;
}

/// Resolves an optional caller nonce against the cipher's geometry.
pub(crate) fn resolve_nonce(cipher: &dyn Cipher, nonce: Option<&[u8]>) -> Result<Vec<u8>> {
    match nonce {
        Some(bytes) => {
            if bytes.len() != cipher.nonce_length() {
                return Err(CryptoError::InvalidNonceLength { expected: cipher.nonce_length(), actual: bytes.len() });
            }
            Ok(bytes.to_vec())
        }
        None => Ok(cipher.new_nonce()),
    }
}

/// Rejects a non-zero keystream index for ciphers without random access.
pub(crate) fn reject_key_stream_index(key_stream_index: u64) -> Result<()> {
    if key_stream_index != 0 {
        return Err(CryptoError::KeyStreamIndexUnsupported);
    }
    Ok(())
}

/// The phases of a chunk-wise AEAD operation.
///
/// `Idle -> AssocData` happens when the state is constructed with its key
/// and nonce; `AssocData -> Plaintext` on the first data byte, after
/// which associated data is refused. Closing consumes the state, which is
/// how `Finalized` (and `Failed`, for a MAC mismatch) are represented:
/// a closed state cannot be fed again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChunkPhase {
    AssocData,
    Plaintext,
}

/// Chunk-wise cipher state.
///
/// Buffers added chunks and delegates to the one-shot cipher when closed,
/// which preserves the authentication guarantees for every mode,
/// including CBC with padding. The buffer zeroizes on drop, so an
/// abandoned (cancelled) state does not leak plaintext.
pub struct CipherState {
    cipher: Arc<dyn Cipher>,
    is_encrypting: bool,
    key: SecretKey,
    nonce: Vec<u8>,
    aad: Vec<u8>,
    key_stream_index: u64,
    buffer: Zeroizing<Vec<u8>>,
    phase: ChunkPhase,
}

impl CipherState {
    /// Starts a chunked encryption. A missing nonce is drawn from the
    /// cipher's random source.
    ///
    /// # Errors
    /// [`CryptoError::InvalidNonceLength`] for a wrong-sized nonce.
    pub fn encrypt(cipher: Arc<dyn Cipher>, key: &SecretKey, nonce: Option<&[u8]>) -> Result<Self> {
        let nonce = resolve_nonce(cipher.as_ref(), nonce)?;
        Ok(Self {
            cipher,
            is_encrypting: true,
            key: key.clone(),
            nonce,
            aad: Vec::new(),
            key_stream_index: 0,
            buffer: Zeroizing::new(Vec::new()),
            phase: ChunkPhase::AssocData,
        })
    }

    /// Starts a chunked decryption.
    ///
    /// # Errors
    /// [`CryptoError::InvalidNonceLength`] for a wrong-sized nonce.
    pub fn decrypt(cipher: Arc<dyn Cipher>, key: &SecretKey, nonce: &[u8]) -> Result<Self> {
        let nonce = resolve_nonce(cipher.as_ref(), Some(nonce))?;
        Ok(Self {
            cipher,
            is_encrypting: false,
            key: key.clone(),
            nonce,
            aad: Vec::new(),
            key_stream_index: 0,
            buffer: Zeroizing::new(Vec::new()),
            phase: ChunkPhase::AssocData,
        })
    }

    /// Sets the keystream starting offset for random-access ciphers.
    #[must_use]
    pub fn with_key_stream_index(mut self, key_stream_index: u64) -> Self {
        self.key_stream_index = key_stream_index;
        self
    }

    /// Whether this state encrypts (as opposed to decrypts).
    #[must_use]
    pub fn is_encrypting(&self) -> bool {
        self.is_encrypting
    }

    /// The nonce this state operates under.
    #[must_use]
    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    /// Appends associated data.
    ///
    /// # Errors
    /// [`CryptoError::InvalidParameter`] once data bytes have been added:
    /// associated data must be complete before the first chunk.
    pub fn set_aad(&mut self, aad: &[u8]) -> Result<()> {
        if self.phase != ChunkPhase::AssocData {
            return Err(CryptoError::InvalidParameter("associated data after the first data chunk"));
        }
        self.aad.extend_from_slice(aad);
        Ok(())
    }

    /// Adds a chunk of clear text (encrypting) or ciphertext
    /// (decrypting).
    pub fn add_slice(&mut self, chunk: &[u8]) {
        self.phase = ChunkPhase::Plaintext;
        self.buffer.extend_from_slice(chunk);
    }

    /// Finishes an encryption, producing the envelope.
    ///
    /// # Errors
    /// [`CryptoError::InvalidParameter`] when called on a decrypting
    /// state.
    pub fn close_encrypt(self) -> Result<SecretBox> {
        if !self.is_encrypting {
            return Err(CryptoError::InvalidParameter("close_encrypt on a decrypting state"));
        }
        self.cipher.encrypt_at(&self.buffer, &self.key, Some(&self.nonce), &self.aad, self.key_stream_index)
    }

    /// Finishes a decryption, verifying `expected_mac` before any
    /// plaintext is produced.
    ///
    /// # Errors
    /// [`CryptoError::AuthFailure`] on MAC mismatch; the buffered data is
    /// zeroized when the state drops.
    pub fn close_decrypt(self, expected_mac: &Mac) -> Result<Vec<u8>> {
        if self.is_encrypting {
            return Err(CryptoError::InvalidParameter("close_decrypt on an encrypting state"));
        }
        let secret_box = SecretBox::new(self.buffer.to_vec(), self.nonce.clone(), expected_mac.clone());
        self.cipher.decrypt_at(&secret_box, &self.key, &self.aad, self.key_stream_index)
    }
}
