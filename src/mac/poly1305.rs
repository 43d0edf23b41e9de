//! Poly1305 as a standalone [`MacAlgorithm`].
//!
//! The 32-byte key is strictly one-time: authenticating two messages
//! under the same key forfeits the security proof. The AEAD modes derive
//! a fresh key per nonce from the cipher keystream; direct users carry
//! the same obligation.

use crate::error::Result;
use crate::mac::MacAlgorithm;
use crate::primitive::poly1305;
use crate::secret::SecretKey;
use crate::types::Mac;

/// One-shot Poly1305 (RFC 8439 section 2.5).
#[derive(Clone, Copy, Debug, Default)]
pub struct Poly1305Mac;

impl MacAlgorithm for Poly1305Mac {
    fn mac_length(&self) -> usize {
        poly1305::TAG_SIZE
    }

    fn compute(&self, message: &[u8], key: &SecretKey, _nonce: &[u8], _aad: &[u8]) -> Result<Mac> {
        let key_bytes = key.extract_exact(poly1305::KEY_SIZE)?;
        let key_array: [u8; poly1305::KEY_SIZE] = key_bytes.as_slice().try_into().expect("length checked");
        Ok(Mac::new(poly1305::compute(&key_array, message).to_vec()))
    }
}
