//! HMAC (RFC 2104) over any [`HashAlgorithm`].

use std::sync::Arc;

use crate::error::Result;
use crate::hash::{Blake2b, Blake2s, HashAlgorithm, Sha1, Sha224, Sha256, Sha384, Sha512};
use crate::mac::MacAlgorithm;
use crate::secret::SecretKey;
use crate::types::Mac;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// HMAC with the hash chosen at construction.
///
/// The key may be any length: keys longer than the hash's block length
/// are hashed down first, shorter keys are zero-padded, exactly as RFC
/// 2104 prescribes. The tag length equals the hash length.
#[derive(Clone)]
pub struct Hmac {
    hash: Arc<dyn HashAlgorithm>,
}

impl std::fmt::Debug for Hmac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hmac").finish_non_exhaustive()
    }
}

impl Hmac {
    #[must_use]
    pub fn new(hash: Arc<dyn HashAlgorithm>) -> Self {
        Self { hash }
    }

    #[must_use]
    pub fn sha1() -> Self {
        Self::new(Arc::new(Sha1))
    }

    #[must_use]
    pub fn sha224() -> Self {
        Self::new(Arc::new(Sha224))
    }

    #[must_use]
    pub fn sha256() -> Self {
        Self::new(Arc::new(Sha256))
    }

    #[must_use]
    pub fn sha384() -> Self {
        Self::new(Arc::new(Sha384))
    }

    #[must_use]
    pub fn sha512() -> Self {
        Self::new(Arc::new(Sha512))
    }

    #[must_use]
    pub fn blake2b() -> Self {
        Self::new(Arc::new(Blake2b::default()))
    }

    #[must_use]
    pub fn blake2s() -> Self {
        Self::new(Arc::new(Blake2s::default()))
    }

    /// The underlying hash algorithm.
    #[must_use]
    pub fn hash_algorithm(&self) -> &dyn HashAlgorithm {
        self.hash.as_ref()
    }

    /// Computes the tag over the concatenation of `parts` without
    /// assembling them in memory. The KDFs lean on this for their
    /// `label || counter` message layouts.
    #[must_use]
    pub fn compute_parts(&self, key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
        let block_length = self.hash.block_length();

        // K': hash oversized keys, zero-pad the rest to the block length.
        let mut padded_key = vec![0u8; block_length];
        if key.len() > block_length {
            let digest = self.hash.hash(key);
            padded_key[..digest.len()].copy_from_slice(digest.as_bytes());
        } else {
            padded_key[..key.len()].copy_from_slice(key);
        }

        let mut inner = self.hash.begin();
        let inner_pad: Vec<u8> = padded_key.iter().map(|byte| byte ^ IPAD).collect();
        inner.update(&inner_pad);
        for part in parts {
            inner.update(part);
        }
        let inner_digest = inner.finalize();

        let mut outer = self.hash.begin();
        let outer_pad: Vec<u8> = padded_key.iter().map(|byte| byte ^ OPAD).collect();
        outer.update(&outer_pad);
        outer.update(inner_digest.as_bytes());
        outer.finalize().into_bytes()
    }
}

impl MacAlgorithm for Hmac {
    fn mac_length(&self) -> usize {
        self.hash.hash_length()
    }

    fn compute(&self, message: &[u8], key: &SecretKey, _nonce: &[u8], _aad: &[u8]) -> Result<Mac> {
        let key_bytes = key.extract()?;
        Ok(Mac::new(self.compute_parts(&key_bytes, &[message])))
    }
}
