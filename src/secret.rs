//! Opaque secret-key holder with one-way destruction.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use zeroize::{Zeroize, Zeroizing};

use crate::bytes;
use crate::error::{CryptoError, Result};

/// An opaque holder of secret byte material.
///
/// The bytes can be extracted until [`SecretKey::destroy`] is called;
/// after that every extraction fails with [`CryptoError::Destroyed`] while
/// identity queries (`length`, `is_destroyed`) keep working. Destruction
/// is irreversible, and concurrent destroys resolve to the same final
/// state. Equality between keys is constant-time over the byte contents.
pub struct SecretKey {
    bytes: RwLock<Vec<u8>>,
    destroyed: AtomicBool,
    overwrite_on_destroy: bool,
    length: usize,
}

impl SecretKey {
    /// Wraps existing key material. The key takes ownership of the bytes.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        let length = data.len();
        Self { bytes: RwLock::new(data), destroyed: AtomicBool::new(false), overwrite_on_destroy: true, length }
    }

    /// Copies key material out of a slice.
    #[must_use]
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }

    /// Generates a fresh random key of `length` bytes from OS entropy.
    #[must_use]
    pub fn random(length: usize) -> Self {
        let mut data = vec![0u8; length];
        bytes::fill_random(&mut data);
        Self::new(data)
    }

    /// Controls whether `destroy` overwrites the buffer with zeros.
    ///
    /// Defaults to `true`. Opting out only skips the eager overwrite on
    /// destroy; the buffer is still zeroized when the key is dropped.
    #[must_use]
    pub fn with_overwrite_on_destroy(mut self, overwrite: bool) -> Self {
        self.overwrite_on_destroy = overwrite;
        self
    }

    /// The length of the key material in bytes.
    ///
    /// Remains valid after destruction.
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Whether this key has been destroyed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Extracts a copy of the key material.
    ///
    /// The copy zeroizes itself when dropped.
    ///
    /// # Errors
    /// [`CryptoError::Destroyed`] if the key was destroyed.
    pub fn extract(&self) -> Result<Zeroizing<Vec<u8>>> {
        let guard = self.bytes.read().expect("secret key lock poisoned");
        if self.is_destroyed() {
            return Err(CryptoError::Destroyed);
        }
        Ok(Zeroizing::new(guard.clone()))
    }

    /// Extracts the key material after checking it has `expected` bytes.
    ///
    /// # Errors
    /// [`CryptoError::Destroyed`] or [`CryptoError::InvalidKeyLength`].
    pub fn extract_exact(&self, expected: usize) -> Result<Zeroizing<Vec<u8>>> {
        if self.length != expected {
            return Err(CryptoError::InvalidKeyLength { expected, actual: self.length });
        }
        self.extract()
    }

    /// Irreversibly destroys the key material.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub fn destroy(&self) {
        let mut guard = self.bytes.write().expect("secret key lock poisoned");
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.overwrite_on_destroy {
            guard.zeroize();
        }
        guard.clear();
        guard.shrink_to_fit();
    }
}

impl PartialEq for SecretKey {
    /// Constant-time comparison of the key material.
    ///
    /// A destroyed key compares unequal to everything.
    fn eq(&self, other: &Self) -> bool {
        let (Ok(a), Ok(b)) = (self.extract(), other.extract()) else {
            return false;
        };
        bytes::constant_time_eq(&a, &b)
    }
}

impl Clone for SecretKey {
    fn clone(&self) -> Self {
        match self.extract() {
            Ok(data) => {
                let mut clone = Self::new(data.to_vec());
                clone.overwrite_on_destroy = self.overwrite_on_destroy;
                clone.length = self.length;
                clone
            }
            Err(_) => Self { bytes: RwLock::new(Vec::new()), destroyed: AtomicBool::new(true), overwrite_on_destroy: self.overwrite_on_destroy, length: self.length },
        }
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.bytes.get_mut().expect("secret key lock poisoned").zeroize();
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey").field("length", &self.length).field("destroyed", &self.is_destroyed()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_roundtrip() {
        let key = SecretKey::from_slice(&[7u8; 32]);
        assert_eq!(key.length(), 32);
        assert_eq!(&**key.extract().unwrap(), &[7u8; 32]);
    }

    #[test]
    fn test_destroy_blocks_extraction() {
        let key = SecretKey::from_slice(&[7u8; 32]);
        key.destroy();
        assert!(key.is_destroyed());
        assert_eq!(key.extract().unwrap_err(), CryptoError::Destroyed);
        // Identity queries stay valid
        assert_eq!(key.length(), 32);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let key = SecretKey::from_slice(b"secret");
        key.destroy();
        key.destroy();
        assert!(key.is_destroyed());
    }

    #[test]
    fn test_equality_is_content_based() {
        let a = SecretKey::from_slice(&[1u8; 16]);
        let b = SecretKey::from_slice(&[1u8; 16]);
        let c = SecretKey::from_slice(&[2u8; 16]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_destroyed_key_compares_unequal() {
        let a = SecretKey::from_slice(&[1u8; 16]);
        let b = SecretKey::from_slice(&[1u8; 16]);
        b.destroy();
        assert_ne!(a, b);
    }

    #[test]
    fn test_extract_exact_checks_length() {
        let key = SecretKey::from_slice(&[0u8; 16]);
        assert!(key.extract_exact(16).is_ok());
        assert_eq!(key.extract_exact(32).unwrap_err(), CryptoError::InvalidKeyLength { expected: 32, actual: 16 });
    }

    #[test]
    fn test_random_keys_differ() {
        let a = SecretKey::random(32);
        let b = SecretKey::random(32);
        assert_ne!(a, b);
    }
}
