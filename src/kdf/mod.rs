//! Key derivation functions and their dispatch trait.
//!
//! All three derivers stretch `(secret, salt)` into fixed-length keying
//! material: HKDF for high-entropy inputs, PBKDF2 and Argon2id for
//! passwords. Argon2id is the one to reach for when an attacker can
//! throw GPUs at the problem; PBKDF2 stays for compatibility.

mod argon2;
mod hkdf;
mod pbkdf2;

pub use argon2::Argon2id;
pub use hkdf::Hkdf;
pub use pbkdf2::Pbkdf2;

use crate::error::Result;
use crate::secret::SecretKey;
use crate::types::AlgorithmId;

/// A key derivation function with fixed parameters.
pub trait Kdf: Send + Sync {
    /// The bridge identifier of this algorithm.
    fn algorithm(&self) -> AlgorithmId;

    /// Derived key length in bytes.
    fn output_length(&self) -> usize;

    /// Deterministically derives a key from a secret and a salt.
    fn derive_key(&self, secret: &[u8], salt: &[u8]) -> Result<SecretKey>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::Hmac;
    use std::sync::Arc;

    #[test]
    fn test_dispatch_determinism_and_salt_sensitivity() {
        let kdfs: Vec<Box<dyn Kdf>> = vec![
            Box::new(Hkdf::new(Hmac::sha256(), 32).unwrap()),
            Box::new(Pbkdf2::new(Arc::new(Hmac::sha256()), 2, 256).unwrap()),
            Box::new(Argon2id::new(1, 8, 1, 32).unwrap()),
        ];
        for kdf in &kdfs {
            let a = kdf.derive_key(b"secret", b"salt-one").unwrap();
            let b = kdf.derive_key(b"secret", b"salt-one").unwrap();
            let c = kdf.derive_key(b"secret", b"salt-two").unwrap();
            assert_eq!(a.length(), kdf.output_length());
            assert_eq!(a, b);
            assert_ne!(a, c);
        }
    }
}
