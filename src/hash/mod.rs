//! Hash functions and the dispatch trait that binds them.
//!
//! [`HashAlgorithm`] is the object-safe surface the rest of the crate
//! programs against: HMAC takes any `&dyn HashAlgorithm`, ECDSA takes one
//! for message digesting, and callers can treat SHA-2 and BLAKE2
//! interchangeably. Incremental hashing goes through [`HashContext`] so
//! large inputs never need to be contiguous in memory.

mod blake2b;
mod blake2s;
mod sha1;
mod sha2;

pub use blake2b::Blake2b;
pub(crate) use blake2b::Blake2bContext;
pub use blake2s::Blake2s;
pub use sha1::Sha1;
pub use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::types::{AlgorithmId, HashDigest};

/// An in-progress hash computation.
pub trait HashContext: Send {
    /// Absorbs more input.
    fn update(&mut self, data: &[u8]);

    /// Completes the computation and produces the digest.
    fn finalize(self: Box<Self>) -> HashDigest;
}

/// A hash function with fixed parameters.
pub trait HashAlgorithm: Send + Sync {
    /// The bridge identifier of this algorithm.
    fn algorithm(&self) -> AlgorithmId;

    /// Digest length in bytes.
    fn hash_length(&self) -> usize;

    /// Internal block length in bytes (the HMAC `B` parameter).
    fn block_length(&self) -> usize;

    /// Starts an incremental computation.
    fn begin(&self) -> Box<dyn HashContext>;

    /// Hashes `data` in one shot.
    fn hash(&self, data: &[u8]) -> HashDigest {
        let mut context = self.begin();
        context.update(data);
        context.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_over_trait_objects() {
        let algorithms: Vec<Box<dyn HashAlgorithm>> = vec![
            Box::new(Sha1),
            Box::new(Sha224),
            Box::new(Sha256),
            Box::new(Sha384),
            Box::new(Sha512),
            Box::new(Blake2b::default()),
            Box::new(Blake2s::default()),
        ];
        for algorithm in &algorithms {
            let digest = algorithm.hash(b"dispatch");
            assert_eq!(digest.len(), algorithm.hash_length());
            // Deterministic
            assert_eq!(algorithm.hash(b"dispatch"), digest);
            // Sensitive to appended bytes
            assert_ne!(algorithm.hash(b"dispatch!"), digest);
        }
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let algorithms: Vec<Box<dyn HashAlgorithm>> = vec![Box::new(Sha256), Box::new(Sha512), Box::new(Blake2b::default())];
        for algorithm in &algorithms {
            let mut context = algorithm.begin();
            context.update(b"split ");
            context.update(b"across ");
            context.update(b"updates");
            assert_eq!(context.finalize(), algorithm.hash(b"split across updates"));
        }
    }
}
