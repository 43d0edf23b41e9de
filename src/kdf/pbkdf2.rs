//! PBKDF2 (RFC 8018) over any [`MacAlgorithm`].

use std::sync::Arc;

use zeroize::Zeroize;

use crate::bytes;
use crate::error::{CryptoError, Result};
use crate::kdf::Kdf;
use crate::mac::MacAlgorithm;
use crate::secret::SecretKey;
use crate::types::AlgorithmId;

/// PBKDF2 with its MAC, iteration count and output size fixed at
/// construction.
///
/// The output size is given in bits, RFC-style; it must be a positive
/// multiple of 8 and at least 64.
pub struct Pbkdf2 {
    mac: Arc<dyn MacAlgorithm>,
    iterations: u32,
    bits: usize,
}

impl Pbkdf2 {
    /// # Errors
    /// [`CryptoError::InvalidParameter`] for zero iterations, fewer than
    /// 64 bits, or a bit count that is not a whole number of bytes.
    pub fn new(mac: Arc<dyn MacAlgorithm>, iterations: u32, bits: usize) -> Result<Self> {
        if iterations < 1 {
            return Err(CryptoError::InvalidParameter("PBKDF2 iterations must be at least 1"));
        }
        if bits < 64 {
            return Err(CryptoError::InvalidParameter("PBKDF2 output must be at least 64 bits"));
        }
        if bits % 8 != 0 {
            return Err(CryptoError::InvalidParameter("PBKDF2 output bits must be a multiple of 8"));
        }
        if mac.mac_length() == 0 {
            return Err(CryptoError::InvalidParameter("PBKDF2 needs a MAC with output"));
        }
        Ok(Self { mac, iterations, bits })
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Kdf for Pbkdf2 {
    fn algorithm(&self) -> AlgorithmId {
        AlgorithmId::Pbkdf2
    }

    fn output_length(&self) -> usize {
        self.bits / 8
    }

    fn derive_key(&self, secret: &[u8], salt: &[u8]) -> Result<SecretKey> {
        let password = SecretKey::from_slice(secret);
        let mac_length = self.mac.mac_length();
        let output_length = self.output_length();
        let block_count = output_length.div_ceil(mac_length);

        let mut output = Vec::with_capacity(block_count * mac_length);
        for block_index in 1..=block_count as u32 {
            // U_1 = MAC(salt || big-endian block index)
            let mut salted = Vec::with_capacity(salt.len() + 4);
            salted.extend_from_slice(salt);
            salted.extend_from_slice(&block_index.to_be_bytes());

            let mut u = self.mac.compute(&salted, &password, &[], &[])?.as_bytes().to_vec();
            let mut t = u.clone();
            for _ in 1..self.iterations {
                // U_j = MAC(U_{j-1}); T ^= U_j
                u = self.mac.compute(&u, &password, &[], &[])?.as_bytes().to_vec();
                bytes::xor_in_place(&mut t, &u);
            }
            output.extend_from_slice(&t);
            t.zeroize();
            u.zeroize();
        }

        output.truncate(output_length);
        Ok(SecretKey::new(output))
    }
}
