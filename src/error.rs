//! Error taxonomy shared by every algorithm surface.
//!
//! Parameter-shape violations are reported eagerly at the API boundary;
//! cryptographic failures (authentication, padding, weak keys) are the
//! operation's error return and deliberately carry no detail that could
//! feed a decryption oracle. Signature verification never errors on a
//! non-matching signature: it returns `Ok(false)`.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Every failure the library can surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Secret key material has the wrong length for the algorithm.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Nonce / IV has the wrong length for the algorithm.
    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    /// AES-CTR counter width outside `[1, 128]` bits.
    #[error("invalid counter bits: {0} (must be in 1..=128)")]
    InvalidCounterBits(u32),

    /// Requested digest length outside the algorithm's range.
    #[error("invalid hash length: {actual} (must be in {min}..={max})")]
    InvalidHashLength { actual: usize, min: usize, max: usize },

    /// A parameter combination the algorithm rejects (e.g. Argon2 memory
    /// below `8 * parallelism`).
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// Associated data passed to an algorithm that cannot authenticate it.
    #[error("associated data is not supported by this algorithm")]
    AadUnsupported,

    /// Non-zero keystream index given to a cipher without random access.
    #[error("key stream index is not supported by this algorithm")]
    KeyStreamIndexUnsupported,

    /// Block padding was inconsistent during CBC decryption.
    #[error("bad padding")]
    BadPadding,

    /// MAC or AEAD tag mismatch. No plaintext was released.
    #[error("message authentication failed")]
    AuthFailure,

    /// Key agreement produced a degenerate (all-zero) shared secret.
    #[error("weak public key rejected")]
    WeakKey,

    /// A public key does not satisfy its curve equation.
    #[error("point is not on the curve")]
    PointNotOnCurve,

    /// Access to secret material after `destroy()`.
    #[error("secret has been destroyed")]
    Destroyed,

    /// HKDF output longer than `255 * hash_length`.
    #[error("requested output of {requested} bytes exceeds maximum of {max}")]
    OutputTooLong { requested: usize, max: usize },

    /// Algorithm or parameter combination not implemented here.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_lengths() {
        let err = CryptoError::InvalidKeyLength { expected: 32, actual: 16 };
        assert_eq!(err.to_string(), "invalid key length: expected 32, got 16");
    }

    #[test]
    fn test_kinds_are_matchable() {
        let err = CryptoError::AuthFailure;
        assert!(matches!(err, CryptoError::AuthFailure));
        assert_ne!(CryptoError::AuthFailure, CryptoError::BadPadding);
    }
}
