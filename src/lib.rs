//! CipherBox - Cryptographic primitives behind one algorithm-agnostic API.
//!
//! A pure-Rust implementation of the common symmetric and asymmetric
//! building blocks, bound together by a small set of dispatch traits:
//! - AES-CBC/CTR/GCM, ChaCha20/XChaCha20 and their Poly1305 AEADs
//! - SHA-1/SHA-2 and BLAKE2b/BLAKE2s hashing, keyed or plain
//! - HMAC, HKDF, PBKDF2 and Argon2id key derivation
//! - X25519/Ed25519 and NIST P-256/384/521 key agreement and signatures
//! - A `SecretBox` envelope and an async chunk-streaming processor

pub mod bytes;
pub mod cipher;
pub mod config;
pub mod ecc;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod mac;
pub mod padding;
pub mod primitive;
pub mod random;
pub mod secret;
pub mod stream;
pub mod types;

pub use cipher::Cipher;
pub use ecc::{KeyExchange, Signature};
pub use error::{CryptoError, Result};
pub use hash::HashAlgorithm;
pub use kdf::Kdf;
pub use mac::MacAlgorithm;
pub use secret::SecretKey;
pub use types::{KeyPair, KeyPairType, Mac, PublicKey, SecretBox};
