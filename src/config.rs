//! Crate-wide cryptographic constants.
//!
//! These constants are the single source of truth for block, key, nonce
//! and tag geometry across the algorithm implementations. Per-algorithm
//! tunables (counter width, digest length, Argon2 costs) live on the
//! algorithm structs themselves; only values that several modules must
//! agree on belong here.

/// AES block size in bytes.
///
/// Fixed at 16 bytes (128 bits) for every AES key size; the CBC, CTR and
/// GCM mode engines all derive their chunking from this value.
pub const AES_BLOCK_SIZE: usize = 16;

/// Standard AES-GCM nonce size in bytes.
///
/// 12 bytes (96 bits) as recommended by NIST SP 800-38D. GCM accepts other
/// lengths through the GHASH-derived pre-counter path, but 12 bytes avoids
/// that extra hashing step and is what interoperating systems expect.
pub const GCM_STANDARD_NONCE_SIZE: usize = 12;

/// GCM authentication tag size in bytes (128 bits, untruncated).
pub const GCM_TAG_SIZE: usize = 16;

/// ChaCha20 key size in bytes (256 bits).
pub const CHACHA_KEY_SIZE: usize = 32;

/// ChaCha20 keystream block size in bytes.
pub const CHACHA_BLOCK_SIZE: usize = 64;

/// IETF ChaCha20 nonce size in bytes (96 bits, RFC 8439).
pub const CHACHA_NONCE_SIZE: usize = 12;

/// Extended nonce size for XChaCha20 in bytes.
///
/// 24 bytes (192 bits) makes random nonces collision-safe at any realistic
/// message volume, unlike the 12-byte IETF nonce.
pub const XCHACHA_NONCE_SIZE: usize = 24;

/// Poly1305 one-time key size in bytes.
pub const POLY1305_KEY_SIZE: usize = 32;

/// Poly1305 tag size in bytes.
pub const POLY1305_TAG_SIZE: usize = 16;

/// Default counter width for AES-CTR in bits.
///
/// The low 64 bits of the 16-byte counter block form the block counter;
/// the high 64 bits carry the caller's IV untouched.
pub const CTR_DEFAULT_COUNTER_BITS: u32 = 64;

/// Bytes of DRBG output between reseeds from the operating system.
///
/// 1 MiB keeps reseeding far off the hot path while bounding how much
/// output any one internal key can ever produce.
pub const DRBG_RESEED_INTERVAL: u64 = 1024 * 1024;

/// Bytes of stream input processed between cooperative yields.
///
/// The chunk processor hands the scheduler back control after every 4 MiB
/// so a large encryption cannot monopolize an async worker thread.
pub const STREAM_YIELD_INTERVAL: usize = 4 * 1024 * 1024;

/// Argon2 memory block size in bytes (1 KiB, RFC 9106).
pub const ARGON2_BLOCK_SIZE: usize = 1024;

/// Argon2 slices per lane per pass (the "sync points", RFC 9106).
pub const ARGON2_SYNC_POINTS: u32 = 4;

/// Argon2 version implemented by this crate (0x13).
pub const ARGON2_VERSION: u32 = 0x13;
