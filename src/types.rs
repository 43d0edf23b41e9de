//! Common value types shared across the algorithm surfaces.
//!
//! - [`Mac`] and [`HashDigest`]: immutable byte sequences compared in
//!   constant time
//! - [`SecretBox`]: the `(cipher_text, nonce, mac)` envelope produced by
//!   authenticated encryption
//! - [`KeyPair`] / [`PublicKey`] / [`KeyPairType`]: asymmetric key
//!   material and its geometry
//! - [`AlgorithmId`]: the fixed identifier strings used by backend
//!   bridges

use strum::{AsRefStr, Display, EnumString};

use crate::bytes::constant_time_eq;
use crate::error::{CryptoError, Result};
use crate::secret::SecretKey;

/// A message authentication tag.
///
/// Immutable once constructed; equality is constant-time.
#[derive(Clone, Debug, Eq, Default)]
pub struct Mac {
    bytes: Vec<u8>,
}

impl Mac {
    /// The zero-length MAC used by unauthenticated ciphers.
    pub const EMPTY: Self = Self { bytes: Vec::new() };

    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self { bytes: bytes.to_vec() }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for Mac {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.bytes, &other.bytes)
    }
}

/// A hash digest.
///
/// Immutable once constructed; equality is constant-time so digests can
/// double as integrity check values.
#[derive(Clone, Debug, Eq)]
pub struct HashDigest {
    bytes: Vec<u8>,
}

impl HashDigest {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl PartialEq for HashDigest {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.bytes, &other.bytes)
    }
}

/// The output envelope of an authenticated encryption.
///
/// Invariants are enforced by the producing cipher: `nonce` has the
/// cipher's nonce length, `mac` has its MAC length (zero for
/// unauthenticated ciphers), and `cipher_text` has the declared ciphertext
/// length for the clear text that was encrypted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretBox {
    cipher_text: Vec<u8>,
    nonce: Vec<u8>,
    mac: Mac,
}

impl SecretBox {
    #[must_use]
    pub fn new(cipher_text: Vec<u8>, nonce: Vec<u8>, mac: Mac) -> Self {
        Self { cipher_text, nonce, mac }
    }

    #[must_use]
    pub fn cipher_text(&self) -> &[u8] {
        &self.cipher_text
    }

    #[must_use]
    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    #[must_use]
    pub fn mac(&self) -> &Mac {
        &self.mac
    }

    /// Serializes as `nonce || cipher_text || mac`.
    ///
    /// Either boundary can be omitted when the caller transports the nonce
    /// or MAC out of band.
    #[must_use]
    pub fn concatenate(&self, include_nonce: bool, include_mac: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.nonce.len() + self.cipher_text.len() + self.mac.len());
        if include_nonce {
            out.extend_from_slice(&self.nonce);
        }
        out.extend_from_slice(&self.cipher_text);
        if include_mac {
            out.extend_from_slice(self.mac.as_bytes());
        }
        out
    }

    /// Splits `nonce || cipher_text || mac` back into an envelope.
    ///
    /// The split is purely positional: `nonce_length` and `mac_length`
    /// must match the values used when concatenating.
    ///
    /// # Errors
    /// [`CryptoError::InvalidParameter`] when `bytes` is shorter than the
    /// declared nonce plus MAC.
    pub fn from_concatenation(bytes: &[u8], nonce_length: usize, mac_length: usize) -> Result<Self> {
        if bytes.len() < nonce_length + mac_length {
            return Err(CryptoError::InvalidParameter("concatenation shorter than nonce plus mac"));
        }
        let (nonce, rest) = bytes.split_at(nonce_length);
        let (cipher_text, mac) = rest.split_at(rest.len() - mac_length);
        Ok(Self { cipher_text: cipher_text.to_vec(), nonce: nonce.to_vec(), mac: Mac::from_slice(mac) })
    }
}

/// The kind of an asymmetric key pair, with its geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPairType {
    Ed25519,
    X25519,
    P256,
    P384,
    P521,
    /// Recognized for bridge interoperability only; RSA operations are
    /// delegated entirely to platform backends.
    Rsa,
}

impl KeyPairType {
    /// Bit length of the underlying elliptic field (0 for RSA).
    #[must_use]
    pub const fn elliptic_bits(self) -> usize {
        match self {
            Self::Ed25519 | Self::X25519 => 255,
            Self::P256 => 256,
            Self::P384 => 384,
            Self::P521 => 521,
            Self::Rsa => 0,
        }
    }

    /// Expected private-key length in bytes (the seed for Ed25519, the
    /// scalar `d` for NIST curves).
    #[must_use]
    pub const fn private_key_length(self) -> usize {
        match self {
            Self::Ed25519 | Self::X25519 => 32,
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
            Self::Rsa => 0,
        }
    }

    /// Expected public-key length in bytes (compressed point for the
    /// Curve25519 family, `x || y` affine coordinates for NIST curves).
    #[must_use]
    pub const fn public_key_length(self) -> usize {
        match self {
            Self::Ed25519 | Self::X25519 => 32,
            Self::P256 => 64,
            Self::P384 => 96,
            Self::P521 => 132,
            Self::Rsa => 0,
        }
    }

    /// The curve name where one applies.
    #[must_use]
    pub const fn curve_name(self) -> Option<&'static str> {
        match self {
            Self::Ed25519 | Self::X25519 => Some("Curve25519"),
            Self::P256 => Some("P-256"),
            Self::P384 => Some("P-384"),
            Self::P521 => Some("P-521"),
            Self::Rsa => None,
        }
    }
}

/// Public-key material tagged with its key-pair type.
///
/// For NIST curves the bytes are the affine coordinates `x || y`, each
/// big-endian and padded to the curve byte length; for the Curve25519
/// family they are the 32-byte encoded point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    type_: KeyPairType,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// # Errors
    /// [`CryptoError::InvalidKeyLength`] when the byte length does not
    /// match the key-pair type.
    pub fn new(type_: KeyPairType, bytes: Vec<u8>) -> Result<Self> {
        let expected = type_.public_key_length();
        if bytes.len() != expected {
            return Err(CryptoError::InvalidKeyLength { expected, actual: bytes.len() });
        }
        Ok(Self { type_, bytes })
    }

    #[must_use]
    pub fn key_pair_type(&self) -> KeyPairType {
        self.type_
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The affine x coordinate for NIST-curve keys.
    #[must_use]
    pub fn x(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() / 2]
    }

    /// The affine y coordinate for NIST-curve keys.
    #[must_use]
    pub fn y(&self) -> &[u8] {
        &self.bytes[self.bytes.len() / 2..]
    }
}

/// An asymmetric key pair.
///
/// The public half is always re-derivable from the private half; for
/// Ed25519 the private half is the 32-byte seed from which the expanded
/// signing key is derived on demand.
#[derive(Debug, Clone)]
pub struct KeyPair {
    type_: KeyPairType,
    private_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// # Errors
    /// [`CryptoError::InvalidKeyLength`] when either half has the wrong
    /// length for the type.
    pub fn new(type_: KeyPairType, private_key: SecretKey, public_key: PublicKey) -> Result<Self> {
        let expected = type_.private_key_length();
        if private_key.length() != expected {
            return Err(CryptoError::InvalidKeyLength { expected, actual: private_key.length() });
        }
        if public_key.key_pair_type() != type_ {
            return Err(CryptoError::InvalidParameter("public key type does not match key pair type"));
        }
        Ok(Self { type_, private_key, public_key })
    }

    #[must_use]
    pub fn key_pair_type(&self) -> KeyPairType {
        self.type_
    }

    #[must_use]
    pub fn private_key(&self) -> &SecretKey {
        &self.private_key
    }

    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

/// Fixed algorithm identifier strings, as used by backend bridges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
pub enum AlgorithmId {
    #[strum(serialize = "aesCbc")]
    AesCbc,
    #[strum(serialize = "aesCtr")]
    AesCtr,
    #[strum(serialize = "aesGcm")]
    AesGcm,
    #[strum(serialize = "chacha20")]
    Chacha20,
    #[strum(serialize = "chacha20Poly1305Aead")]
    Chacha20Poly1305Aead,
    #[strum(serialize = "xchacha20")]
    Xchacha20,
    #[strum(serialize = "xchacha20Poly1305Aead")]
    Xchacha20Poly1305Aead,
    #[strum(serialize = "ed25519")]
    Ed25519,
    #[strum(serialize = "x25519")]
    X25519,
    #[strum(serialize = "ecdhP256")]
    EcdhP256,
    #[strum(serialize = "ecdhP384")]
    EcdhP384,
    #[strum(serialize = "ecdhP521")]
    EcdhP521,
    #[strum(serialize = "ecdsaP256")]
    EcdsaP256,
    #[strum(serialize = "ecdsaP384")]
    EcdsaP384,
    #[strum(serialize = "ecdsaP521")]
    EcdsaP521,
    #[strum(serialize = "sha1")]
    Sha1,
    #[strum(serialize = "sha224")]
    Sha224,
    #[strum(serialize = "sha256")]
    Sha256,
    #[strum(serialize = "sha384")]
    Sha384,
    #[strum(serialize = "sha512")]
    Sha512,
    #[strum(serialize = "blake2b")]
    Blake2b,
    #[strum(serialize = "blake2s")]
    Blake2s,
    #[strum(serialize = "hmac")]
    Hmac,
    #[strum(serialize = "hkdf")]
    Hkdf,
    #[strum(serialize = "pbkdf2")]
    Pbkdf2,
    #[strum(serialize = "argon2id")]
    Argon2id,
    #[strum(serialize = "poly1305")]
    Poly1305,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_constant_time_equality() {
        let a = Mac::from_slice(&[1, 2, 3]);
        let b = Mac::from_slice(&[1, 2, 3]);
        let c = Mac::from_slice(&[1, 2, 4]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(Mac::EMPTY, Mac::new(Vec::new()));
    }

    #[test]
    fn test_secret_box_concatenation_roundtrip() {
        let sb = SecretBox::new(vec![1, 2, 3, 4, 5], vec![9; 12], Mac::from_slice(&[7; 16]));
        let joined = sb.concatenate(true, true);
        assert_eq!(joined.len(), 12 + 5 + 16);
        let split = SecretBox::from_concatenation(&joined, 12, 16).unwrap();
        assert_eq!(split, sb);
    }

    #[test]
    fn test_secret_box_concatenation_without_nonce() {
        let sb = SecretBox::new(vec![1, 2, 3], vec![9; 12], Mac::from_slice(&[7; 16]));
        let joined = sb.concatenate(false, true);
        assert_eq!(joined.len(), 3 + 16);
        let split = SecretBox::from_concatenation(&joined, 0, 16).unwrap();
        assert_eq!(split.cipher_text(), sb.cipher_text());
        assert_eq!(split.mac(), sb.mac());
        assert!(split.nonce().is_empty());
    }

    #[test]
    fn test_secret_box_split_too_short() {
        assert!(SecretBox::from_concatenation(&[0u8; 10], 12, 16).is_err());
    }

    #[test]
    fn test_key_pair_type_geometry() {
        assert_eq!(KeyPairType::P256.public_key_length(), 64);
        assert_eq!(KeyPairType::P521.private_key_length(), 66);
        assert_eq!(KeyPairType::Ed25519.elliptic_bits(), 255);
        assert_eq!(KeyPairType::P384.curve_name(), Some("P-384"));
    }

    #[test]
    fn test_public_key_coordinates() {
        let mut bytes = vec![0xaa; 32];
        bytes.extend_from_slice(&[0xbb; 32]);
        let key = PublicKey::new(KeyPairType::P256, bytes).unwrap();
        assert_eq!(key.x(), &[0xaa; 32]);
        assert_eq!(key.y(), &[0xbb; 32]);
    }

    #[test]
    fn test_algorithm_id_strings() {
        assert_eq!(AlgorithmId::Chacha20Poly1305Aead.as_ref(), "chacha20Poly1305Aead");
        assert_eq!(AlgorithmId::EcdsaP521.to_string(), "ecdsaP521");
        assert_eq!("aesGcm".parse::<AlgorithmId>().unwrap(), AlgorithmId::AesGcm);
    }
}
