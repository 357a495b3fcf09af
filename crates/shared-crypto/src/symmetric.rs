//! # Symmetric Decryption
//!
//! AES-128 in CBC mode with PKCS#7 padding, the cipher the upstream
//! notification service uses for event bodies.
//!
//! Keys and IVs arrive base64-encoded (key from the key service, IV from the
//! envelope header) and are decoded with [`decode_base64`] before use.

use crate::CryptoError;
use aes::Aes128;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::{Zeroize, ZeroizeOnDrop};

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;

/// AES-128 key length in bytes.
pub const KEY_LEN: usize = 16;

/// AES block (and CBC IV) length in bytes.
pub const BLOCK_LEN: usize = 16;

/// Secret key (128-bit).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking the length.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` unless the slice is 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Decode a base64 key as delivered by the key service.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let mut raw = decode_base64("key", encoded)?;
        let key = Self::from_slice(&raw);
        raw.zeroize();
        key
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// CBC initialization vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Iv([u8; BLOCK_LEN]);

impl Iv {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; BLOCK_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; BLOCK_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidIvLength {
                    expected: BLOCK_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Decode a base64 IV as carried in the envelope header.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        Self::from_slice(&decode_base64("IV", encoded)?)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; BLOCK_LEN] {
        &self.0
    }
}

/// Decode standard base64, ignoring surrounding whitespace.
///
/// # Errors
///
/// Returns `CryptoError::InvalidEncoding` naming `field`.
pub fn decode_base64(field: &'static str, encoded: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| CryptoError::InvalidEncoding {
            field,
            reason: e.to_string(),
        })
}

/// Decrypt AES-128-CBC ciphertext and strip PKCS#7 padding.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` if the ciphertext is not a whole
/// number of blocks or the padding is invalid (typically a wrong key).
pub fn decrypt(key: &SecretKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::DecryptionFailed(format!(
            "ciphertext length {} is not a positive multiple of {}",
            ciphertext.len(),
            BLOCK_LEN
        )));
    }

    Aes128CbcDec::new(key.as_bytes().into(), iv.as_bytes().into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed("invalid padding".to_string()))
}

/// Encrypt with AES-128-CBC and PKCS#7 padding.
///
/// Used to build fixtures and by replay tooling; the consumer itself only
/// decrypts.
pub fn encrypt(key: &SecretKey, iv: &Iv, plaintext: &[u8]) -> Vec<u8> {
    Aes128CbcEnc::new(key.as_bytes().into(), iv.as_bytes().into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}
