//! Fresh per-request key material.
//!
//! Every query draws a brand-new AES-256 key and CTR initial counter
//! block from the operating system RNG.  If the OS RNG fails we return
//! `OtaError::Entropy` rather than falling back to anything weaker.

use std::fmt;

use rand::rngs::OsRng;
use rand::TryRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{OtaError, Result};

/// Length of the symmetric key in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Length of the initialization vector in bytes (one AES block).
pub const IV_LEN: usize = 16;

/// An ephemeral AES-256 key, wiped from memory when dropped.
///
/// Not `Clone`: a key belongs to exactly one request.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_LEN],
}

impl SymmetricKey {
    /// Draw a new random key from the OS RNG.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_LEN];
        fill_random(&mut bytes)?;
        Ok(Self { bytes })
    }

    /// Rebuild a key from raw bytes, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            OtaError::Decryption(format!(
                "symmetric key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// The CTR initial counter block.  Not secret; sent alongside the ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InitVector([u8; IV_LEN]);

impl InitVector {
    /// Draw a new random IV from the OS RNG.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; IV_LEN];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Rebuild an IV from bytes received on the wire.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; IV_LEN] = bytes.try_into().map_err(|_| {
            OtaError::Decryption(format!("IV must be {IV_LEN} bytes, got {}", bytes.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }
}

/// Convenience wrapper matching the other primitives' free-function style.
pub fn new_key() -> Result<SymmetricKey> {
    SymmetricKey::generate()
}

/// Convenience wrapper matching the other primitives' free-function style.
pub fn new_iv() -> Result<InitVector> {
    InitVector::generate()
}

fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| OtaError::Entropy(format!("OS RNG failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_lengths_match_cipher() {
        let key = new_key().unwrap();
        let iv = new_iv().unwrap();
        assert_eq!(key.as_bytes().len(), KEY_LEN);
        assert_eq!(iv.as_bytes().len(), IV_LEN);
    }

    #[test]
    fn two_keys_differ() {
        let a = new_key().unwrap();
        let b = new_key().unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn key_from_slice_rejects_wrong_length() {
        assert!(SymmetricKey::from_slice(&[0u8; 16]).is_err());
        assert!(SymmetricKey::from_slice(&[0u8; KEY_LEN]).is_ok());
    }

    #[test]
    fn iv_from_slice_rejects_wrong_length() {
        assert!(InitVector::from_slice(&[0u8; 12]).is_err());
        assert!(InitVector::from_slice(&[7u8; IV_LEN]).is_ok());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = SymmetricKey::from_slice(&[0xAB; KEY_LEN]).unwrap();
        let shown = format!("{key:?}");
        assert!(!shown.contains("171"));
        assert!(shown.contains("redacted"));
    }
}
