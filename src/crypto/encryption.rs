//! AES-256-CTR payload encryption.
//!
//! The update servers expect AES-256 in counter mode with a 128-bit
//! big-endian counter and no padding, so ciphertext length always equals
//! plaintext length.
//!
//! CTR mode has no authentication tag.  A flipped bit in the ciphertext
//! or IV decrypts to garbage without any error here; integrity of the
//! exchange rests on the TLS channel underneath.  Adding an AEAD layer
//! would change the wire format the servers accept.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};

use super::random::{InitVector, SymmetricKey};
use crate::errors::{OtaError, Result};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Encrypt `plaintext` under `(key, iv)`.
///
/// Returns ciphertext of exactly `plaintext.len()` bytes.
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey, iv: &InitVector) -> Result<Vec<u8>> {
    apply(plaintext, key.as_bytes(), iv.as_bytes())
        .map_err(|e| OtaError::Encryption(format!("invalid key or IV length: {e}")))
}

/// Decrypt data produced by `encrypt` with the same `(key, iv)`.
pub fn decrypt(ciphertext: &[u8], key: &SymmetricKey, iv: &InitVector) -> Result<Vec<u8>> {
    apply(ciphertext, key.as_bytes(), iv.as_bytes())
        .map_err(|e| OtaError::Decryption(format!("invalid key or IV length: {e}")))
}

// CTR is symmetric: the same keystream XOR both encrypts and decrypts.
fn apply(
    input: &[u8],
    key: &[u8],
    iv: &[u8],
) -> std::result::Result<Vec<u8>, ctr::cipher::InvalidLength> {
    let mut cipher = Aes256Ctr::new_from_slices(key, iv)?;
    let mut buf = input.to_vec();
    cipher.apply_keystream(&mut buf);
    Ok(buf)
}
