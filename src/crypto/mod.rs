//! Cryptographic primitives for the update-check envelope.
//!
//! This module provides:
//! - Fresh per-request key material (`random`)
//! - RSA-OAEP wrapping of the symmetric key (`protect`)
//! - AES-256-CTR payload encryption and decryption (`encryption`)

pub mod encryption;
pub mod protect;
pub mod random;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, protect_key, ...};
pub use encryption::{decrypt, encrypt};
pub use protect::{
    protect_key, unwrap_key, ProtectedKey, PublicKeyMaterial, PROTECTED_KEY_VERSION,
};
pub use random::{new_iv, new_key, InitVector, SymmetricKey, IV_LEN, KEY_LEN};
