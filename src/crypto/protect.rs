//! RSA-OAEP key wrapping.
//!
//! The ephemeral AES key is base64-encoded and the resulting text is
//! encrypted with RSA-OAEP (SHA-1, MGF1-SHA-1) under the region's public
//! key.  The server decrypts it with its private key, matched via the
//! negotiation version sent next to it.
//!
//! Public keys are accepted as SPKI PEM (`BEGIN PUBLIC KEY`), PKCS#1 PEM
//! (`BEGIN RSA PUBLIC KEY`), or bare base64 of either DER encoding.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;

use super::random::SymmetricKey;
use crate::errors::{OtaError, Result};

/// Encoding/algorithm version of the protected key, sent as `version`
/// inside each negotiation record.  Static for this protocol revision.
pub const PROTECTED_KEY_VERSION: &str = "1";

/// An RSA-wrapped symmetric key, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedKey(Vec<u8>);

impl ProtectedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Standard base64, as carried in the `protectedKey` header.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }
}

/// A parsed region public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    key: RsaPublicKey,
}

impl PublicKeyMaterial {
    /// Parse key material in any of the accepted encodings.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(OtaError::KeyProtection("public key is empty".into()));
        }

        let key = if text.starts_with("-----BEGIN") {
            RsaPublicKey::from_public_key_pem(text)
                .or_else(|_| RsaPublicKey::from_pkcs1_pem(text))
                .map_err(|e| OtaError::KeyProtection(format!("malformed PEM public key: {e}")))?
        } else {
            let compact: String = text.split_whitespace().collect();
            let der = BASE64.decode(compact.as_bytes()).map_err(|e| {
                OtaError::KeyProtection(format!("public key is neither PEM nor base64: {e}"))
            })?;
            RsaPublicKey::from_public_key_der(&der)
                .or_else(|_| RsaPublicKey::from_pkcs1_der(&der))
                .map_err(|e| OtaError::KeyProtection(format!("malformed DER public key: {e}")))?
        };

        Ok(Self { key })
    }

    /// Modulus size in bytes; every protected key has exactly this length.
    pub fn modulus_len(&self) -> usize {
        self.key.size()
    }

    /// Re-encode as SPKI PEM.
    pub fn to_pem(&self) -> Result<String> {
        self.key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| OtaError::KeyProtection(format!("cannot encode public key: {e}")))
    }

    /// Re-encode as PKCS#1 PEM.
    pub fn to_pkcs1_pem(&self) -> Result<String> {
        self.key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| OtaError::KeyProtection(format!("cannot encode public key: {e}")))
    }
}

impl From<RsaPublicKey> for PublicKeyMaterial {
    fn from(key: RsaPublicKey) -> Self {
        Self { key }
    }
}

/// Wrap `key` under `public_key`.
///
/// OAEP padding is randomized, so two calls give different blobs that
/// both unwrap to the same key.
pub fn protect_key(key: &SymmetricKey, public_key: &PublicKeyMaterial) -> Result<ProtectedKey> {
    let encoded = zeroize::Zeroizing::new(BASE64.encode(key.as_bytes()));
    let wrapped = public_key
        .key
        .encrypt(&mut OsRng, Oaep::new::<Sha1>(), encoded.as_bytes())
        .map_err(|e| OtaError::KeyProtection(format!("RSA-OAEP encryption failed: {e}")))?;
    Ok(ProtectedKey(wrapped))
}

/// Recover the symmetric key from a protected key.  This is the server's
/// half of the exchange, used to test and simulate the protocol.
pub fn unwrap_key(protected: &ProtectedKey, private_key: &RsaPrivateKey) -> Result<SymmetricKey> {
    let encoded = zeroize::Zeroizing::new(
        private_key
            .decrypt(Oaep::new::<Sha1>(), protected.as_bytes())
            .map_err(|e| OtaError::Decryption(format!("RSA-OAEP decryption failed: {e}")))?,
    );
    let raw = zeroize::Zeroizing::new(
        BASE64
            .decode(encoded.as_slice())
            .map_err(|e| OtaError::Decryption(format!("wrapped key is not base64: {e}")))?,
    );
    SymmetricKey::from_slice(&raw)
}

/// Decode a base64 protected key as found in the `protectedKey` header.
pub fn protected_key_from_base64(text: &str) -> Result<ProtectedKey> {
    BASE64
        .decode(text.as_bytes())
        .map(ProtectedKey)
        .map_err(|e| OtaError::ResponseFormat(format!("protected key is not base64: {e}")))
}
