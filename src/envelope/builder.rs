//! Outbound envelope assembly.
//!
//! Wire layout of one request:
//!
//! ```text
//! POST https://{host}/update/v6
//! headers:  language, otaVersion, model, ..., protectedKey: {"SCENE_1": {...}}
//! body:     {"params": "{\"cipher\":\"<base64>\",\"iv\":\"<base64>\"}"}
//! ```
//!
//! The symmetric key never leaves the process in the clear.  It is handed
//! back inside `SealedRequest` so the reply can be decrypted, and is
//! wiped when that value is dropped.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scene::{NegotiationMetadata, NegotiationRecord, DEFAULT_SCENE};
use crate::crypto::{self, InitVector, SymmetricKey, PROTECTED_KEY_VERSION};
use crate::errors::{OtaError, Result};
use crate::region::EndpointConfig;

/// Header carrying the serialized negotiation metadata.
pub const PROTECTED_KEY_HEADER: &str = "protectedKey";

const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Encrypted payload and its IV, both base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherBody {
    pub cipher: String,
    pub iv: String,
}

/// Outer request body: the `CipherBody` JSON as a string field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OuterBody {
    pub params: String,
}

/// A ready-to-send request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// JSON text of `OuterBody`.
    pub body: String,
}

impl Envelope {
    /// Parse the negotiation metadata back out of the headers.
    pub fn negotiation(&self) -> Result<NegotiationMetadata> {
        let value = self.headers.get(PROTECTED_KEY_HEADER).ok_or_else(|| {
            OtaError::ResponseFormat(format!("missing {PROTECTED_KEY_HEADER} header"))
        })?;
        NegotiationMetadata::from_header_value(value)
    }

    /// Parse the inner `{cipher, iv}` back out of the body.
    pub fn cipher_body(&self) -> Result<CipherBody> {
        let outer: OuterBody = serde_json::from_str(&self.body)?;
        Ok(serde_json::from_str(&outer.params)?)
    }
}

/// An envelope plus the key that protects it.
#[derive(Debug)]
pub struct SealedRequest {
    pub envelope: Envelope,
    key: SymmetricKey,
}

impl SealedRequest {
    /// The request's symmetric key, needed to open the reply.
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    pub fn into_parts(self) -> (Envelope, SymmetricKey) {
        (self.envelope, self.key)
    }
}

/// Builds the envelope for one request against one endpoint.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder<'a> {
    endpoint: &'a EndpointConfig,
    scenes: Vec<String>,
    headers: BTreeMap<String, String>,
}

impl<'a> EnvelopeBuilder<'a> {
    /// A builder using the default scene and no extra headers.
    pub fn new(endpoint: &'a EndpointConfig) -> Self {
        Self {
            endpoint,
            scenes: vec![DEFAULT_SCENE.to_string()],
            headers: BTreeMap::new(),
        }
    }

    /// Replace the scene list.  Each scene gets its own record wrapping
    /// the same request key.
    pub fn scenes<I, S>(mut self, scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scenes = scenes.into_iter().map(Into::into).collect();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Encrypt `plaintext` under a fresh key and IV and build the envelope.
    ///
    /// Any failure aborts the whole envelope; nothing partial is returned.
    pub fn seal(self, plaintext: &[u8]) -> Result<SealedRequest> {
        if self.scenes.is_empty() {
            return Err(OtaError::KeyProtection(
                "at least one negotiation scene is required".into(),
            ));
        }

        // 1. Fresh key material.
        let key = crypto::new_key()?;
        let iv = crypto::new_iv()?;

        // 2-3. Wrap the key once per scene.
        let negotiation = self.negotiate(&key)?;

        // 4-5. Encrypt the payload.
        let ciphertext = crypto::encrypt(plaintext, &key, &iv)?;
        debug!(
            region = %self.endpoint.region,
            plaintext_len = plaintext.len(),
            "payload encrypted"
        );

        // 6. Headers and body.
        let body = encode_body(&ciphertext, &iv)?;

        let mut headers = self.headers;
        headers.insert("Content-Type".to_string(), CONTENT_TYPE.to_string());
        headers.insert(
            PROTECTED_KEY_HEADER.to_string(),
            negotiation.to_header_value()?,
        );

        let envelope = Envelope {
            url: self.endpoint.url(),
            headers,
            body,
        };
        debug!(url = %envelope.url, headers = envelope.headers.len(), "envelope sealed");

        Ok(SealedRequest { envelope, key })
    }

    fn negotiate(&self, key: &SymmetricKey) -> Result<NegotiationMetadata> {
        let mut metadata = NegotiationMetadata::new();
        for scene in &self.scenes {
            let protected = crypto::protect_key(key, &self.endpoint.public_key)?;
            debug!(scene = %scene, protected_len = protected.len(), "key protected");
            metadata.insert(
                scene.clone(),
                NegotiationRecord {
                    protected_key: protected.to_base64(),
                    version: PROTECTED_KEY_VERSION.to_string(),
                    negotiation_version: self.endpoint.public_key_version.clone(),
                },
            );
        }
        Ok(metadata)
    }
}

fn encode_body(ciphertext: &[u8], iv: &InitVector) -> Result<String> {
    let inner = CipherBody {
        cipher: BASE64.encode(ciphertext),
        iv: BASE64.encode(iv.as_bytes()),
    };
    let outer = OuterBody {
        params: serde_json::to_string(&inner)?,
    };
    Ok(serde_json::to_string(&outer)?)
}
