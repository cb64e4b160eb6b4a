//! Negotiation metadata: scene name → protected-key record.
//!
//! Serialized into the `protectedKey` request header as
//!
//! ```text
//! {"SCENE_1":{"protectedKey":"<base64>","version":"1","negotiationVersion":"1615879139745"}}
//! ```
//!
//! The server rejects a request whose scenes it does not recognise, so
//! every scene named here must have a record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{OtaError, Result};

/// The key-exchange scene the update endpoint currently expects.
pub const DEFAULT_SCENE: &str = "SCENE_1";

/// One scene's protected key and the versions needed to unwrap it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationRecord {
    /// Base64 RSA-OAEP blob.
    pub protected_key: String,
    /// Protected-key encoding version.
    pub version: String,
    /// Public-key version, selects the server's private key.
    pub negotiation_version: String,
}

/// Scene → record map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NegotiationMetadata {
    scenes: BTreeMap<String, NegotiationRecord>,
}

impl NegotiationMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scene: impl Into<String>, record: NegotiationRecord) {
        self.scenes.insert(scene.into(), record);
    }

    pub fn get(&self, scene: &str) -> Option<&NegotiationRecord> {
        self.scenes.get(scene)
    }

    pub fn scenes(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Compact JSON for the `protectedKey` header.
    pub fn to_header_value(&self) -> Result<String> {
        if self.scenes.is_empty() {
            return Err(OtaError::KeyProtection(
                "negotiation metadata has no scenes".into(),
            ));
        }
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the `protectedKey` header back (server side, tests).
    pub fn from_header_value(value: &str) -> Result<Self> {
        serde_json::from_str(value)
            .map_err(|e| OtaError::ResponseFormat(format!("bad protectedKey header: {e}")))
    }
}
