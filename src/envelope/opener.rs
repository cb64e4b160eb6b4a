//! Reply decryption.
//!
//! The server answers with
//!
//! ```text
//! {"responseCode":200,"errMsg":null,"body":"{\"cipher\":\"<base64>\",\"iv\":\"<base64>\"}"}
//! ```
//!
//! where `body` is encrypted with the request's symmetric key and the
//! reply's own IV.  `body` may also arrive as an object rather than a
//! JSON string; both are accepted.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::crypto::{self, InitVector, SymmetricKey};
use crate::errors::{OtaError, Result};

/// How much of an unparseable reply to quote in the error.
const SNIPPET_LEN: usize = 120;

/// Plaintext recovered from a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedResponse(Vec<u8>);

impl DecryptedResponse {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse as JSON; non-JSON plaintext becomes a JSON string.
    pub fn to_json(&self) -> Value {
        serde_json::from_slice(&self.0)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.0).into_owned()))
    }
}

/// Top-level reply object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseResult {
    #[serde(default)]
    pub response_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_msg: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl ResponseResult {
    /// Parse raw reply bytes.  Anything that is not a JSON object (HTML
    /// error pages, proxies' plain-text errors) is a `ResponseFormat` error.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let value = parse_object(raw)?;
        serde_json::from_value(value)
            .map_err(|e| OtaError::ResponseFormat(format!("unexpected reply shape: {e}")))
    }

    /// Decrypt `body` in place with the request's key.
    ///
    /// A reply without a body (typically an error code) is left as is.
    /// On failure the body is left untouched.
    pub fn decrypt_body(&mut self, key: &SymmetricKey) -> Result<()> {
        let Some(body) = &self.body else {
            debug!(code = self.response_code, "reply has no body to decrypt");
            return Ok(());
        };

        let plaintext = decrypt_value(body, key)?;
        self.body = Some(plaintext.to_json());
        Ok(())
    }

    pub fn is_success(&self) -> bool {
        self.response_code == 200
    }
}

/// Decrypt a raw reply.  Accepts the usual `{responseCode, body}` wrapper
/// or a bare `{cipher, iv}` object.
pub fn open(raw: &[u8], key: &SymmetricKey) -> Result<DecryptedResponse> {
    let value = parse_object(raw)?;
    let Value::Object(map) = &value else {
        return Err(OtaError::ResponseFormat("reply is not a JSON object".into()));
    };

    if map.contains_key("cipher") {
        return decrypt_value(&value, key);
    }

    match map.get("body") {
        Some(body) if !body.is_null() => decrypt_value(body, key),
        _ => Err(OtaError::ResponseFormat(format!(
            "reply has no encrypted body (responseCode {}, errMsg {})",
            map.get("responseCode").unwrap_or(&Value::Null),
            map.get("errMsg").unwrap_or(&Value::Null)
        ))),
    }
}

#[derive(Deserialize)]
struct EncryptedBody {
    cipher: String,
    #[serde(default)]
    iv: Option<String>,
}

fn decrypt_value(body: &Value, key: &SymmetricKey) -> Result<DecryptedResponse> {
    let encrypted: EncryptedBody = match body {
        Value::String(text) => serde_json::from_str(text),
        other => serde_json::from_value(other.clone()),
    }
    .map_err(|e| OtaError::ResponseFormat(format!("body is not a {{cipher, iv}} object: {e}")))?;

    let iv_text = encrypted
        .iv
        .ok_or_else(|| OtaError::ResponseFormat("encrypted body has no iv".into()))?;

    let ciphertext = BASE64
        .decode(encrypted.cipher.trim())
        .map_err(|e| OtaError::ResponseFormat(format!("cipher is not base64: {e}")))?;
    let iv_bytes = BASE64
        .decode(iv_text.trim())
        .map_err(|e| OtaError::ResponseFormat(format!("iv is not base64: {e}")))?;
    let iv = InitVector::from_slice(&iv_bytes)?;

    let plaintext = crypto::decrypt(&ciphertext, key, &iv)?;
    debug!(len = plaintext.len(), "reply decrypted");
    Ok(DecryptedResponse(plaintext))
}

/// Parse raw bytes as JSON, requiring a top-level object.
fn parse_object(raw: &[u8]) -> Result<Value> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| {
        OtaError::ResponseFormat(format!("{e}; reply starts with: {:?}", snippet(raw)))
    })?;
    if !value.is_object() {
        return Err(OtaError::ResponseFormat(format!(
            "reply is not a JSON object; reply starts with: {:?}",
            snippet(raw)
        )));
    }
    Ok(value)
}

fn snippet(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.chars().take(SNIPPET_LEN).collect()
}
