//! Logical query fields: normalization, request headers and the
//! plaintext payload that gets encrypted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::region::{EndpointConfig, Region};

/// Appended to OTA versions that lack the `<major>.<minor>_<build>_<timestamp>` tail.
pub const DEFAULT_VERSION_SUFFIX: &str = ".01_0001_197001010000";

/// Placeholder for OS version headers the caller did not provide.
const UNKNOWN: &str = "unknown";

/// What the caller wants to ask the update server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    /// Firmware version, e.g. `PHB110_11.F.13_2130_202403061922`.
    pub ota_version: String,
    /// Region code; blank means the home region.
    pub region: String,
    /// Device model; blank means derive one from the version.
    pub model: String,
    /// Carrier override; blank means the region's default carrier.
    pub nv_carrier: String,
    /// Update mode header; blank means `0`.
    pub mode: String,
    pub imei: Option<String>,
    pub android_version: String,
    pub coloros_version: String,
}

/// Query fields after normalization; every field is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedArgs {
    pub ota_version: String,
    pub region: Region,
    pub model: String,
    /// `None` until an endpoint supplies the default.
    pub nv_carrier: Option<String>,
    pub mode: String,
    pub imei: Option<String>,
    pub android_version: String,
    pub coloros_version: String,
}

impl QueryArgs {
    pub fn new(ota_version: impl Into<String>) -> Self {
        Self {
            ota_version: ota_version.into(),
            ..Self::default()
        }
    }

    /// Fill in every blank field.
    ///
    /// The version suffix is applied first so a synthesized model is
    /// derived from the completed version string.  An unrecognised
    /// region code is an error, not a silent fallback.
    pub fn normalize(&self, home: Region) -> Result<NormalizedArgs> {
        let ota_version = normalize_version(self.ota_version.trim());

        let region = match self.region.trim() {
            "" => home,
            code => code.parse()?,
        };

        let model = match self.model.trim() {
            "" => synthesize_model(&ota_version, region),
            m => m.to_string(),
        };

        Ok(NormalizedArgs {
            ota_version,
            region,
            model,
            nv_carrier: non_blank(&self.nv_carrier),
            mode: non_blank(&self.mode).unwrap_or_else(|| "0".to_string()),
            imei: self.imei.as_deref().and_then(non_blank),
            android_version: non_blank(&self.android_version)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            coloros_version: non_blank(&self.coloros_version)
                .unwrap_or_else(|| UNKNOWN.to_string()),
        })
    }
}

impl NormalizedArgs {
    /// Carrier to send: the override, or the endpoint's default.
    pub fn carrier<'a>(&'a self, endpoint: &'a EndpointConfig) -> &'a str {
        self.nv_carrier.as_deref().unwrap_or(&endpoint.carrier_id)
    }

    /// Cleartext request headers.  The builder adds `protectedKey` and
    /// `Content-Type` itself.
    pub fn headers(&self, endpoint: &EndpointConfig, device_id: &str) -> BTreeMap<String, String> {
        let pairs = [
            ("language", endpoint.language.as_str()),
            ("androidVersion", self.android_version.as_str()),
            ("colorOSVersion", self.coloros_version.as_str()),
            ("otaVersion", self.ota_version.as_str()),
            ("model", self.model.as_str()),
            ("mode", self.mode.as_str()),
            ("nvCarrier", self.carrier(endpoint)),
            ("version", endpoint.protocol_version.as_str()),
            ("deviceId", device_id),
        ];
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

/// Append the default suffix unless the version already has at least
/// three `_`-separated and three `.`-separated segments.
pub fn normalize_version(version: &str) -> String {
    if version.split('_').count() < 3 || version.split('.').count() < 3 {
        format!("{version}{DEFAULT_VERSION_SUFFIX}")
    } else {
        version.to_string()
    }
}

/// First `_` segment of the version plus the region's model suffix.
pub fn synthesize_model(ota_version: &str, region: Region) -> String {
    let base = ota_version.split('_').next().unwrap_or_default();
    format!("{base}{}", region.model_suffix())
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Feature-check flags carried in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opex {
    pub check: bool,
}

/// The plaintext body that is encrypted into `cipher`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub mode: String,
    /// Unix time in milliseconds.
    pub time: i64,
    pub is_rooted: String,
    pub is_locked: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub device_id: String,
    pub opex: Opex,
}

impl RequestPayload {
    /// Payload for an ordinary (unrooted, locked) update check.
    pub fn new(device_id: impl Into<String>, time_ms: i64) -> Self {
        Self {
            mode: "0".into(),
            time: time_ms,
            is_rooted: "0".into(),
            is_locked: true,
            kind: "0".into(),
            device_id: device_id.into(),
            opex: Opex { check: true },
        }
    }

    /// Compact JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
