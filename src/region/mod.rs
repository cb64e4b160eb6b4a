//! Region directory — which host, carrier, language and public key a
//! query for a given region uses.
//!
//! The table is built once (public keys are parsed up front) and then
//! only read, so a single `RegionDirectory` can be shared by reference
//! between any number of concurrent queries.
//!
//! Region codes outside the table are rejected with `InvalidRegion`
//! instead of being routed to the SG cluster.  SG only serves the
//! secondary regions listed here.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::crypto::PublicKeyMaterial;
use crate::errors::{OtaError, Result};

/// Protocol version sent in the `version` header.
pub const PROTOCOL_VERSION: &str = "2";

/// Supported OTA regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Cn,
    Eu,
    In,
    Sg,
    Ru,
    Tr,
    Th,
    Gl,
    Id,
    Tw,
    My,
    Vn,
}

impl Region {
    /// Every region, in display order.
    pub const ALL: [Region; 12] = [
        Region::Cn,
        Region::Eu,
        Region::In,
        Region::Sg,
        Region::Ru,
        Region::Tr,
        Region::Th,
        Region::Gl,
        Region::Id,
        Region::Tw,
        Region::My,
        Region::Vn,
    ];

    /// The home region, used when none is given.
    pub const HOME: Region = Region::Cn;

    pub fn code(self) -> &'static str {
        match self {
            Region::Cn => "CN",
            Region::Eu => "EU",
            Region::In => "IN",
            Region::Sg => "SG",
            Region::Ru => "RU",
            Region::Tr => "TR",
            Region::Th => "TH",
            Region::Gl => "GL",
            Region::Id => "ID",
            Region::Tw => "TW",
            Region::My => "MY",
            Region::Vn => "VN",
        }
    }

    /// Server cluster (host and key pair) that serves this region.
    pub fn key_group(self) -> KeyGroup {
        match self {
            Region::Cn => KeyGroup::Cn,
            Region::Eu => KeyGroup::Eu,
            Region::In => KeyGroup::In,
            _ => KeyGroup::Sg,
        }
    }

    pub fn carrier_id(self) -> &'static str {
        match self {
            Region::Cn => "10010111",
            Region::Eu => "01000100",
            Region::In => "00011011",
            Region::Sg => "01011010",
            Region::Ru => "00110111",
            Region::Tr => "01010001",
            Region::Th => "00111001",
            Region::Gl => "10100111",
            Region::Id => "00110011",
            Region::Tw => "00011010",
            Region::My => "00111000",
            Region::Vn => "00111100",
        }
    }

    pub fn language(self) -> &'static str {
        match self {
            Region::Cn => "zh-CN",
            Region::Eu => "en-GB",
            Region::In => "en-IN",
            Region::Sg => "en-SG",
            Region::Ru => "ru-RU",
            Region::Tr => "tr-TR",
            Region::Th => "th-TH",
            Region::Gl => "en-US",
            Region::Id => "id-ID",
            Region::Tw => "zh-TW",
            Region::My => "ms-MY",
            Region::Vn => "vi-VN",
        }
    }

    /// Suffix appended to a synthesized model name (e.g. `CPH2581EEA`).
    pub fn model_suffix(self) -> &'static str {
        match self {
            Region::Eu => "EEA",
            Region::In => "IN",
            _ => "",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = OtaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Region::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| OtaError::InvalidRegion(wanted.to_string()))
    }
}

/// A server cluster with its own host and RSA key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyGroup {
    Cn,
    Eu,
    In,
    Sg,
}

impl KeyGroup {
    pub const ALL: [KeyGroup; 4] = [KeyGroup::Cn, KeyGroup::Eu, KeyGroup::In, KeyGroup::Sg];

    /// Lower-case name used in config files (`[public_keys] cn = ...`, `cn.pem`).
    pub fn name(self) -> &'static str {
        match self {
            KeyGroup::Cn => "cn",
            KeyGroup::Eu => "eu",
            KeyGroup::In => "in",
            KeyGroup::Sg => "sg",
        }
    }

    pub fn host(self) -> &'static str {
        match self {
            KeyGroup::Cn => "component-ota-cn.allawntech.com",
            KeyGroup::Eu => "component-ota-eu.allawnos.com",
            KeyGroup::In => "component-ota-in.allawnos.com",
            KeyGroup::Sg => "component-ota-sg.allawnos.com",
        }
    }

    /// Identifies which server private key unwraps the protected key.
    pub fn public_key_version(self) -> &'static str {
        match self {
            KeyGroup::Cn => "1615879139745",
            KeyGroup::Eu => "1615897067573",
            KeyGroup::In => "1615896309308",
            KeyGroup::Sg => "1615895993238",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        KeyGroup::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Everything the envelope builder needs to know about one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub region: Region,
    pub host: String,
    pub carrier_id: String,
    pub language: String,
    pub public_key: PublicKeyMaterial,
    pub public_key_version: String,
    pub protocol_version: String,
}

impl EndpointConfig {
    /// `https://{host}/update/v6`
    pub fn url(&self) -> String {
        format!("https://{}/update/v6", self.host)
    }
}

/// Immutable region → endpoint table.
#[derive(Debug, Clone, Default)]
pub struct RegionDirectory {
    keys: BTreeMap<KeyGroup, PublicKeyMaterial>,
    rejected: BTreeMap<KeyGroup, String>,
    hosts: BTreeMap<KeyGroup, String>,
}

impl RegionDirectory {
    /// Build a directory from already-parsed public keys.
    ///
    /// Key groups missing from `keys` can still be listed, but
    /// `endpoint` fails for their regions.
    pub fn new(keys: BTreeMap<KeyGroup, PublicKeyMaterial>) -> Self {
        Self {
            keys,
            rejected: BTreeMap::new(),
            hosts: BTreeMap::new(),
        }
    }

    /// Parse PEM/base64 key texts keyed by group.
    ///
    /// A malformed key only affects its own group: the parse error is
    /// kept and returned by `endpoint` for regions in that group.
    pub fn from_key_texts(texts: &BTreeMap<KeyGroup, String>) -> Self {
        let mut dir = Self::default();
        for (group, text) in texts {
            match PublicKeyMaterial::parse(text) {
                Ok(key) => {
                    dir.keys.insert(*group, key);
                }
                Err(e) => {
                    warn!(group = group.name(), error = %e, "ignoring malformed public key");
                    dir.rejected.insert(*group, e.to_string());
                }
            }
        }
        dir
    }

    /// Point a key group at a different host (test servers, mirrors).
    pub fn with_host(mut self, group: KeyGroup, host: impl Into<String>) -> Self {
        self.hosts.insert(group, host.into());
        self
    }

    pub fn has_key(&self, group: KeyGroup) -> bool {
        self.keys.contains_key(&group)
    }

    /// Why the configured key for `group` was rejected, if it was.
    pub fn key_error(&self, group: KeyGroup) -> Option<&str> {
        self.rejected.get(&group).map(String::as_str)
    }

    pub fn host(&self, group: KeyGroup) -> &str {
        self.hosts
            .get(&group)
            .map(String::as_str)
            .unwrap_or_else(|| group.host())
    }

    /// Look up the endpoint for `region`.
    pub fn endpoint(&self, region: Region) -> Result<EndpointConfig> {
        let group = region.key_group();
        if let Some(reason) = self.rejected.get(&group) {
            return Err(OtaError::KeyProtection(format!(
                "public key for '{}' (region {region}): {reason}",
                group.name()
            )));
        }
        let public_key = self.keys.get(&group).cloned().ok_or_else(|| {
            OtaError::Config(format!(
                "no public key configured for region {region} (key group '{}'); \
                 set [public_keys] {} in .otacheck.toml or add {}.pem to public_key_dir",
                group.name(),
                group.name(),
                group.name()
            ))
        })?;

        Ok(EndpointConfig {
            region,
            host: self.host(group).to_string(),
            carrier_id: region.carrier_id().to_string(),
            language: region.language().to_string(),
            public_key,
            public_key_version: group.public_key_version().to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::rand_core::OsRng;
    use rsa::{RsaPrivateKey, RsaPublicKey};

    fn test_key() -> PublicKeyMaterial {
        let private = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        PublicKeyMaterial::from(RsaPublicKey::from(&private))
    }

    #[test]
    fn parse_region_is_case_insensitive() {
        assert_eq!("eu".parse::<Region>().unwrap(), Region::Eu);
        assert_eq!(" Gl ".parse::<Region>().unwrap(), Region::Gl);
        assert!("XX".parse::<Region>().is_err());
    }

    #[test]
    fn secondary_regions_share_sg_cluster() {
        let secondary = [
            Region::Ru,
            Region::Tr,
            Region::Th,
            Region::Gl,
            Region::Id,
            Region::Tw,
            Region::My,
            Region::Vn,
        ];
        for r in secondary {
            assert_eq!(r.key_group(), KeyGroup::Sg, "{r}");
        }
        assert_eq!(Region::Cn.key_group(), KeyGroup::Cn);
        assert_eq!(Region::Eu.key_group(), KeyGroup::Eu);
        assert_eq!(Region::In.key_group(), KeyGroup::In);
    }

    #[test]
    fn endpoint_fills_region_fields() {
        let mut keys = BTreeMap::new();
        keys.insert(KeyGroup::Sg, test_key());
        let dir = RegionDirectory::new(keys);

        let ep = dir.endpoint(Region::Tw).unwrap();
        assert_eq!(ep.host, "component-ota-sg.allawnos.com");
        assert_eq!(ep.carrier_id, "00011010");
        assert_eq!(ep.language, "zh-TW");
        assert_eq!(ep.public_key_version, "1615895993238");
        assert_eq!(ep.protocol_version, "2");
        assert_eq!(ep.url(), "https://component-ota-sg.allawnos.com/update/v6");
    }

    #[test]
    fn endpoint_without_key_is_config_error() {
        let dir = RegionDirectory::default();
        assert!(matches!(dir.endpoint(Region::Cn), Err(OtaError::Config(_))));
    }

    #[test]
    fn host_override_applies() {
        let mut keys = BTreeMap::new();
        keys.insert(KeyGroup::Cn, test_key());
        let dir = RegionDirectory::new(keys).with_host(KeyGroup::Cn, "127.0.0.1:8443");
        assert_eq!(dir.endpoint(Region::Cn).unwrap().url(), "https://127.0.0.1:8443/update/v6");
    }

    #[test]
    fn malformed_key_fails_only_its_own_group() {
        let mut texts = BTreeMap::new();
        texts.insert(KeyGroup::Eu, "garbage".to_string());
        texts.insert(KeyGroup::Cn, test_key().to_pem().unwrap());
        let dir = RegionDirectory::from_key_texts(&texts);

        assert!(dir.endpoint(Region::Cn).is_ok());
        assert!(!dir.has_key(KeyGroup::Eu));
        assert!(dir.key_error(KeyGroup::Eu).is_some());

        let err = dir.endpoint(Region::Eu).unwrap_err();
        assert!(matches!(err, OtaError::KeyProtection(_)));
        assert_eq!(err.stage(), crate::errors::Stage::Request);
        assert!(err.to_string().contains("'eu'"));
    }
}
