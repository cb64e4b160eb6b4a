use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{OtaError, Result};
use crate::region::{KeyGroup, Region, RegionDirectory};

/// Tool configuration, loaded from `.otacheck.toml`.
///
/// Every field has a default so otacheck runs without a config file,
/// although queries need at least one public key to be configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Region used when a query does not name one (e.g. "CN").
    #[serde(default = "default_region")]
    pub default_region: String,

    /// Whole-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// HTTP(S) proxy URL for every query.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Directory holding `cn.pem`, `eu.pem`, `in.pem`, `sg.pem`.
    /// Relative paths resolve against the config file's directory.
    #[serde(default)]
    pub public_key_dir: Option<String>,

    /// Inline public keys keyed by group name; these win over files.
    #[serde(default)]
    pub public_keys: BTreeMap<String, String>,

    /// Where the per-install device id is kept when no IMEI is given.
    #[serde(default)]
    pub device_id_file: Option<String>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_region() -> String {
    Region::HOME.code().to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            timeout_secs: default_timeout_secs(),
            proxy: None,
            public_key_dir: None,
            public_keys: BTreeMap::new(),
            device_id_file: None,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    pub const FILE_NAME: &'static str = ".otacheck.toml";

    /// Load settings from `<project_dir>/.otacheck.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load settings from an explicit file path.  A missing file is an error.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            OtaError::Config(format!("cannot read {}: {e}", config_path.display()))
        })?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            OtaError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        debug!(path = %config_path.display(), "loaded config file");
        Ok(settings)
    }

    /// The configured default region, validated.
    pub fn default_region(&self) -> Result<Region> {
        self.default_region.parse()
    }

    /// Resolve all configured public keys and build the region directory.
    ///
    /// `base_dir` anchors a relative `public_key_dir`.  Inline keys take
    /// precedence over `<group>.pem` files; groups with neither are left
    /// unconfigured.
    pub fn region_directory(&self, base_dir: &Path) -> Result<RegionDirectory> {
        let mut texts: BTreeMap<KeyGroup, String> = BTreeMap::new();

        if let Some(dir) = &self.public_key_dir {
            let dir = base_dir.join(dir);
            for group in KeyGroup::ALL {
                let path = dir.join(format!("{}.pem", group.name()));
                if path.exists() {
                    let text = std::fs::read_to_string(&path).map_err(|e| {
                        OtaError::Config(format!("cannot read {}: {e}", path.display()))
                    })?;
                    texts.insert(group, text);
                }
            }
        }

        for (name, text) in &self.public_keys {
            let group = KeyGroup::from_name(name).ok_or_else(|| {
                OtaError::Config(format!(
                    "unknown key group '{name}' in [public_keys] (expected cn, eu, in, sg)"
                ))
            })?;
            texts.insert(group, text.clone());
        }

        debug!(groups = texts.len(), "resolved public keys");
        Ok(RegionDirectory::from_key_texts(&texts))
    }

    /// Path of the persisted device id: the configured file, or
    /// `$HOME/.config/otacheck/device-id`.
    pub fn device_id_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.device_id_file {
            return Some(PathBuf::from(path));
        }
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("otacheck")
                .join("device-id"),
        )
    }
}

// ── Tests ────────────────────────────────────────────────────────────
