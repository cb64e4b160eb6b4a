//! Device identifier sent in the `deviceId` header and payload field.
//!
//! With an IMEI the id is the upper-case hex SHA-256 of it.  Without
//! one we use a random id generated once per install and kept on disk,
//! so repeated queries look like the same device.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::errors::{OtaError, Result};

/// Length of every device id, in characters.
pub const DEVICE_ID_LEN: usize = 64;

/// Derive the device id for an IMEI.
pub fn device_id_from_imei(imei: &str) -> String {
    to_upper_hex(&Sha256::digest(imei.trim().as_bytes()))
}

/// Generate a fresh random device id.
pub fn random_device_id() -> Result<String> {
    let mut bytes = [0u8; DEVICE_ID_LEN / 2];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| OtaError::Entropy(format!("OS RNG failed: {e}")))?;
    Ok(to_upper_hex(&bytes))
}

/// Whether `id` has the shape of a device id (64 upper-case hex chars).
pub fn is_valid_device_id(id: &str) -> bool {
    id.len() == DEVICE_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}

/// Resolves device ids, persisting the fallback id at `path`.
#[derive(Debug, Clone)]
pub struct DeviceIdStore {
    path: Option<PathBuf>,
}

impl DeviceIdStore {
    /// `None` means no persistence: a fresh random id every process.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Device id for an optional IMEI.  Blank IMEIs count as absent.
    pub fn resolve(&self, imei: Option<&str>) -> Result<String> {
        match imei.map(str::trim).filter(|s| !s.is_empty()) {
            Some(imei) => Ok(device_id_from_imei(imei)),
            None => self.install_id(),
        }
    }

    /// The stable per-install id, created on first use.
    pub fn install_id(&self) -> Result<String> {
        let Some(path) = &self.path else {
            warn!("no device id file available, using an ephemeral random id");
            return random_device_id();
        };

        if path.exists() {
            let stored = fs::read_to_string(path)?;
            let stored = stored.trim();
            if is_valid_device_id(stored) {
                return Ok(stored.to_string());
            }
            warn!(path = %path.display(), "device id file is corrupt, regenerating");
        }

        let id = random_device_id()?;
        write_id(path, &id)?;
        debug!(path = %path.display(), "stored new device id");
        Ok(id)
    }
}

fn write_id(path: &Path, id: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, id)?;

    // On Unix, restrict permissions to owner-only read/write.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

fn to_upper_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing to a String cannot fail.
        let _ = write!(out, "{b:02X}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn imei_id_is_sha256_upper_hex() {
        // sha256("abc")
        assert_eq!(
            device_id_from_imei("abc"),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn imei_is_trimmed() {
        assert_eq!(
            device_id_from_imei(" 861234567890123 "),
            device_id_from_imei("861234567890123")
        );
    }

    #[test]
    fn random_ids_are_valid_and_distinct() {
        let a = random_device_id().unwrap();
        let b = random_device_id().unwrap();
        assert!(is_valid_device_id(&a));
        assert!(is_valid_device_id(&b));
        assert_ne!(a, b);
        assert_ne!(a, "0".repeat(DEVICE_ID_LEN));
    }

    #[test]
    fn install_id_is_stable() {
        let dir = TempDir::new().unwrap();
        let store = DeviceIdStore::new(Some(dir.path().join("sub").join("device-id")));

        let first = store.resolve(None).unwrap();
        let second = store.resolve(Some("   ")).unwrap();
        assert_eq!(first, second);
        assert!(is_valid_device_id(&first));
    }

    #[test]
    fn corrupt_file_is_regenerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("device-id");
        fs::write(&path, "not-an-id").unwrap();

        let store = DeviceIdStore::new(Some(path.clone()));
        let id = store.install_id().unwrap();
        assert!(is_valid_device_id(&id));
        assert_eq!(fs::read_to_string(&path).unwrap(), id);
    }

    #[test]
    fn imei_wins_over_install_id() {
        let dir = TempDir::new().unwrap();
        let store = DeviceIdStore::new(Some(dir.path().join("device-id")));
        assert_eq!(
            store.resolve(Some("abc")).unwrap(),
            device_id_from_imei("abc")
        );
        assert!(!dir.path().join("device-id").exists());
    }
}
