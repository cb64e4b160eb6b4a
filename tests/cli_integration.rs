//! Integration tests for the otacheck CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Nothing here talks to a real update server: queries are only run in
//! configurations that fail before any network I/O.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Helper: get a Command pointing at the otacheck binary.
fn otacheck() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("otacheck").expect("binary should exist");
    cmd.env_remove("OTACHECK_CONFIG")
        .env_remove("OTACHECK_PROXY")
        .env_remove("OTACHECK_LOG");
    cmd
}

#[test]
fn help_flag_shows_usage() {
    otacheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Query OTA update servers"))
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("regions"))
        .stdout(predicate::str::contains("device-id"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn version_flag_shows_version() {
    otacheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("otacheck"));
}

#[test]
fn no_args_shows_help() {
    otacheck()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn regions_lists_every_region_without_config() {
    let tmp = TempDir::new().unwrap();

    otacheck()
        .current_dir(tmp.path())
        .arg("regions")
        .assert()
        .success()
        .stdout(predicate::str::contains("component-ota-cn.allawntech.com"))
        .stdout(predicate::str::contains("VN"))
        .stdout(predicate::str::contains("missing"));
}

#[test]
fn device_id_from_imei_is_printed() {
    let tmp = TempDir::new().unwrap();

    otacheck()
        .current_dir(tmp.path())
        .args(["device-id", "--imei", "abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD",
        ));
}

#[test]
fn device_id_without_imei_is_stable() {
    let tmp = TempDir::new().unwrap();
    let id_file = tmp.child("id").child("device-id");
    tmp.child(".otacheck.toml")
        .write_str(&format!(
            "device_id_file = {:?}\n",
            id_file.path().display().to_string()
        ))
        .unwrap();

    let first = otacheck()
        .current_dir(tmp.path())
        .arg("device-id")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let second = otacheck()
        .current_dir(tmp.path())
        .arg("device-id")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(first, second);
    assert_eq!(String::from_utf8(first).unwrap().trim().len(), 64);
    id_file.assert(predicate::path::exists());
}

#[test]
fn query_without_public_key_fails_cleanly() {
    let tmp = TempDir::new().unwrap();

    otacheck()
        .current_dir(tmp.path())
        .args(["query", "PHB110_11.F.13_2130_202403061922", "--region", "EU"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no public key configured"));
}

#[test]
fn query_with_unknown_region_fails() {
    let tmp = TempDir::new().unwrap();

    otacheck()
        .current_dir(tmp.path())
        .args(["query", "X_1.2.3_4", "--region", "XX"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown region 'XX'"));
}

#[test]
fn malformed_configured_key_is_reported() {
    let tmp = TempDir::new().unwrap();
    tmp.child(".otacheck.toml")
        .write_str("[public_keys]\ncn = \"definitely not a key\"\n")
        .unwrap();

    otacheck()
        .current_dir(tmp.path())
        .arg("regions")
        .assert()
        .success()
        .stdout(predicate::str::contains("invalid"))
        .stderr(predicate::str::contains("Public key for 'cn' is unusable"));
}

#[test]
fn query_with_malformed_key_fails_building_request() {
    let tmp = TempDir::new().unwrap();
    tmp.child(".otacheck.toml")
        .write_str("[public_keys]\ncn = \"definitely not a key\"\n")
        .unwrap();

    otacheck()
        .current_dir(tmp.path())
        .args(["query", "PHB110_11.F.13_2130_202403061922", "--region", "CN"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Key protection failed"))
        .stderr(predicate::str::contains("public key for 'cn'"))
        .stderr(predicate::str::contains("The request could not be built"));
}

#[test]
fn explicit_region_ignores_bad_default_region() {
    let tmp = TempDir::new().unwrap();
    tmp.child(".otacheck.toml")
        .write_str("default_region = \"ZZ\"\n")
        .unwrap();

    // The query still fails for lack of a key, but not on the default region.
    otacheck()
        .current_dir(tmp.path())
        .args(["query", "PHB110_11.F.13_2130_202403061922", "--region", "EU"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no public key configured"))
        .stderr(predicate::str::contains("Unknown region 'ZZ'").not());
}

#[test]
fn completions_bash_generates_script() {
    otacheck()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("otacheck"));
}
