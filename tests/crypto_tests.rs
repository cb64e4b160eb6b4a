//! Integration tests for the otacheck crypto module.

use std::collections::HashSet;
use std::sync::OnceLock;

use otacheck::crypto::{
    decrypt, encrypt, new_iv, new_key, protect_key, unwrap_key, PublicKeyMaterial, IV_LEN,
    KEY_LEN,
};
use otacheck::errors::OtaError;
use proptest::prelude::*;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Helper: one RSA key pair per test binary (key generation is slow).
fn server_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).expect("generate RSA key"))
}

fn server_public_pem() -> String {
    RsaPublicKey::from(server_key())
        .to_public_key_pem(LineEnding::LF)
        .expect("encode public key")
}

// ---------------------------------------------------------------------------
// Random material
// ---------------------------------------------------------------------------

#[test]
fn ten_thousand_keys_and_ivs_are_unique() {
    let mut keys = HashSet::new();
    let mut ivs = HashSet::new();

    for _ in 0..10_000 {
        let key = new_key().expect("key");
        let iv = new_iv().expect("iv");
        assert_eq!(key.as_bytes().len(), KEY_LEN);
        assert_eq!(iv.as_bytes().len(), IV_LEN);
        assert!(keys.insert(*key.as_bytes()), "duplicate key");
        assert!(ivs.insert(*iv.as_bytes()), "duplicate iv");
    }
}

// ---------------------------------------------------------------------------
// Payload cipher
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_encrypt_decrypt_roundtrip(plaintext in prop::collection::vec(any::<u8>(), 0..4096)) {
        let key = new_key().unwrap();
        let iv = new_iv().unwrap();

        let ciphertext = encrypt(&plaintext, &key, &iv).unwrap();
        let recovered = decrypt(&ciphertext, &key, &iv).unwrap();

        prop_assert_eq!(recovered, plaintext);
    }

    #[test]
    fn prop_ciphertext_length_equals_plaintext_length(
        plaintext in prop::collection::vec(any::<u8>(), 0..4096),
    ) {
        let key = new_key().unwrap();
        let iv = new_iv().unwrap();

        let ciphertext = encrypt(&plaintext, &key, &iv).unwrap();

        prop_assert_eq!(ciphertext.len(), plaintext.len());
    }
}

#[test]
fn tampered_ciphertext_decrypts_without_error() {
    // CTR has no integrity check: a flipped bit yields a flipped bit.
    let key = new_key().unwrap();
    let iv = new_iv().unwrap();
    let plaintext = br#"{"mode":"0","type":"0"}"#;

    let mut ciphertext = encrypt(plaintext, &key, &iv).unwrap();
    ciphertext[3] ^= 0x01;

    let recovered = decrypt(&ciphertext, &key, &iv).expect("no integrity check in CTR");
    assert_ne!(recovered.as_slice(), plaintext.as_slice());
    assert_eq!(recovered[3], plaintext[3] ^ 0x01);
    assert_eq!(recovered[4..], plaintext[4..]);
}

#[test]
fn decrypt_with_wrong_key_gives_garbage_not_error() {
    let key = new_key().unwrap();
    let other = new_key().unwrap();
    let iv = new_iv().unwrap();

    let ciphertext = encrypt(b"TOP_SECRET=42", &key, &iv).unwrap();
    let garbage = decrypt(&ciphertext, &other, &iv).unwrap();
    assert_ne!(garbage.as_slice(), b"TOP_SECRET=42");
}

// ---------------------------------------------------------------------------
// Key protector
// ---------------------------------------------------------------------------

#[test]
fn protected_key_length_matches_modulus() {
    let public = PublicKeyMaterial::parse(&server_public_pem()).unwrap();
    let key = new_key().unwrap();

    let protected = protect_key(&key, &public).unwrap();

    assert!(!protected.is_empty());
    assert_eq!(protected.len(), 128, "1024-bit modulus");
    assert_eq!(protected.len(), public.modulus_len());
}

#[test]
fn protected_key_unwraps_with_private_key() {
    let public = PublicKeyMaterial::parse(&server_public_pem()).unwrap();
    let key = new_key().unwrap();

    let protected = protect_key(&key, &public).unwrap();
    let recovered = unwrap_key(&protected, server_key()).unwrap();

    assert_eq!(recovered.as_bytes(), key.as_bytes());
}

#[test]
fn malformed_public_key_is_key_protection_error() {
    let truncated: String = server_public_pem().chars().take(80).collect();
    for bad in [
        "",
        "hello",
        "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----\n",
        truncated.as_str(),
    ] {
        let result = PublicKeyMaterial::parse(bad);
        assert!(
            matches!(result, Err(OtaError::KeyProtection(_))),
            "expected KeyProtection for {bad:?}"
        );
    }
}

#[test]
fn key_larger_than_modulus_capacity_is_key_protection_error() {
    // OAEP-SHA1 on a 512-bit modulus carries at most 64 - 42 = 22 bytes,
    // less than the 44-byte base64 form of an AES-256 key.
    let small = RsaPrivateKey::new(&mut OsRng, 512).expect("generate small RSA key");
    let public = PublicKeyMaterial::from(RsaPublicKey::from(&small));
    let key = new_key().unwrap();

    let result = protect_key(&key, &public);
    assert!(matches!(result, Err(OtaError::KeyProtection(_))));
}

#[test]
fn unwrap_with_wrong_private_key_fails() {
    let public = PublicKeyMaterial::parse(&server_public_pem()).unwrap();
    let other = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
    let key = new_key().unwrap();

    let protected = protect_key(&key, &public).unwrap();
    assert!(unwrap_key(&protected, &other).is_err());
}
