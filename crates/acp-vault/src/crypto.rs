//! envelope encryption for vaulted keypairs
//!
//! format: `v1:<salt-hex>:<iv-hex>:<tag-hex>:<ciphertext-hex>`
//! kdf: scrypt(secret, salt) -> 32 byte key. cipher: aes-256-gcm, 12 byte iv.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use scrypt::{scrypt, Params};

use acp_types::{AcpError, AcpResult};

const VERSION: &str = "v1";
const SALT_LEN: usize = 16;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// log_n=15 (N=32768), r=8, p=1 — a conventional interactive-login scrypt
/// cost, well within the vault's per-operation latency budget.
const SCRYPT_LOG_N: u8 = 15;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

fn derive_key(secret: &str, salt: &[u8]) -> AcpResult<[u8; KEY_LEN]> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|e| AcpError::ConfigError(format!("invalid scrypt params: {e}")))?;
    let mut out = [0u8; KEY_LEN];
    scrypt(secret.as_bytes(), salt, &params, &mut out)
        .map_err(|e| AcpError::ConfigError(format!("scrypt derivation failed: {e}")))?;
    Ok(out)
}

/// encrypt `plaintext` under `secret`, producing the `v1:...` hex envelope.
pub fn seal(secret: &str, plaintext: &[u8]) -> AcpResult<String> {
    if secret.is_empty() {
        return Err(AcpError::ConfigError(
            "vault process secret is not configured".into(),
        ));
    }

    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let key_bytes = derive_key(secret, &salt)?;
    let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
    let cipher = Aes256Gcm::new(key);
    let nonce = Nonce::from_slice(&iv);

    let sealed = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad: &[] })
        .map_err(|e| AcpError::IntegrityError(format!("encryption failed: {e}")))?;

    // aes-gcm appends the 16-byte tag to the ciphertext; split it back out
    // so the wire format carries the tag as its own field, per spec §6.
    let split_at = sealed.len() - TAG_LEN;
    let (ciphertext, tag) = sealed.split_at(split_at);

    Ok(format!(
        "{VERSION}:{}:{}:{}:{}",
        hex::encode(salt),
        hex::encode(iv),
        hex::encode(tag),
        hex::encode(ciphertext),
    ))
}

/// decrypt a `v1:...` hex envelope under `secret`.
pub fn open(secret: &str, envelope: &str) -> AcpResult<Vec<u8>> {
    if secret.is_empty() {
        return Err(AcpError::ConfigError(
            "vault process secret is not configured".into(),
        ));
    }

    let parts: Vec<&str> = envelope.split(':').collect();
    let [version, salt_hex, iv_hex, tag_hex, ct_hex] = parts[..] else {
        return Err(AcpError::IntegrityError(
            "malformed vault envelope: expected 5 colon-separated fields".into(),
        ));
    };
    if version != VERSION {
        return Err(AcpError::IntegrityError(format!(
            "unsupported vault envelope version: {version}"
        )));
    }

    let salt = hex::decode(salt_hex)
        .map_err(|e| AcpError::IntegrityError(format!("bad salt hex: {e}")))?;
    let iv = hex::decode(iv_hex).map_err(|e| AcpError::IntegrityError(format!("bad iv hex: {e}")))?;
    let tag = hex::decode(tag_hex)
        .map_err(|e| AcpError::IntegrityError(format!("bad tag hex: {e}")))?;
    let ciphertext = hex::decode(ct_hex)
        .map_err(|e| AcpError::IntegrityError(format!("bad ciphertext hex: {e}")))?;

    if salt.len() != SALT_LEN || iv.len() != IV_LEN || tag.len() != TAG_LEN {
        return Err(AcpError::IntegrityError(
            "vault envelope field has wrong length".into(),
        ));
    }

    let key_bytes = derive_key(secret, &salt)?;
    let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
    let cipher = Aes256Gcm::new(key);
    let nonce = Nonce::from_slice(&iv);

    let mut combined = ciphertext.clone();
    combined.extend_from_slice(&tag);

    cipher
        .decrypt(nonce, Payload { msg: &combined, aad: &[] })
        .map_err(|_| AcpError::IntegrityError("gcm tag mismatch".into()))
}
