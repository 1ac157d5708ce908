//! Sealed-box encryption of secret values.
//!
//! GitHub decrypts Actions secrets with libsodium's `crypto_box_seal_open`,
//! so values are sealed with the compatible X25519/XSalsa20-Poly1305
//! construction from `crypto_box`.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use crypto_box::{KEY_SIZE, PublicKey, aead::OsRng};
use serde::{Deserialize, Serialize};

use crate::config::SecretRecord;
use crate::error::{Error, Result};

/// Repository public key as returned by the public-key endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicKeyMaterial {
    pub key: String,
    pub key_id: String,
}

/// Request body for creating or updating a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SealedSecret {
    pub encrypted_value: String,
    pub key_id: String,
}

fn decode_public_key(key_b64: &str) -> Result<PublicKey> {
    let bytes = STANDARD
        .decode(key_b64.trim())
        .map_err(|e| Error::Encoding(format!("public key is not valid base64: {e}")))?;

    let key: [u8; KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
        Error::Encoding(format!(
            "public key must be {KEY_SIZE} bytes, got {}",
            bytes.len()
        ))
    })?;

    Ok(PublicKey::from(key))
}

/// Seals `plaintext` to the base64-encoded public key and returns the
/// base64-encoded ciphertext. Every call uses a fresh ephemeral keypair, so
/// the output differs between calls.
pub fn seal_value(key_b64: &str, plaintext: &[u8]) -> Result<String> {
    let public_key = decode_public_key(key_b64)?;

    let sealed = public_key
        .seal(&mut OsRng, plaintext)
        .map_err(|_| Error::Encoding("sealing failed".to_string()))?;

    Ok(STANDARD.encode(sealed))
}

/// Seals a record under the given key material, carrying its key id along.
pub fn seal_record(material: &PublicKeyMaterial, record: &SecretRecord) -> Result<SealedSecret> {
    Ok(SealedSecret {
        encrypted_value: seal_value(&material.key, record.value().as_bytes())?,
        key_id: material.key_id.clone(),
    })
}
