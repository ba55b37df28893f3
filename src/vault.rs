//! Symmetric encryption of API secrets at rest.
//!
//! Ciphertext layout: `base64(nonce(12) || aes-256-gcm(plaintext))`. Every call to
//! [`CredentialVault::encrypt`] draws a fresh random nonce, so equal plaintexts produce
//! different ciphertexts; decryption always round-trips exactly.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;

use crate::error::AdpulseError;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Clone)]
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault").finish_non_exhaustive()
    }
}

impl CredentialVault {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        let cipher =
            Aes256Gcm::new_from_slice(key).expect("32-byte key is always valid for AES-256");
        Self { cipher }
    }

    /// Build a vault from `basic.encryption_key` (base64 of exactly 32 bytes).
    pub fn from_base64_key(encoded: &str) -> Result<Self, AdpulseError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AdpulseError::Crypto(format!("encryption key is not base64: {e}")))?;
        let key: [u8; KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            AdpulseError::Crypto(format!(
                "encryption key must decode to {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::new(&key))
    }

    /// Random key, base64-encoded, suitable for `basic.encryption_key`.
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut key);
        STANDARD.encode(key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, AdpulseError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AdpulseError::Crypto(format!("encrypt: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, AdpulseError> {
        let data = STANDARD
            .decode(encoded)
            .map_err(|e| AdpulseError::Crypto(format!("ciphertext is not base64: {e}")))?;
        if data.len() < NONCE_LEN {
            return Err(AdpulseError::Crypto(
                "ciphertext too short (missing nonce)".to_string(),
            ));
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| AdpulseError::Crypto(format!("decrypt: {e}")))?;
        String::from_utf8(plaintext)
            .map_err(|e| AdpulseError::Crypto(format!("decrypted secret is not utf-8: {e}")))
    }
}
