//! Value obfuscation for stored items
//!
//! A repeating-key XOR transform. It keeps casual readers of the storage
//! medium from reading values and is not a security control.
//!
//! The ciphertext is the first 8 bytes of the plaintext's SHA-256 digest
//! followed by the XORed plaintext, rendered as base64. Decryption recomputes
//! the digest, so text that was never encrypted (or was encrypted under a
//! different key) is rejected instead of turning into garbage.

use crate::error::{Result, StorageError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of the integrity tag prepended to every ciphertext.
pub const TAG_LEN: usize = 8;

/// Repeating-key XOR cipher with an integrity tag.
#[derive(Clone)]
pub struct XorCipher {
    key: Vec<u8>,
}

impl XorCipher {
    /// Create a cipher for `key`. An empty key falls back to a single zero byte.
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        let key = key.as_ref().to_vec();
        let key = if key.is_empty() { vec![0] } else { key };
        Self { key }
    }

    /// Encrypt `plaintext` into base64 text.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut out = Vec::with_capacity(TAG_LEN + plaintext.len());
        out.extend_from_slice(&tag(plaintext.as_bytes()));
        out.extend(self.apply(plaintext.as_bytes()));
        STANDARD.encode(out)
    }

    /// Decrypt text produced by [`encrypt`](Self::encrypt) under the same key.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let raw = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| StorageError::Decode(format!("Not base64: {}", e)))?;

        if raw.len() <= TAG_LEN {
            return Err(StorageError::Decode("Ciphertext too short".to_string()));
        }

        let (expected, body) = raw.split_at(TAG_LEN);
        let plain = self.apply(body);

        if tag(&plain) != expected {
            return Err(StorageError::Decode("Integrity tag mismatch".to_string()));
        }

        String::from_utf8(plain)
            .map_err(|e| StorageError::Decode(format!("Plaintext is not UTF-8: {}", e)))
    }

    fn apply(&self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(self.key.iter().cycle())
            .map(|(byte, k)| byte ^ k)
            .collect()
    }
}

impl fmt::Debug for XorCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XorCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn tag(data: &[u8]) -> [u8; TAG_LEN] {
    let digest = Sha256::digest(data);
    let mut out = [0u8; TAG_LEN];
    out.copy_from_slice(&digest[..TAG_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CIPHER_KEY;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = XorCipher::new(DEFAULT_CIPHER_KEY);
        let plaintext = r#"{"value":"Lagos","timestamp":1700000000000}"#;

        let encrypted = cipher.encrypt(plaintext);
        assert_ne!(encrypted, plaintext);
        assert!(!encrypted.contains("Lagos"));

        assert_eq!(cipher.decrypt(&encrypted).unwrap(), plaintext);
    }

    #[test]
    fn test_wrong_key_is_detected() {
        let encrypted = XorCipher::new("key-one").encrypt("{\"value\":1}");
        let result = XorCipher::new("key-two").decrypt(&encrypted);

        assert!(matches!(result, Err(StorageError::Decode(_))));
    }

    #[test]
    fn test_unencrypted_base64_is_detected() {
        let cipher = XorCipher::new(DEFAULT_CIPHER_KEY);
        let compressed = crate::compression::compress("{\"value\":\"not encrypted\"}");

        assert!(cipher.decrypt(&compressed).is_err());
        assert!(cipher.decrypt("{\"value\":1}").is_err());
    }

    #[test]
    fn test_empty_key_still_works() {
        let cipher = XorCipher::new("");
        let encrypted = cipher.encrypt("abc");
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), "abc");
    }

    #[test]
    fn test_debug_redacts_key() {
        let cipher = XorCipher::new(DEFAULT_CIPHER_KEY);
        let debug = format!("{:?}", cipher);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("naijaspark"));
    }
}
