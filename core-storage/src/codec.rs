//! # Item Codec
//!
//! Turns a value plus its metadata into the string written to the medium,
//! and back.
//!
//! ```text
//! StoredItem ──JSON──> text ──[compress]──> base64(lz4) ──[encrypt]──> base64(tag ‖ xor)
//! ```
//!
//! Decoding never needs to know which options were used. It peels layers
//! greedily: decryption is tried first and only kept when the integrity tag
//! matches, then decompression is tried and only kept when it produces text,
//! and whatever remains must be JSON.

use crate::compression;
use crate::encryption::XorCipher;
use crate::error::{Result, StorageError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A value together with the metadata the store keeps for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem<T> {
    /// The caller's value
    pub value: T,

    /// Write time in Unix milliseconds, used for eviction ordering
    pub timestamp: i64,

    /// Absolute expiry in Unix milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
}

impl<T> StoredItem<T> {
    /// Wrap `value` written at `now_ms`, expiring `ttl` later when given.
    pub fn new(value: T, now_ms: i64, ttl: Option<Duration>) -> Self {
        let expiry = ttl.map(|ttl| {
            let millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            now_ms.saturating_add(millis)
        });

        Self {
            value,
            timestamp: now_ms,
            expiry,
        }
    }

    /// Whether the item is past its expiry at `now_ms`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expiry.is_some_and(|expiry| expiry < now_ms)
    }
}

/// Metadata of a stored item, decoded without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ItemMetadata {
    pub timestamp: i64,
    #[serde(default)]
    pub expiry: Option<i64>,
}

impl ItemMetadata {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expiry.is_some_and(|expiry| expiry < now_ms)
    }
}

/// Per-write options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageOptions {
    /// LZ4-compress the encoded item (default: true)
    pub compress: bool,

    /// Obfuscate the encoded item (default: false)
    pub encrypt: bool,

    /// Lifetime of the item, measured from the write
    pub expiry: Option<Duration>,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            compress: true,
            encrypt: false,
            expiry: None,
        }
    }
}

impl StorageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn encrypt(mut self, enabled: bool) -> Self {
        self.encrypt = enabled;
        self
    }

    /// Expire the item `ttl` after it is written. `Duration::ZERO` is valid.
    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.expiry = Some(ttl);
        self
    }
}

/// Encodes and decodes stored items.
#[derive(Debug, Clone)]
pub struct ItemCodec {
    cipher: XorCipher,
}

impl ItemCodec {
    pub fn new(cipher: XorCipher) -> Self {
        Self { cipher }
    }

    /// Encode `item` according to `options`.
    pub fn encode<T: Serialize>(&self, item: &StoredItem<T>, options: &StorageOptions) -> Result<String> {
        let mut text =
            serde_json::to_string(item).map_err(|e| StorageError::Encode(e.to_string()))?;

        if options.compress {
            text = compression::compress(&text);
        }

        if options.encrypt {
            text = self.cipher.encrypt(&text);
        }

        Ok(text)
    }

    /// Decode text produced by [`encode`](Self::encode) with any options.
    pub fn decode<T: DeserializeOwned>(&self, raw: &str) -> Result<StoredItem<T>> {
        let json = self.unwind(raw);
        serde_json::from_str(&json).map_err(|e| StorageError::Decode(e.to_string()))
    }

    /// Decode only the metadata of a stored item.
    pub fn decode_metadata(&self, raw: &str) -> Result<ItemMetadata> {
        let json = self.unwind(raw);
        serde_json::from_str(&json).map_err(|e| StorageError::Decode(e.to_string()))
    }

    fn unwind(&self, raw: &str) -> String {
        let text = self
            .cipher
            .decrypt(raw)
            .unwrap_or_else(|_| raw.to_string());

        compression::decompress(&text).unwrap_or(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CIPHER_KEY;
    use serde_json::json;

    fn codec() -> ItemCodec {
        ItemCodec::new(XorCipher::new(DEFAULT_CIPHER_KEY))
    }

    fn all_options() -> Vec<StorageOptions> {
        let mut out = Vec::new();
        for compress in [false, true] {
            for encrypt in [false, true] {
                out.push(StorageOptions::new().compress(compress).encrypt(encrypt));
            }
        }
        out
    }

    #[test]
    fn test_roundtrip_under_every_option_combination() {
        let codec = codec();
        let item = StoredItem::new(
            json!({"id": "q1", "title": "World Capitals", "questions": ["Abuja?", "Accra?"]}),
            1_700_000_000_000,
            Some(Duration::from_secs(60)),
        );

        for options in all_options() {
            let encoded = codec.encode(&item, &options).unwrap();
            let decoded: StoredItem<serde_json::Value> = codec.decode(&encoded).unwrap();
            assert_eq!(decoded, item, "options: {:?}", options);
        }
    }

    #[test]
    fn test_uncompressed_unencrypted_is_plain_json() {
        let item = StoredItem::new("hello", 5, None);
        let encoded = codec()
            .encode(&item, &StorageOptions::new().compress(false))
            .unwrap();

        assert_eq!(encoded, r#"{"value":"hello","timestamp":5}"#);
    }

    #[test]
    fn test_expiry_math() {
        let item = StoredItem::new(1, 1_000, Some(Duration::from_millis(250)));
        assert_eq!(item.expiry, Some(1_250));
        assert!(!item.is_expired(1_250));
        assert!(item.is_expired(1_251));

        let immediate = StoredItem::new(1, 1_000, Some(Duration::ZERO));
        assert_eq!(immediate.expiry, Some(1_000));
        assert!(immediate.is_expired(1_001));

        let forever = StoredItem::new(1, 1_000, None);
        assert!(!forever.is_expired(i64::MAX));
    }

    #[test]
    fn test_decode_metadata_ignores_value() {
        let codec = codec();
        let item = StoredItem::new(json!({"nested": [1, 2, 3]}), 42, Some(Duration::from_millis(8)));

        for options in all_options() {
            let encoded = codec.encode(&item, &options).unwrap();
            let metadata = codec.decode_metadata(&encoded).unwrap();
            assert_eq!(metadata.timestamp, 42);
            assert_eq!(metadata.expiry, Some(50));
        }
    }

    #[test]
    fn test_malformed_input_is_a_decode_error() {
        let result: Result<StoredItem<i32>> = codec().decode("not json at all");
        assert!(matches!(result, Err(StorageError::Decode(_))));
    }

    #[test]
    fn test_other_cipher_key_cannot_read_encrypted_item() {
        let item = StoredItem::new("secret", 1, None);
        let encoded = codec()
            .encode(&item, &StorageOptions::new().encrypt(true))
            .unwrap();

        let other = ItemCodec::new(XorCipher::new("another-key"));
        assert!(other.decode::<String>(&encoded).is_err());
    }

    #[test]
    fn test_default_options() {
        let options = StorageOptions::default();
        assert!(options.compress);
        assert!(!options.encrypt);
        assert_eq!(options.expiry, None);
    }
}
