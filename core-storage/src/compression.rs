//! LZ4 compression rendered as base64 text
//!
//! The key-value medium only stores strings, so compressed blocks are carried
//! as standard base64. The uncompressed length is prepended to the block.

use crate::error::{Result, StorageError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// LZ4 never expands data by more than this factor when decompressing.
const MAX_EXPANSION: usize = 255;

/// Compress `text` and render the block as base64.
pub fn compress(text: &str) -> String {
    let block = lz4_flex::compress_prepend_size(text.as_bytes());
    STANDARD.encode(block)
}

/// Reverse [`compress`].
///
/// Fails on anything that is not a base64 LZ4 block holding non-empty UTF-8.
pub fn decompress(text: &str) -> Result<String> {
    let block = STANDARD
        .decode(text.trim())
        .map_err(|e| StorageError::Decode(format!("Not base64: {}", e)))?;

    if block.len() < 4 {
        return Err(StorageError::Decode("Block too short".to_string()));
    }

    let declared = u32::from_le_bytes([block[0], block[1], block[2], block[3]]) as usize;
    if declared == 0 || declared > (block.len() - 4).saturating_mul(MAX_EXPANSION) {
        return Err(StorageError::Decode(format!(
            "Implausible uncompressed size {}",
            declared
        )));
    }

    let bytes = lz4_flex::decompress_size_prepended(&block)
        .map_err(|e| StorageError::Decode(format!("LZ4 block invalid: {}", e)))?;

    let decoded = String::from_utf8(bytes)
        .map_err(|e| StorageError::Decode(format!("Decompressed bytes are not UTF-8: {}", e)))?;

    if decoded.is_empty() {
        return Err(StorageError::Decode("Decompressed to nothing".to_string()));
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_roundtrip() {
        let text = r#"{"value":{"title":"Capitals of Africa","questions":[1,2,3]},"timestamp":1}"#;
        let packed = compress(text);

        assert_ne!(packed, text);
        assert_eq!(decompress(&packed).unwrap(), text);
    }

    #[test]
    fn test_repetitive_text_shrinks() {
        let text = "question ".repeat(200);
        assert!(compress(&text).len() < text.len());
    }

    #[test]
    fn test_plain_json_is_rejected() {
        assert!(decompress(r#"{"value":1,"timestamp":2}"#).is_err());
    }

    #[test]
    fn test_base64_that_is_not_lz4_is_rejected() {
        // "hello world!" in base64: decodes fine but is not an LZ4 block
        assert!(decompress("aGVsbG8gd29ybGQh").is_err());
        assert!(decompress("").is_err());
    }
}
