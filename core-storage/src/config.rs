//! Store configuration

use std::fmt;

/// Prefix carried by every key the enhanced store manages.
pub const MANAGED_KEY_PREFIX: &str = "enhanced_";

/// Fraction of the quota above which a write first runs eviction.
pub const QUOTA_HIGH_WATER_MARK: f64 = 0.9;

/// Key embedded in the build for the value obfuscation cipher.
pub const DEFAULT_CIPHER_KEY: &str = "naijaspark-quiz-app";

/// Configuration for the enhanced store.
#[derive(Clone)]
pub struct StoreConfig {
    /// Prefix marking managed keys (default: `enhanced_`)
    pub key_prefix: String,

    /// Usage/quota ratio that triggers eviction before a write (default: 0.9)
    pub high_water_mark: f64,

    /// Key used when an item is written with `encrypt = true`
    pub cipher_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: MANAGED_KEY_PREFIX.to_string(),
            high_water_mark: QUOTA_HIGH_WATER_MARK,
            cipher_key: DEFAULT_CIPHER_KEY.to_string(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("key_prefix", &self.key_prefix)
            .field("high_water_mark", &self.high_water_mark)
            .field("cipher_key", &"[REDACTED]")
            .finish()
    }
}

impl StoreConfig {
    /// Create a new store configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the managed key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the quota high-water mark.
    pub fn with_high_water_mark(mut self, ratio: f64) -> Self {
        self.high_water_mark = ratio;
        self
    }

    /// Set the cipher key.
    pub fn with_cipher_key(mut self, key: impl Into<String>) -> Self {
        self.cipher_key = key.into();
        self
    }

    /// Storage key of the managed slot for `key`.
    pub fn managed_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Whether `raw_key` lives in the managed keyspace.
    pub fn is_managed(&self, raw_key: &str) -> bool {
        raw_key.starts_with(&self.key_prefix)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.key_prefix.is_empty() {
            return Err("key_prefix cannot be empty".to_string());
        }

        if !(self.high_water_mark > 0.0 && self.high_water_mark <= 1.0) {
            return Err("high_water_mark must be in (0, 1]".to_string());
        }

        if self.cipher_key.is_empty() {
            return Err("cipher_key cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.key_prefix, "enhanced_");
        assert_eq!(config.high_water_mark, 0.9);
        assert_eq!(config.cipher_key, "naijaspark-quiz-app");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_managed_keys() {
        let config = StoreConfig::default();
        assert_eq!(config.managed_key("offline_quizzes"), "enhanced_offline_quizzes");
        assert!(config.is_managed("enhanced_offline_quizzes"));
        assert!(!config.is_managed("offline_quizzes"));
    }

    #[test]
    fn test_config_validation() {
        assert!(StoreConfig::new().with_key_prefix("").validate().is_err());
        assert!(StoreConfig::new().with_high_water_mark(0.0).validate().is_err());
        assert!(StoreConfig::new().with_high_water_mark(1.5).validate().is_err());
        assert!(StoreConfig::new().with_cipher_key("").validate().is_err());
        assert!(StoreConfig::new()
            .with_high_water_mark(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_debug_redacts_cipher_key() {
        let rendered = format!("{:?}", StoreConfig::default());
        assert!(!rendered.contains("naijaspark"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
