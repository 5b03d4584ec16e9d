//! Runtime configuration for kvtable tables.
//!
//! Configuration is plain data loaded from TOML. Nothing here touches the
//! store; `kvtable-core` reads these values when a table is initialized.

use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

/// Default region (database) name used for every store call.
pub const DEFAULT_REGION: &str = "kvram";

/// Default upper bound on one packed key.
pub const DEFAULT_MAX_KEY_BYTES: u32 = 1024;

/// Default upper bound on one packed value.
pub const DEFAULT_MAX_VALUE_BYTES: u32 = 4 * 1024 * 1024;

/// Default number of released cursor handles an index keeps for reuse.
pub const DEFAULT_CURSOR_POOL_SIZE: usize = 4;

/// Region names share the identifier limit of the store.
const MAX_REGION_LEN: usize = 12;

/// Pool sizes above this are almost certainly a typo.
const MAX_CURSOR_POOL_SIZE: usize = 64;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

///
/// KvConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct KvConfig {
    pub region: String,
    pub max_key_bytes: u32,
    pub max_value_bytes: u32,
    pub cursor_pool_size: usize,
    pub debug: bool,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            max_key_bytes: DEFAULT_MAX_KEY_BYTES,
            max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
            cursor_pool_size: DEFAULT_CURSOR_POOL_SIZE,
            debug: false,
        }
    }
}

impl KvConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let region_len = self.region.len();
        if region_len == 0 || region_len > MAX_REGION_LEN {
            return Err(ConfigError::Invalid(format!(
                "region '{}' must be 1..={MAX_REGION_LEN} bytes",
                self.region
            )));
        }
        if !self.region.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "region '{}' must be ASCII",
                self.region
            )));
        }
        if self.max_key_bytes == 0 {
            return Err(ConfigError::Invalid("max_key_bytes must be non-zero".into()));
        }
        if self.max_value_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_value_bytes must be non-zero".into(),
            ));
        }
        if self.cursor_pool_size > MAX_CURSOR_POOL_SIZE {
            return Err(ConfigError::Invalid(format!(
                "cursor_pool_size {} exceeds max {MAX_CURSOR_POOL_SIZE}",
                self.cursor_pool_size
            )));
        }

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = KvConfig::from_toml_str("").expect("empty config should parse");

        assert_eq!(config, KvConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let config = KvConfig::from_toml_str(
            r#"
            region = "kvdisk"
            cursor_pool_size = 0
            debug = true
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.region, "kvdisk");
        assert_eq!(config.cursor_pool_size, 0);
        assert!(config.debug);
        assert_eq!(config.max_key_bytes, DEFAULT_MAX_KEY_BYTES);
        assert_eq!(config.max_value_bytes, DEFAULT_MAX_VALUE_BYTES);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = KvConfig::from_toml_str("regoin = \"kvram\"").unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)), "unexpected error: {err}");
    }

    #[test]
    fn overlong_region_is_invalid() {
        let err = KvConfig::from_toml_str("region = \"thisistoolongforaname\"").unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)), "unexpected error: {err}");
    }

    #[test]
    fn zero_value_limit_is_invalid() {
        let err = KvConfig::from_toml_str("max_value_bytes = 0").unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)), "unexpected error: {err}");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = KvConfig::load("/nonexistent/kvtable.toml").unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }), "unexpected error: {err}");
    }
}
