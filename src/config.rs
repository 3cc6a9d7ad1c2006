//! Leaderboard configuration.
//!
//! Every field has a default, so an empty file is a valid configuration.
//!
//! ```
//! use wabi_rank::LeaderboardConfig;
//!
//! let config = LeaderboardConfig::from_toml_str(r#"
//!     name = "season-7"
//!     precision_bits = 53
//! "#).unwrap();
//!
//! assert_eq!(config.name, "season-7");
//! assert_eq!(config.precision_bits, 53);
//! assert_eq!(config.scan_page_size, 100);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoder::{MAX_PRECISION_BITS, MIN_PRECISION_BITS};

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for one leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeaderboardConfig {
    /// Identifies which collection of players this is. Only used for logging.
    pub name: String,

    /// Exact integer bits available for combined keys. Use 53 when keys end
    /// up in a store that holds them as `f64`.
    pub precision_bits: u32,

    /// Positions fetched per index call while streaming dense rankings.
    pub scan_page_size: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            name: "leaderboard".to_owned(),
            precision_bits: MAX_PRECISION_BITS,
            scan_page_size: 100,
        }
    }
}

impl LeaderboardConfig {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or fails
    /// [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Toml`] for malformed TOML or unknown fields,
    /// [`ConfigError::Invalid`] if [`validate`](Self::validate) fails.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the leaderboard name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the key precision in bits.
    #[must_use]
    pub fn with_precision_bits(mut self, bits: u32) -> Self {
        self.precision_bits = bits;
        self
    }

    /// Sets the dense-ranking page size.
    #[must_use]
    pub fn with_scan_page_size(mut self, size: usize) -> Self {
        self.scan_page_size = size;
        self
    }

    /// Checks every field is within its accepted range.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first field out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_owned()));
        }
        if !(MIN_PRECISION_BITS..=MAX_PRECISION_BITS).contains(&self.precision_bits) {
            return Err(ConfigError::Invalid(format!(
                "precision_bits must be {MIN_PRECISION_BITS}..={MAX_PRECISION_BITS}, got {}",
                self.precision_bits
            )));
        }
        if self.scan_page_size == 0 {
            return Err(ConfigError::Invalid("scan_page_size must be at least 1".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_yields_defaults() {
        let config = LeaderboardConfig::from_toml_str("").unwrap();
        assert_eq!(config, LeaderboardConfig::default());
        assert_eq!(config.precision_bits, 64);
    }

    #[test]
    fn toml_overrides_fields() {
        let config = LeaderboardConfig::from_toml_str(
            r#"
            name = "game:leaderboard:main"
            precision_bits = 53
            scan_page_size = 8
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            LeaderboardConfig::new()
                .with_name("game:leaderboard:main")
                .with_precision_bits(53)
                .with_scan_page_size(8)
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = LeaderboardConfig::from_toml_str("page = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for toml in ["precision_bits = 52", "precision_bits = 65", "scan_page_size = 0", "name = \" \""] {
            let err = LeaderboardConfig::from_toml_str(toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{toml}");
        }
    }

    #[test]
    fn load_reads_a_file() {
        let path = std::env::temp_dir().join(format!("wabi_rank_config_{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "name = \"weekly\"").unwrap();
        drop(file);

        let config = LeaderboardConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.name, "weekly");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = LeaderboardConfig::load("/nonexistent/wabi_rank.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
