//! Oracle configuration loaded from TOML.
//!
//! ```toml
//! cache_capacity = 256
//!
//! [prices]
//! BTC = 35000.0
//!
//! [funding_rates]
//! BTC = 0.8
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use perpflow_core::Identity;

use crate::authority::{AttestationAuthority, Feed};
use crate::cache::CachedSource;
use crate::source::FixedTable;

/// Errors from loading a TOML config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Read a file and parse it with `parse`, tagging I/O failures with the path.
pub fn load_toml<T>(path: &Path, parse: impl FnOnce(&str) -> Result<T, ConfigError>) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub prices: BTreeMap<String, f64>,
    pub funding_rates: BTreeMap<String, f64>,
    /// Per-authority LRU size; 0 disables caching.
    pub cache_capacity: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            prices: [("BTC", 35_000.0), ("ETH", 2_200.5), ("UNI", 17.5)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            funding_rates: [("BTC", 0.8), ("ETH", 0.8), ("UNI", 0.8)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            cache_capacity: 256,
        }
    }
}

impl OracleConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path, Self::from_toml)
    }

    /// Rates must be finite; prices must also be positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some((ticker, price)) = self.prices.iter().find(|(_, p)| !(p.is_finite() && **p > 0.0)) {
            return Err(ConfigError::Invalid(format!(
                "price for {ticker} must be positive and finite, got {price}"
            )));
        }
        if let Some((ticker, rate)) = self.funding_rates.iter().find(|(_, r)| !r.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "funding rate for {ticker} must be finite, got {rate}"
            )));
        }
        Ok(())
    }

    pub fn table(&self, feed: Feed) -> FixedTable {
        match feed {
            Feed::Price => FixedTable::from_map(self.prices.clone()),
            Feed::FundingRate => FixedTable::from_map(self.funding_rates.clone()),
        }
    }

    /// An authority for `feed` backed by this config's table behind an LRU.
    pub fn authority(&self, feed: Feed, identity: Identity) -> AttestationAuthority {
        AttestationAuthority::new(
            feed,
            identity,
            CachedSource::new(self.table(feed), self.cache_capacity),
        )
    }
}
