//! Configuration loaded from a TOML file.

use crate::market::DEFAULT_REQUESTS_PER_MINUTE;
use crate::portfolio::{DEFAULT_CONFIDENCE, DEFAULT_HARVEST_WINDOW_DAYS, DEFAULT_RISK_FREE_RATE};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Analytics defaults and data file location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FolioConfig {
    /// Risk-free rate per period for Sharpe, Treynor and alpha
    pub risk_free_rate: f64,
    /// Confidence level for Value at Risk
    pub var_confidence: f64,
    /// Days a losing holding must be held before it is harvested
    pub harvest_window_days: i64,
    /// Rows in the top-holdings table
    pub top_holdings: usize,
    /// Market data calls allowed per minute when refreshing quotes
    pub requests_per_minute: u32,
    /// Portfolio book location; falls back to [`FolioConfig::default_data_file`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            var_confidence: DEFAULT_CONFIDENCE,
            harvest_window_days: DEFAULT_HARVEST_WINDOW_DAYS,
            top_holdings: 5,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            data_file: None,
        }
    }
}

impl FolioConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.folio/config.toml`
    /// Can be overridden with `FOLIO_CONFIG_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_CONFIG_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".folio/config.toml"))
            .unwrap_or_else(|| PathBuf::from("folio.toml"))
    }

    /// Get the default portfolio book path.
    ///
    /// Default path: `~/.folio/portfolio.json`
    /// Can be overridden with `FOLIO_DATA_FILE` environment variable.
    pub fn default_data_file() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_DATA_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".folio/portfolio.json"))
            .unwrap_or_else(|| PathBuf::from("portfolio.json"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolved portfolio book path.
    pub fn data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(Self::default_data_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = FolioConfig::default();
        assert_eq!(config.risk_free_rate, 0.02);
        assert_eq!(config.var_confidence, 0.95);
        assert_eq!(config.harvest_window_days, 30);
        assert_eq!(config.top_holdings, 5);
        assert_eq!(config.requests_per_minute, 5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = FolioConfig::load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, FolioConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "risk_free_rate = 0.04\ndata_file = \"/tmp/book.json\"\n",
        )
        .unwrap();

        let config = FolioConfig::load_from_path(&path).unwrap();
        assert_eq!(config.risk_free_rate, 0.04);
        assert_eq!(config.var_confidence, 0.95);
        assert_eq!(config.data_file(), PathBuf::from("/tmp/book.json"));
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "risk_free_rate = \"high\"").unwrap();

        let result = FolioConfig::load_from_path(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
