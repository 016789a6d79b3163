//! Screener configuration file.

use crate::filters::ScreenerRanges;
use crate::library::FilterLibrary;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings read from `config.toml`.
///
/// ```toml
/// library_file = "/data/screener/filter_groups.json"
/// ranges_file = "/data/screener/ranges.json"
/// default_user = "alice"
/// log_filter = "screener_core=debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Library file, unless `SCREENER_LIBRARY_FILE` is set
    pub library_file: Option<PathBuf>,
    /// JSON file of current screener ranges
    pub ranges_file: Option<PathBuf>,
    /// User id used when a command does not name one
    pub default_user: Option<String>,
    /// `tracing` filter directive, used when `RUST_LOG` is unset
    pub log_filter: Option<String>,
}

impl Config {
    /// Get the default config file path.
    ///
    /// Default path: `~/.traderslab/screener/config.toml`
    /// Can be overridden with `SCREENER_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("SCREENER_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".traderslab/screener/config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Library file to use: env override, then config, then the default.
    pub fn library_path(&self) -> PathBuf {
        if env::var_os("SCREENER_LIBRARY_FILE").is_none() {
            if let Some(path) = &self.library_file {
                return path.clone();
            }
        }
        FilterLibrary::default_path()
    }

    /// Current screener ranges, or empty ranges when no file is configured.
    pub fn ranges(&self) -> Result<ScreenerRanges> {
        match &self.ranges_file {
            Some(path) => ScreenerRanges::load_from_path(path),
            None => Ok(ScreenerRanges::new()),
        }
    }
}
