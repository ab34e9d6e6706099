//! Dashboard Configuration
//! Optional TOML file with the data source and display defaults.

use crate::analysis::{InjuryCategory, MAX_TOP_CITIES, MIN_TOP_CITIES};
use crate::data::DEFAULT_INFER_SCHEMA_ROWS;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CRASH_EXPLORER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "crash_explorer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Crash CSV loaded at startup; the Browse button is used when unset.
    pub csv_path: Option<PathBuf>,
    pub infer_schema_rows: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            infer_schema_rows: DEFAULT_INFER_SCHEMA_ROWS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub top_cities: usize,
    /// Initial injury category, by label or short form (`nonfatal`, `fatal`, `both`).
    pub category: String,
    pub raw_preview_rows: usize,
    pub banner_image: Option<PathBuf>,
    pub map_point_radius: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_cities: 10,
            category: "nonfatal".to_string(),
            raw_preview_rows: 200,
            banner_image: None,
            map_point_radius: 2.5,
        }
    }
}

impl DisplayConfig {
    pub fn top_cities(&self) -> usize {
        self.top_cities.clamp(MIN_TOP_CITIES, MAX_TOP_CITIES)
    }

    /// Configured category, falling back to non-fatal when the name is unknown.
    pub fn category(&self) -> InjuryCategory {
        self.category.parse::<InjuryCategory>().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to the default injury category");
            InjuryCategory::default()
        })
    }
}

impl Config {
    /// Load from `$CRASH_EXPLORER_CONFIG` or `./crash_explorer.toml`.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}
