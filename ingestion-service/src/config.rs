use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

/// Config file looked up in the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "d0010-config.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub create_if_missing: bool,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://meter_readings.db".to_string(),
            max_connections: 1,
            create_if_missing: true,
            busy_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImportConfig {
    /// Record `030` lines with fewer than ten fields as skipped lines instead
    /// of ignoring them.
    pub report_short_reading_lines: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Where to write a Prometheus text rendering of the run's counters.
    pub textfile_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicitly named file must exist. Otherwise `d0010-config.toml` in
    /// the working directory is used when present, else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
        Self::from_toml(&contents).map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}
