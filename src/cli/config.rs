//! TOML configuration file support.
//!
//! Reader settings can be kept in a config file instead of being passed each time:
//!
//! ```toml
//! # mzdb.toml
//! [reader]
//! cache_size_kib = 65536
//! mmap_size = 268435456
//!
//! [xic]
//! ppm = 5.0
//! method = "nearest"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use mzdb::model::XicMethod;
use mzdb::reader::ReaderConfig;

/// Root configuration structure for mzdb.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// SQLite connection settings.
    #[serde(default)]
    pub reader: Option<ReaderConfig>,

    /// Defaults for the xic command.
    #[serde(default)]
    pub xic: XicConfig,
}

/// Defaults for the xic command.
#[derive(Debug, Default, Deserialize)]
pub struct XicConfig {
    /// m/z tolerance in ppm.
    pub ppm: Option<f64>,

    /// Peak selection rule.
    pub method: Option<XicMethod>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load the file if one was given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Reader configuration, falling back to the library defaults.
    pub fn reader_config(&self) -> ReaderConfig {
        self.reader.clone().unwrap_or_default()
    }
}
