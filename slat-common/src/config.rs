//! Bootstrap configuration loading and database path resolution
//!
//! Only the bits needed before the database exists live here: where the
//! database file is and what port to listen on. Everything else is a
//! runtime setting in the `settings` table (see [`crate::db`]).

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming the database file
pub const DATABASE_ENV_VAR: &str = "SLAT_DATABASE";

/// Default listen port
pub const DEFAULT_PORT: u16 = 5750;

/// Bootstrap configuration file contents (`slat.toml`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    /// Path to the SQLite database file
    pub database_path: Option<PathBuf>,
    /// HTTP listen port
    pub port: Option<u16>,
    /// Default tracing filter (overridden by RUST_LOG)
    pub log_filter: Option<String>,
}

impl BootstrapConfig {
    /// Load the bootstrap config file, if one exists.
    ///
    /// Looks for `slat/slat.toml` under the platform config directory
    /// (e.g. `~/.config/slat/slat.toml` on Linux). A missing file is not an
    /// error; a malformed file is.
    pub fn load() -> Result<Self> {
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Parse a config from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }
}

/// Platform config file path (`<config dir>/slat/slat.toml`)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("slat").join("slat.toml"))
}

/// Resolve the database path following the priority order:
/// 1. Command-line argument (highest priority)
/// 2. `SLAT_DATABASE` environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_database_path(cli_arg: Option<&PathBuf>, config: &BootstrapConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.clone();
    }
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        return PathBuf::from(path);
    }
    if let Some(path) = &config.database_path {
        return path.clone();
    }
    default_database_path()
}

/// OS-dependent default database location (`<data dir>/slat/slat.db`)
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("slat").join("slat.db"))
        .unwrap_or_else(|| PathBuf::from("./slat.db"))
}
