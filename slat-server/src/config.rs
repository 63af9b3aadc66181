//! Command-line arguments and startup configuration
//!
//! Priority order for each value: CLI argument, then environment variable,
//! then the bootstrap TOML file, then the compiled default.

use clap::Parser;
use slat_common::config::{resolve_database_path, BootstrapConfig, DEFAULT_PORT};
use std::path::PathBuf;

/// SLAT service command-line arguments
#[derive(Debug, Parser)]
#[command(name = "slat-server", version, about = "Sentence Labeling & Assignment Tracker")]
pub struct Args {
    /// Path to the SQLite database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// HTTP listen port
    #[arg(long)]
    pub port: Option<u16>,
}

/// Resolved startup configuration
#[derive(Debug)]
pub struct ServerConfig {
    pub database_path: PathBuf,
    pub port: u16,
    pub log_filter: String,
}

impl ServerConfig {
    /// Merge CLI arguments with the bootstrap config file and defaults
    pub fn resolve(args: &Args, bootstrap: &BootstrapConfig) -> Self {
        let database_path = resolve_database_path(args.database.as_ref(), bootstrap);
        let port = args.port.or(bootstrap.port).unwrap_or(DEFAULT_PORT);
        let log_filter = bootstrap
            .log_filter
            .clone()
            .unwrap_or_else(|| "info".to_string());

        Self { database_path, port, log_filter }
    }
}
