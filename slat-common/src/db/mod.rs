//! Database access layer for SLAT
//!
//! SQLite via sqlx, the single source of truth for persistent state: sentences,
//! users, the per-user batch ledger, annotations, and runtime settings.

pub mod init;
pub mod migrations;
pub mod models;
pub mod settings;

pub use init::{apply_schema, init_database};
