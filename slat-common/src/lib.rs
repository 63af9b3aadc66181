//! Shared library for SLAT (Sentence Labeling & Assignment Tracker)
//!
//! Provides the pieces common to the service binary and its tests:
//! - Error types ([`Error`], [`Result`])
//! - Database initialization, schema, and migrations ([`db`])
//! - Bootstrap configuration resolution ([`config`])
//! - Bearer-token verification primitives ([`auth`])

pub mod auth;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
