//! Core services for slat-server
//!
//! Each service is a set of free async functions over the shared pool; the
//! HTTP handlers in [`crate::api`] are thin wrappers around them.

pub mod annotator;
pub mod csv_reader;
pub mod ingestor;
pub mod listing;
pub mod progress;
pub mod reconciler;
