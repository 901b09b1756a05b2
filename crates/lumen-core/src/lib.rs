//! Core types for the Lumen media submission and approval service.
//!
//! This crate holds the domain model (media, versions, share tokens, upload
//! sessions), the unified error type with its HTTP presentation metadata,
//! and environment-driven configuration. It deliberately contains no I/O:
//! storage, persistence and HTTP live in their own crates.

pub mod config;
pub mod error;
pub mod models;

pub use config::{Config, StorageBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
