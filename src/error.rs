//! Error types for Waylink
//!
//! This module defines all error types used throughout the address resolution
//! engine. Uses `thiserror` for ergonomic error handling with automatic
//! `Display` and `Error` trait implementations.

use thiserror::Error;

/// The primary error type for Waylink operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration-related errors (invalid config, bad debounce window, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transient fetch errors from the record provider (store unreachable,
    /// query timeout, etc.). Dispatchers recover from these locally.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Failure to persist a manually entered address.
    #[error("Persist error: {0}")]
    Persist(String),

    /// Location index rebuild failures (roster or location fetch failed).
    #[error("Index rebuild error: {0}")]
    IndexRebuild(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for Waylink operations.
pub type Result<T> = std::result::Result<T, EngineError>;
