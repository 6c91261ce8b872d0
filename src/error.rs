//! # Error Types
//!
//! Custom error types for the trainer using `thiserror`.
//!
//! Only sequence loading is strict: a malformed or overlapping target file
//! aborts the load. Everything that can go wrong during a running session
//! (unplugged controller, fingerprint mismatch, stale config entry) degrades
//! silently and never surfaces as an error from the tick path.

use thiserror::Error;

/// Main error type for the trainer
#[derive(Debug, Error)]
pub enum TrainerError {
    /// Target sequence validation errors (fail-fast at load time)
    #[error("sequence validation error: {0}")]
    Sequence(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Sequence file parse errors
    #[error("sequence file error: {0}")]
    SequenceFile(#[from] serde_json::Error),

    /// Mapping configuration parse/version errors
    #[error("mapping config error: {0}")]
    Mapping(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the trainer
pub type Result<T> = std::result::Result<T, TrainerError>;
