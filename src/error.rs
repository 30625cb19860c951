//! Error types for Cuebase.

use thiserror::Error;

/// Library-level error type for Cuebase operations.
#[derive(Error, Debug)]
pub enum CuebaseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript is empty: no usable caption segments were found")]
    EmptyTranscript,

    #[error("Embedding dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding or generation provider failed (network, auth, rate limit).
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for Cuebase operations.
pub type Result<T> = std::result::Result<T, CuebaseError>;
