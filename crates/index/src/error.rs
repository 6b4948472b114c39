use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, persisting, or querying the code index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The artifact directory or one of its required files is missing.
    /// Fatal at startup: the service cannot answer without an index.
    #[error("index artifacts not found at {0}")]
    NotFound(PathBuf),

    /// Artifacts exist but do not describe a coherent index.
    #[error("index artifacts corrupt: {0}")]
    Corrupt(String),

    /// A vector with the wrong dimension reached the index.
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Embedding the catalog failed during a build.
    #[error(transparent)]
    Embed(#[from] embed::EmbedError),

    /// Serializing artifacts for persistence failed.
    #[error("failed to encode index artifacts: {0}")]
    Codec(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
