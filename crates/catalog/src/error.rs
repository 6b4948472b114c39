use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading catalog CSV files.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to open catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("catalog file {path} is missing a required column (expected one of: {expected})")]
    MissingColumn { path: PathBuf, expected: String },
}
