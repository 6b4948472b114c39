use thiserror::Error;

/// Errors raised inside the retrieval pipeline. The public retriever entry
/// point downgrades all of these to an empty candidate pool; they exist so
/// the failure can be logged with its cause.
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("invalid retrieve config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Embed(#[from] embed::EmbedError),

    #[error(transparent)]
    Index(#[from] code_index::IndexError),
}
