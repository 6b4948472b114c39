use thiserror::Error;

/// Errors surfaced by [`EmbedClient`](crate::EmbedClient).
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Configuration is inconsistent (e.g., api mode without an api_url).
    #[error("invalid embed config: {0}")]
    InvalidConfig(String),
    /// The HTTP request to the embedding endpoint failed.
    #[error("embedding request failed: {0}")]
    Request(String),
    /// The endpoint answered, but the payload could not be interpreted.
    #[error("embedding response invalid: {0}")]
    Response(String),
    /// The endpoint returned vectors of the wrong count or dimension.
    #[error("embedding shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}
