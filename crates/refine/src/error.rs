use thiserror::Error;

/// Errors from the generative model channel. All of them funnel into the
/// refiner's deterministic fallback paths; none abort a request.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid generate config: {0}")]
    InvalidConfig(String),

    /// Transport-level failure reaching the endpoint.
    #[error("model request failed: {0}")]
    Http(String),

    /// The endpoint answered with an error status or unusable body.
    #[error("model response invalid: {0}")]
    Api(String),

    /// The endpoint answered successfully but produced no text.
    #[error("model returned an empty response")]
    Empty,
}

/// A parse strategy could not extract suggestions from model output.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("not valid JSON: {0}")]
    Json(String),

    #[error("JSON shape not usable: {0}")]
    Shape(String),

    #[error("no suggestion payload found in text")]
    NotFound,
}
