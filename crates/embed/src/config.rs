use serde::{Deserialize, Serialize};

/// Runtime configuration describing which embedding backend to use and how to
/// post-process vectors.
///
/// # Example
/// ```no_run
/// use embed::{EmbedClient, EmbedConfig};
///
/// let cfg = EmbedConfig {
///     mode: "api".into(),
///     api_url: Some("https://api-inference.huggingface.co/models/BAAI/bge-small-en-v1.5".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     api_provider: Some("hf".into()),
///     normalize: true,
///     ..Default::default()
/// };
///
/// let _client = EmbedClient::new(cfg);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedConfig {
    /// Backend selector: `"api"` (remote HTTP) or `"stub"` (deterministic hash).
    pub mode: String,
    /// Friendly model label carried into index metadata.
    pub model_name: String,
    /// API inference endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header value (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Remote provider hint: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Vector dimension. The stub always emits exactly this many components;
    /// API responses are checked against it.
    pub dim: usize,
    /// Normalize every vector to unit length (required for inner-product
    /// similarity to behave as cosine).
    pub normalize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            mode: "stub".into(),
            model_name: "bge-small-en-v1.5".into(),
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: Some(30),
            dim: 384,
            normalize: true,
        }
    }
}
