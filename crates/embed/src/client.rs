use std::time::Duration;

use tracing::debug;

use crate::api::{api_provider_kind, build_api_payload, parse_embeddings_from_value, send_api_request};
use crate::config::EmbedConfig;
use crate::error::EmbedError;
use crate::normalize::l2_normalize_in_place;
use crate::stub::make_stub_embedding;

/// Embedding client over a remote inference endpoint or a deterministic stub.
///
/// Constructed once and shared; the inner `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct EmbedClient {
    http: reqwest::Client,
    cfg: EmbedConfig,
}

impl EmbedClient {
    pub fn new(cfg: EmbedConfig) -> Result<Self, EmbedError> {
        if cfg.mode == "api" && cfg.api_url.is_none() {
            return Err(EmbedError::InvalidConfig(
                "api_url is required for api mode".into(),
            ));
        }
        if cfg.dim == 0 {
            return Err(EmbedError::InvalidConfig("dim must be non-zero".into()));
        }

        let timeout = Duration::from_secs(cfg.api_timeout_secs.unwrap_or(30));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| EmbedError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.cfg
    }

    /// Vector dimension every returned embedding will have.
    pub fn dim(&self) -> usize {
        self.cfg.dim
    }

    /// Embed a batch of texts in one call.
    ///
    /// The output is position-aligned with the input and every vector has
    /// exactly [`dim`](Self::dim) components. When `normalize` is set the
    /// vectors are unit length.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = match self.cfg.mode.as_str() {
            "api" => self.embed_via_api(texts).await?,
            "stub" => texts
                .iter()
                .map(|text| make_stub_embedding(text, &self.cfg))
                .collect(),
            other => {
                return Err(EmbedError::InvalidConfig(format!(
                    "unknown embed mode {other:?} (expected \"api\" or \"stub\")"
                )))
            }
        };

        debug!(count = vectors.len(), dim = self.cfg.dim, "embedded batch");
        Ok(vectors)
    }

    async fn embed_via_api(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let url = self
            .cfg
            .api_url
            .as_deref()
            .ok_or_else(|| EmbedError::InvalidConfig("api_url is required for api mode".into()))?;

        let provider = api_provider_kind(&self.cfg);
        let payload = build_api_payload(provider, texts, &self.cfg);
        let response = send_api_request(&self.http, url, &self.cfg, payload).await?;
        let mut vectors = parse_embeddings_from_value(response)?;

        if vectors.len() != texts.len() {
            return Err(EmbedError::ShapeMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }
        for vector in &mut vectors {
            if vector.len() != self.cfg.dim {
                return Err(EmbedError::ShapeMismatch {
                    expected: self.cfg.dim,
                    actual: vector.len(),
                });
            }
            if self.cfg.normalize {
                l2_normalize_in_place(vector);
            }
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_client() -> EmbedClient {
        EmbedClient::new(EmbedConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn stub_batch_is_aligned_and_normalized() {
        let client = stub_client();
        let texts = vec!["knee pain".to_string(), "mri of the knee".to_string()];
        let vectors = client.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 2);
        for v in &vectors {
            assert_eq!(v.len(), 384);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4);
        }
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let client = stub_client();
        let vectors = client.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[tokio::test]
    async fn stub_is_deterministic_across_clients() {
        let a = stub_client();
        let b = stub_client();
        let texts = vec!["type 2 diabetes".to_string()];
        assert_eq!(
            a.embed_batch(&texts).await.unwrap(),
            b.embed_batch(&texts).await.unwrap()
        );
    }

    #[test]
    fn api_mode_requires_url() {
        let err = EmbedClient::new(EmbedConfig {
            mode: "api".into(),
            api_url: None,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, EmbedError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn unknown_mode_is_rejected() {
        let client = EmbedClient::new(EmbedConfig {
            mode: "onnx".into(),
            ..Default::default()
        })
        .unwrap();
        let err = client
            .embed_batch(&["text".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::InvalidConfig(_)));
    }
}
