use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::GenerateError;

/// The model channel behind the refiner. Object-safe so tests can script it
/// and the production impl can be swapped without touching the refiner.
#[async_trait]
pub trait GenerateClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Connection settings for a Gemini-style `generateContent` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// HTTP implementation of [`GenerateClient`] for the Gemini
/// `generateContent` API.
#[derive(Debug, Clone)]
pub struct HttpGenerateClient {
    http: reqwest::Client,
    cfg: GenerateConfig,
}

impl HttpGenerateClient {
    pub fn new(cfg: GenerateConfig) -> Result<Self, GenerateError> {
        if cfg.api_key.is_none() {
            return Err(GenerateError::InvalidConfig(
                "api_key is required for the model channel".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                GenerateError::InvalidConfig(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { http, cfg })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.cfg.api_base.trim_end_matches('/'),
            self.cfg.model
        )
    }
}

#[async_trait]
impl GenerateClient for HttpGenerateClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let key = self
            .cfg
            .api_key
            .as_deref()
            .ok_or_else(|| GenerateError::InvalidConfig("api_key missing".into()))?;

        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerateError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api(format!("HTTP {status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerateError::Api(format!("invalid JSON body: {e}")))?;

        extract_text(&body).ok_or(GenerateError::Empty)
    }
}

/// Pull the generated text out of a `generateContent` response:
/// `candidates[0].content.parts[*].text`, concatenated.
fn extract_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
