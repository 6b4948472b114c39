use serde_json::{json, Value};

use crate::config::EmbedConfig;
use crate::error::EmbedError;

#[derive(Clone, Copy)]
pub(crate) enum ApiProviderKind {
    HuggingFace,
    OpenAi,
    Custom,
}

pub(crate) fn api_provider_kind(cfg: &EmbedConfig) -> ApiProviderKind {
    let provider = cfg
        .api_provider
        .as_deref()
        .unwrap_or("custom")
        .to_ascii_lowercase();
    match provider.as_str() {
        "hf" | "huggingface" => ApiProviderKind::HuggingFace,
        "openai" | "gpt" => ApiProviderKind::OpenAi,
        _ => ApiProviderKind::Custom,
    }
}

pub(crate) fn build_api_payload(
    provider: ApiProviderKind,
    texts: &[String],
    cfg: &EmbedConfig,
) -> Value {
    match provider {
        ApiProviderKind::HuggingFace => json!({ "inputs": texts }),
        ApiProviderKind::OpenAi => json!({ "input": texts, "model": cfg.model_name }),
        ApiProviderKind::Custom => json!({ "texts": texts }),
    }
}

pub(crate) async fn send_api_request(
    http: &reqwest::Client,
    url: &str,
    cfg: &EmbedConfig,
    payload: Value,
) -> Result<Value, EmbedError> {
    let mut request = http.post(url).header("Content-Type", "application/json");
    if let Some(header) = cfg.api_auth_header.as_deref() {
        request = request.header("Authorization", header);
    }

    let response = request
        .json(&payload)
        .send()
        .await
        .map_err(|e| EmbedError::Request(format!("HTTP request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(EmbedError::Request(format!("HTTP error {status}: {body}")));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| EmbedError::Response(format!("invalid JSON response: {e}")))
}

/// Accepts the response shapes the common providers emit: a bare array of
/// vectors, `{"embeddings": [...]}`, or OpenAI-style
/// `{"data": [{"embedding": [...]}, ...]}`.
pub(crate) fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                let mut vectors = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(mut obj) => {
                            if let Some(embedding) = obj.remove("embedding") {
                                vectors.push(parse_embedding_vector(embedding)?);
                            } else {
                                return Err(EmbedError::Response(
                                    "missing `embedding` field in data item".into(),
                                ));
                            }
                        }
                        _ => {
                            return Err(EmbedError::Response(
                                "unexpected entry inside `data` array".into(),
                            ))
                        }
                    }
                }
                return Ok(vectors);
            }

            Err(EmbedError::Response("unsupported API response shape".into()))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, EmbedError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| EmbedError::Response("non-finite embedding value".into())),
                other => Err(EmbedError::Response(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(EmbedError::Response(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
