//! End-to-end API tests against the full router with a stub embedding
//! backend and a scripted model channel.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use catalog::{CodeEntry, CodeSystem};
use code_index::{AnnConfig, CodeIndex};
use embed::{EmbedClient, EmbedConfig};
use http_body_util::BodyExt;
use refine::{
    GenerateClient, GenerateError, RefineConfig, Refiner, BACKFILL_REASON, FALLBACK_REASON,
};
use retrieve::{RetrieveConfig, Retriever};
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Scripted model double: pops one canned result per call, then fails.
struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, GenerateError>>>,
}

impl ScriptedClient {
    fn new(responses: Vec<Result<String, GenerateError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    fn always_down() -> Self {
        Self::new(vec![])
    }
}

#[async_trait]
impl GenerateClient for ScriptedClient {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(GenerateError::Http("model channel down".into())))
    }
}

fn test_catalog() -> Vec<CodeEntry> {
    vec![
        CodeEntry::new(
            "M25.561",
            CodeSystem::Diagnosis,
            "Pain in right knee",
        ),
        CodeEntry::new(
            "S83.241A",
            CodeSystem::Diagnosis,
            "Medial meniscus tear right knee initial encounter",
        ),
        CodeEntry::new("E11.9", CodeSystem::Diagnosis, "Type 2 diabetes mellitus"),
        CodeEntry::new(
            "29881",
            CodeSystem::Procedure,
            "Knee arthroscopy with meniscectomy",
        ),
        CodeEntry::new(
            "73721",
            CodeSystem::Procedure,
            "MRI lower extremity joint without contrast",
        ),
        CodeEntry::new("99213", CodeSystem::Procedure, "Office outpatient visit"),
    ]
}

async fn test_router(client: ScriptedClient) -> Router {
    let embedder = Arc::new(EmbedClient::new(EmbedConfig::default()).unwrap());
    let index = Arc::new(
        CodeIndex::build(test_catalog(), &embedder, AnnConfig::default())
            .await
            .unwrap(),
    );
    let retriever = Retriever::new(index.clone(), embedder, RetrieveConfig::default()).unwrap();
    let refiner = Refiner::new(Arc::new(client), RefineConfig::default());
    let state = Arc::new(ServerState::with_components(
        ServerConfig::default(),
        index,
        retriever,
        refiner,
        false,
    ));
    build_router(state)
}

async fn post_suggest(router: Router, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/suggest")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let router = test_router(ScriptedClient::always_down()).await;
    let (status, body) = get_json(router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "claimsense-server");
}

#[tokio::test]
async fn readiness_reports_index_and_model_status() {
    let router = test_router(ScriptedClient::always_down()).await;
    let (status, body) = get_json(router, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["components"]["api"], "ready");
    assert_eq!(body["components"]["index"]["codes"], 6);
    assert_eq!(body["components"]["index"]["dim"], 384);
    assert_eq!(body["components"]["model"], "offline");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let router = test_router(ScriptedClient::always_down()).await;
    let (status, body) = get_json(router, "/api/v1/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn blank_text_is_rejected() {
    let router = test_router(ScriptedClient::always_down()).await;
    let (status, body) = post_suggest(router, json!({"text": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn out_of_range_top_k_is_rejected() {
    for top_k in [0, 51] {
        let router = test_router(ScriptedClient::always_down()).await;
        let (status, body) =
            post_suggest(router, json!({"text": "knee pain", "top_k": top_k})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "top_k {top_k}");
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn hybrid_with_dead_model_falls_back_to_candidates() {
    let router = test_router(ScriptedClient::always_down()).await;
    let (status, body) = post_suggest(
        router,
        json!({
            "text": "Right knee MRI shows a medial meniscus tear, knee pain on exam",
            "entities": [{"text": "medial meniscus tear"}, {"text": "knee pain"}],
            "top_k": 4
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "hybrid");
    let suggestions = body["suggestions"].as_array().unwrap();
    assert!(!suggestions.is_empty());
    assert!(suggestions.len() <= 4);
    assert_eq!(body["total"], suggestions.len());
    // Every item comes from the deterministic fallback or mix backfill.
    for item in suggestions {
        let reason = item["reason"].as_str().unwrap();
        assert!(
            reason == FALLBACK_REASON || reason == BACKFILL_REASON,
            "unexpected reason: {reason}"
        );
    }
    // Mix policy guarantees at least one diagnosis when the pool has one.
    assert!(suggestions.iter().any(|s| s["system"] == "ICD-10"));
}

#[tokio::test]
async fn hybrid_passes_model_ranking_through() {
    let response = json!([
        {
            "code": "S83.241A",
            "system": "ICD-10",
            "description": "Medial meniscus tear right knee initial encounter",
            "score": 0.95,
            "reason": "The note documents a medial meniscus tear."
        }
    ])
    .to_string();
    let router = test_router(ScriptedClient::new(vec![Ok(response)])).await;
    let (status, body) = post_suggest(
        router,
        json!({"text": "MRI confirms medial meniscus tear", "top_k": 1}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["code"], "S83.241A");
    assert_eq!(
        suggestions[0]["reason"],
        "The note documents a medial meniscus tear."
    );
}

#[tokio::test]
async fn direct_with_dead_model_returns_empty_list() {
    let router = test_router(ScriptedClient::always_down()).await;
    let (status, body) = post_suggest(
        router,
        json!({"text": "Type 2 diabetes follow-up", "mode": "direct"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "direct");
    assert_eq!(body["total"], 0);
    assert!(body["suggestions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn direct_mode_skips_mix_policy() {
    // An all-procedure model answer stays all-procedure in direct mode.
    let response = json!([
        {"code": "29881", "system": "CPT", "description": "d", "score": 0.9, "reason": "r"},
        {"code": "73721", "system": "CPT", "description": "d", "score": 0.8, "reason": "r"}
    ])
    .to_string();
    let router = test_router(ScriptedClient::new(vec![Ok(response)])).await;
    let (status, body) = post_suggest(
        router,
        json!({"text": "knee arthroscopy performed", "mode": "direct", "top_k": 2}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    assert!(suggestions.iter().all(|s| s["system"] == "CPT"));
}

#[tokio::test]
async fn defaults_apply_when_omitted() {
    // No mode, no top_k, no entities: hybrid with top_k 5.
    let router = test_router(ScriptedClient::always_down()).await;
    let (status, body) = post_suggest(router, json!({"text": "knee pain"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "hybrid");
    assert!(body["entities"].as_array().unwrap().is_empty());
    let suggestions = body["suggestions"].as_array().unwrap();
    assert!(!suggestions.is_empty());
    assert!(suggestions.len() <= 5);
}

#[tokio::test]
async fn echoes_request_id_header() {
    let router = test_router(ScriptedClient::always_down()).await;
    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "test-req-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "test-req-1");
}
