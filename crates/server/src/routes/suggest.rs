use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use refine::{enforce_mix, Suggestion};
use retrieve::Entity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound on `top_k`; requests above this are rejected.
pub const MAX_TOP_K: usize = 50;

fn default_top_k() -> usize {
    5
}

/// Suggestion mode:
/// - `"hybrid"`: retrieve candidates from the catalog index, re-rank them
///   with the model, then balance diagnosis and procedure coverage (default)
/// - `"direct"`: ask the model to propose codes from the text alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestMode {
    #[default]
    Hybrid,
    Direct,
}

/// Suggestion request
#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    /// Clinical note or EHR-style report text
    pub text: String,

    /// Pre-extracted medical entities (optional)
    #[serde(default)]
    pub entities: Vec<Entity>,

    /// Maximum suggestions to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub mode: SuggestMode,
}

/// Suggestion response
#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub mode: SuggestMode,
    pub entities: Vec<Entity>,
    pub total: usize,
    pub suggestions: Vec<Suggestion>,
}

/// Suggest billing codes for a clinical note.
///
/// In hybrid mode the note (plus any provided entities) is embedded and
/// matched against the code catalog, the candidate pool is re-ranked by the
/// model, and the final list is balanced across ICD-10 and CPT. A dead model
/// channel degrades to the scored candidate pool rather than an error.
///
/// In direct mode the model proposes codes from the text alone; when it is
/// unavailable the suggestion list is empty.
pub async fn suggest(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SuggestRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.text.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "text must not be empty".to_string(),
        ));
    }
    if request.top_k == 0 || request.top_k > MAX_TOP_K {
        return Err(ServerError::BadRequest(format!(
            "top_k must be between 1 and {MAX_TOP_K}"
        )));
    }

    let suggestions = match request.mode {
        SuggestMode::Hybrid => {
            let pool = state
                .retriever
                .retrieve(&request.text, &request.entities, request.top_k)
                .await;
            let refined = state
                .refiner
                .refine(&request.entities, &pool, &request.text, request.top_k)
                .await;
            enforce_mix(&refined, &pool, request.top_k)
        }
        SuggestMode::Direct => {
            state
                .refiner
                .generate_direct(&request.entities, &request.text, request.top_k)
                .await
        }
    };

    Ok(Json(SuggestResponse {
        mode: request.mode,
        entities: request.entities,
        total: suggestions.len(),
        suggestions,
    }))
}
