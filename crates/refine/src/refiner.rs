use std::sync::Arc;

use catalog::CodeSystem;
use code_index::Candidate;
use retrieve::Entity;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::GenerateClient;
use crate::parse::extract_suggestions;
use crate::prompt::{build_direct_prompt, build_refine_prompt, STRICT_SUFFIX};
use crate::types::{RefineConfig, Suggestion};

/// Reason attached when the model channel is unavailable and the refiner
/// falls back to the raw candidate list.
pub const FALLBACK_REASON: &str =
    "Selected from candidate list as a fallback because the model response was unavailable.";

/// Generative re-ranker with deterministic fallbacks.
///
/// Two entry points: [`refine`](Refiner::refine) ranks an existing candidate
/// pool (closed-world by instruction), [`generate_direct`](Refiner::generate_direct)
/// asks the model to propose codes from the text alone. Neither returns an
/// error; a dead model channel degrades to the documented fallback output.
pub struct Refiner {
    client: Arc<dyn GenerateClient>,
    cfg: RefineConfig,
}

impl Refiner {
    pub fn new(client: Arc<dyn GenerateClient>, cfg: RefineConfig) -> Self {
        Self { client, cfg }
    }

    /// Rank `candidates` against the note. Falls back to `candidates[..k]`
    /// with a fixed reason when the model cannot be used.
    pub async fn refine(
        &self,
        entities: &[Entity],
        candidates: &[Candidate],
        text: &str,
        top_k: usize,
    ) -> Vec<Suggestion> {
        let limit = top_k.max(1);
        let prompt = build_refine_prompt(text, entities, candidates, limit, &self.cfg);

        if let Some(items) = self.generate_and_parse(&prompt).await {
            let mut out: Vec<Suggestion> = items
                .iter()
                .map(|item| normalize_refined(item))
                .collect();
            out.truncate(limit);
            if !out.is_empty() {
                return out;
            }
        }

        debug!("model channel unavailable, returning candidate fallback");
        candidates
            .iter()
            .take(limit)
            .map(|c| Suggestion {
                code: c.code.clone(),
                system: c.system,
                description: c.description.clone(),
                score: c.score,
                reason: FALLBACK_REASON.to_string(),
            })
            .collect()
    }

    /// Propose codes from the text alone. Falls back to an empty list when
    /// the model cannot be used: no hard-coded guesses.
    pub async fn generate_direct(
        &self,
        entities: &[Entity],
        text: &str,
        top_k: usize,
    ) -> Vec<Suggestion> {
        let limit = top_k.max(1);
        let prompt = build_direct_prompt(text, entities, &self.cfg);

        let Some(items) = self.generate_and_parse(&prompt).await else {
            debug!("model channel unavailable in direct mode, returning empty");
            return Vec::new();
        };

        items
            .iter()
            .take(limit)
            .enumerate()
            .map(|(idx, item)| normalize_direct(item, idx))
            .collect()
    }

    /// One model call, and on failure (transport or parse) exactly one
    /// stricter retry before giving up.
    async fn generate_and_parse(&self, prompt: &str) -> Option<Vec<Value>> {
        match self.client.generate(prompt).await {
            Ok(text) => {
                if let Some(items) = extract_suggestions(&text) {
                    return Some(items);
                }
                warn!("model output unparseable, retrying with strict instruction");
            }
            Err(err) => {
                warn!(error = %err, "model call failed, retrying with strict instruction");
            }
        }

        let strict_prompt = format!("{prompt}{STRICT_SUFFIX}");
        match self.client.generate(&strict_prompt).await {
            Ok(text) => extract_suggestions(&text),
            Err(err) => {
                warn!(error = %err, "strict retry failed");
                None
            }
        }
    }
}

/// Refine-mode normalization: missing or non-numeric scores become 0.0.
fn normalize_refined(item: &Value) -> Suggestion {
    Suggestion {
        code: string_field(item, "code"),
        system: CodeSystem::from_label(&string_field(item, "system")),
        description: string_field(item, "description"),
        score: match numeric_score(item) {
            Some(score) => score.clamp(0.0, 1.0),
            None => 0.0,
        },
        reason: string_field(item, "reason"),
    }
}

/// Direct-mode normalization: a missing score becomes a synthetic
/// descending ladder so earlier items outrank later ones.
fn normalize_direct(item: &Value, idx: usize) -> Suggestion {
    Suggestion {
        code: string_field(item, "code"),
        system: CodeSystem::from_label(&string_field(item, "system")),
        description: string_field(item, "description"),
        score: match numeric_score(item) {
            Some(score) => score.clamp(0.0, 1.0),
            None => (0.9 - 0.1 * idx as f32).max(0.5),
        },
        reason: string_field(item, "reason"),
    }
}

fn numeric_score(item: &Value) -> Option<f32> {
    item.get("score")?.as_f64().map(|f| f as f32)
}

fn string_field(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
