use catalog::CodeSystem;
use serde::{Deserialize, Serialize};

/// The terminal output unit of the pipeline: one suggested billing code
/// with a confidence score and a human-readable justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub code: String,
    pub system: CodeSystem,
    pub description: String,
    pub score: f32,
    pub reason: String,
}

/// Budgets for how much material goes into a model prompt. The char caps
/// exist to keep prompts bounded regardless of note or catalog size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Clinical-text cap in the candidate-pool (refine) prompt.
    #[serde(default = "default_text_budget")]
    pub text_budget: usize,

    /// Clinical-text cap in the direct prompt, which has no candidate list
    /// competing for space.
    #[serde(default = "default_direct_text_budget")]
    pub direct_text_budget: usize,

    /// Cap on the serialized entities JSON.
    #[serde(default = "default_entities_budget")]
    pub entities_budget: usize,

    /// Cap on the serialized candidates JSON.
    #[serde(default = "default_candidates_budget")]
    pub candidates_budget: usize,

    /// How many top candidates are offered to the model at most.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

fn default_text_budget() -> usize {
    4000
}

fn default_direct_text_budget() -> usize {
    6000
}

fn default_entities_budget() -> usize {
    4000
}

fn default_candidates_budget() -> usize {
    6000
}

fn default_max_candidates() -> usize {
    20
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            text_budget: default_text_budget(),
            direct_text_budget: default_direct_text_budget(),
            entities_budget: default_entities_budget(),
            candidates_budget: default_candidates_budget(),
            max_candidates: default_max_candidates(),
        }
    }
}
