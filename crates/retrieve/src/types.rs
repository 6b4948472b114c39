use serde::{Deserialize, Serialize};

use crate::error::RetrieveError;

/// A clinical phrase extracted from the note by an upstream NER step.
/// The retriever only consumes the span text; offsets ride along for the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
}

/// One keyword-expansion rule: when any trigger substring appears in the
/// lower-cased note, the listed phrases join the query plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionRule {
    pub triggers: Vec<String>,
    pub phrases: Vec<String>,
}

/// Retrieval policy knobs. All tables are data so the heuristics can be
/// tuned without touching control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveConfig {
    /// Every index search asks for at least this many hits, regardless of
    /// the caller's `top_k`, so aggregation has material to work with.
    #[serde(default = "default_overfetch_floor")]
    pub overfetch_floor: usize,

    /// How many entity phrases join the query plan.
    #[serde(default = "default_max_entity_phrases")]
    pub max_entity_phrases: usize,

    /// Entity phrases shorter than this are noise and get dropped.
    #[serde(default = "default_min_phrase_chars")]
    pub min_phrase_chars: usize,

    /// Flat additive boost applied once per candidate when its system's
    /// cues appear in the note.
    #[serde(default = "default_boost")]
    pub boost: f32,

    /// Substrings of the lower-cased note that signal diagnosis relevance.
    #[serde(default = "default_diagnosis_cues")]
    pub diagnosis_cues: Vec<String>,

    /// Substrings of the lower-cased note that signal procedure relevance.
    #[serde(default = "default_procedure_cues")]
    pub procedure_cues: Vec<String>,

    /// Keyword-expansion rules compensating for embedding blind spots on
    /// domain abbreviations.
    #[serde(default = "default_expansions")]
    pub expansions: Vec<ExpansionRule>,
}

fn default_overfetch_floor() -> usize {
    10
}

fn default_max_entity_phrases() -> usize {
    3
}

fn default_min_phrase_chars() -> usize {
    3
}

fn default_boost() -> f32 {
    0.08
}

fn default_diagnosis_cues() -> Vec<String> {
    [
        "diagnos",
        "tear",
        "fracture",
        "pain",
        "disease",
        "injury",
        "infarct",
        "diabetes",
        "hypertension",
        "infection",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_procedure_cues() -> Vec<String> {
    [
        "arthroscop",
        "surgery",
        "repair",
        "procedure",
        "consult",
        "outpatient",
        "therapy",
        "mri",
        "ct",
        "x-ray",
        "injection",
        "stent",
        "placement",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_expansions() -> Vec<ExpansionRule> {
    fn rule(triggers: &[&str], phrases: &[&str]) -> ExpansionRule {
        ExpansionRule {
            triggers: triggers.iter().map(|s| s.to_string()).collect(),
            phrases: phrases.iter().map(|s| s.to_string()).collect(),
        }
    }
    vec![
        rule(
            &["mri"],
            &[
                "mri scan",
                "magnetic resonance imaging",
                "diagnostic imaging of joint",
            ],
        ),
        rule(
            &["arthroscop", "surgery", "repair"],
            &["surgical procedure", "arthroscopic repair"],
        ),
        rule(
            &["consult", "outpatient", "follow-up"],
            &[
                "outpatient office visit",
                "evaluation and management consultation",
            ],
        ),
        rule(
            &["therapy"],
            &["physical therapy session", "therapeutic exercise"],
        ),
    ]
}

impl Default for RetrieveConfig {
    fn default() -> Self {
        Self {
            overfetch_floor: default_overfetch_floor(),
            max_entity_phrases: default_max_entity_phrases(),
            min_phrase_chars: default_min_phrase_chars(),
            boost: default_boost(),
            diagnosis_cues: default_diagnosis_cues(),
            procedure_cues: default_procedure_cues(),
            expansions: default_expansions(),
        }
    }
}

impl RetrieveConfig {
    pub fn validate(&self) -> Result<(), RetrieveError> {
        if self.overfetch_floor == 0 {
            return Err(RetrieveError::InvalidConfig(
                "overfetch_floor must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.boost) {
            return Err(RetrieveError::InvalidConfig(format!(
                "boost must be within [0, 1], got {}",
                self.boost
            )));
        }
        Ok(())
    }
}
