//! # ClaimSense Retrieve (`retrieve`)
//!
//! The retrieval half of the suggestion pipeline: turn one clinical note
//! (plus optional extracted entities) into a ranked, deduplicated pool of
//! candidate billing codes.
//!
//! Per request the retriever issues several embedding queries — the full
//! note, the strongest entity phrases, and keyword-expansion phrases
//! triggered by lexical cues — fans them out against the [`code_index`]
//! crate, and fuses the hits: dedup by `(code, system)` keeping the max
//! score, one flat cue boost per system, stable descending sort.
//!
//! Failures inside the pipeline degrade the request to an empty pool; they
//! never surface as errors to the caller.

mod aggregate;
mod error;
mod plan;
mod retriever;
mod types;

pub use crate::error::RetrieveError;
pub use crate::retriever::Retriever;
pub use crate::types::{Entity, ExpansionRule, RetrieveConfig};
