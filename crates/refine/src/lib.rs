//! # ClaimSense Refine (`refine`)
//!
//! The ranking half of the suggestion pipeline. A [`Refiner`] sends the
//! clinical note (and, in hybrid mode, the retrieved candidate pool) to a
//! generative model behind the [`GenerateClient`] trait, parses whatever
//! comes back through an ordered chain of increasingly forgiving JSON
//! strategies, and normalizes the result into [`Suggestion`]s.
//!
//! The model channel is treated as unreliable by design: one strict retry,
//! then deterministic fallbacks (candidate passthrough in refine mode,
//! empty in direct mode). [`enforce_mix`] then balances diagnosis and
//! procedure coverage on the hybrid path.

mod client;
mod error;
mod mix;
mod parse;
mod prompt;
mod refiner;
mod types;

pub use crate::client::{GenerateClient, GenerateConfig, HttpGenerateClient};
pub use crate::error::{GenerateError, ParseError};
pub use crate::mix::{enforce_mix, BACKFILL_REASON};
pub use crate::refiner::{Refiner, FALLBACK_REASON};
pub use crate::types::{RefineConfig, Suggestion};
