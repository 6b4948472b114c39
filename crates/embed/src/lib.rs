//! # ClaimSense Embed (`embed`)
//!
//! Text embedding for clinical notes and catalog descriptions. Two backends
//! behind one client:
//!
//! - `"api"`: a remote inference endpoint (HuggingFace, OpenAI, or any custom
//!   service exposing a compatible JSON shape).
//! - `"stub"`: a deterministic hash-based generator for offline development
//!   and tests. Stub vectors are reproducible but carry no semantics.
//!
//! All vectors come back with a fixed dimension and, by default, unit length,
//! so the index can use inner-product similarity as cosine.

mod api;
mod client;
mod config;
mod error;
mod normalize;
mod stub;

pub use crate::client::EmbedClient;
pub use crate::config::EmbedConfig;
pub use crate::error::EmbedError;
pub use crate::normalize::l2_normalize_in_place;
