//! # ClaimSense Catalog (`catalog`)
//!
//! The static universe of billable codes the retrieval pipeline searches
//! over: ICD-10 diagnosis codes and CPT procedure codes, each paired with a
//! human-readable description.
//!
//! The catalog is loaded once from CSV files at index-build time and is
//! never mutated afterwards. Loading is forgiving about column naming
//! (`Codes`/`code`, `Description`/`desc`, any case) because the upstream
//! code lists come from a mix of CMS exports and vendor spreadsheets.
//!
//! ## Core Types
//!
//! - [`CodeSystem`]: the two disjoint code families, diagnosis and procedure.
//! - [`CodeEntry`]: one `(code, system, description)` catalog record.
//! - [`load_codes_from_csv`] / [`load_catalog`]: CSV ingestion with header
//!   aliasing, whitespace cleanup, and first-wins dedup by code.

mod error;
mod loader;
mod types;

pub use crate::error::CatalogError;
pub use crate::loader::{load_catalog, load_codes_from_csv};
pub use crate::types::{CodeEntry, CodeSystem};
