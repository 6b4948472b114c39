//! ClaimSense Server - HTTP REST API for clinical code suggestion
//!
//! This crate provides an HTTP server that exposes the ClaimSense suggestion
//! pipeline via a REST API. It supports:
//!
//! - **Code Suggestion**: Hybrid (retrieve + re-rank) and direct generation modes
//! - **Health & Readiness**: Liveness and readiness probes with component status
//!
//! # Features
//!
//! - **Middleware**: Compression, CORS, request ID tracking, structured logging
//! - **Configuration**: Environment variable and file-based configuration
//! - **Error Handling**: Error responses with stable error codes
//! - **Graceful Shutdown**: Signal handling for production deployments
//! - **Graceful Degradation**: A dead model channel degrades to deterministic
//!   fallbacks instead of failing requests
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `POST /api/v1/suggest` - Suggest billing codes for a clinical note

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
