//! API route handlers
//!
//! This module contains all HTTP endpoint implementations for the ClaimSense
//! server. Routes are organized by functionality:
//!
//! - `health`: Health checks and readiness
//! - `suggest`: Code suggestion (hybrid and direct modes)

pub mod health;
pub mod suggest;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /).
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "ClaimSense Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/suggest",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
