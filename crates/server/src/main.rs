//! ClaimSense Server - HTTP REST API for clinical code suggestion
//!
//! This binary serves the suggestion pipeline over REST: catalog retrieval,
//! generative re-ranking, and diagnosis/procedure mix enforcement.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present, then configuration
    dotenvy::dotenv().ok();
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
