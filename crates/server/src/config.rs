use code_index::AnnConfig;
use embed::EmbedConfig;
use refine::{GenerateConfig, RefineConfig};
use retrieve::RetrieveConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Index artifact and catalog locations
    #[serde(default)]
    pub index: IndexSettings,

    /// HNSW tuning
    #[serde(default)]
    pub ann: AnnSettings,

    /// Embedding backend
    #[serde(default)]
    pub embed: EmbedConfig,

    /// Retrieval layer (query planning, aggregation, boosts)
    #[serde(default)]
    pub retrieve: RetrieveConfig,

    /// Refiner prompt budgets
    #[serde(default)]
    pub refine: RefineConfig,

    /// Generative model channel
    #[serde(default)]
    pub generate: GenerateConfig,
}

/// Where to find (or persist) the vector index and the catalog CSVs it is
/// built from.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IndexSettings {
    /// Directory holding `vectors.bin` / `meta.json` / `manifest.json`. When
    /// set and empty, a freshly built index is saved there.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// ICD-10 catalog CSV, used to build the index when no artifacts exist.
    #[serde(default)]
    pub diagnosis_csv: Option<PathBuf>,

    /// CPT catalog CSV, used to build the index when no artifacts exist.
    #[serde(default)]
    pub procedure_csv: Option<PathBuf>,
}

/// Serde-friendly mirror of [`AnnConfig`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnnSettings {
    #[serde(default = "default_ann_m")]
    pub m: usize,
    #[serde(default = "default_ann_ef_construction")]
    pub ef_construction: usize,
    #[serde(default = "default_ann_ef_search")]
    pub ef_search: usize,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ann_min_vectors")]
    pub min_vectors_for_ann: usize,
}

impl Default for AnnSettings {
    fn default() -> Self {
        Self {
            m: default_ann_m(),
            ef_construction: default_ann_ef_construction(),
            ef_search: default_ann_ef_search(),
            enabled: true,
            min_vectors_for_ann: default_ann_min_vectors(),
        }
    }
}

impl AnnSettings {
    pub fn to_ann_config(&self) -> AnnConfig {
        AnnConfig::default()
            .with_m(self.m)
            .with_ef_construction(self.ef_construction)
            .with_ef_search(self.ef_search)
            .with_enabled(self.enabled)
            .with_min_vectors_for_ann(self.min_vectors_for_ann)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            index: IndexSettings::default(),
            ann: AnnSettings::default(),
            embed: EmbedConfig::default(),
            retrieve: RetrieveConfig::default(),
            refine: RefineConfig::default(),
            generate: GenerateConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("claimsense").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("CLAIMSENSE").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_body_size_mb() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ann_m() -> usize {
    16
}

fn default_ann_ef_construction() -> usize {
    200
}

fn default_ann_ef_search() -> usize {
    50
}

fn default_ann_min_vectors() -> usize {
    1000
}
