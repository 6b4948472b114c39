use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use async_trait::async_trait;
use catalog::load_catalog;
use code_index::{AnnConfig, CodeIndex, IndexError};
use embed::EmbedClient;
use refine::{GenerateClient, GenerateError, HttpGenerateClient, Refiner};
use retrieve::Retriever;
use std::sync::Arc;

/// Shared application state
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Catalog vector index (shared with the retriever)
    pub index: Arc<CodeIndex>,

    /// Retrieval layer
    pub retriever: Retriever,

    /// Generative re-ranker
    pub refiner: Refiner,

    /// Whether a model API key is configured. When false, the refiner runs
    /// against an offline channel and every request takes the deterministic
    /// fallback path.
    pub model_ready: bool,
}

impl ServerState {
    /// Create new server state: embedding client, index (loaded from disk or
    /// built from the catalog CSVs), retriever, and refiner.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let embedder = Arc::new(EmbedClient::new(config.embed.clone())?);
        let ann = config.ann.to_ann_config();
        let index = Arc::new(load_or_build_index(&config, &embedder, ann).await?);

        let retriever = Retriever::new(index.clone(), embedder, config.retrieve.clone())?;

        let model_ready = config.generate.api_key.is_some();
        let client: Arc<dyn GenerateClient> = if model_ready {
            Arc::new(HttpGenerateClient::new(config.generate.clone())?)
        } else {
            tracing::warn!("no model api_key configured, suggestions will use fallback paths");
            Arc::new(OfflineGenerateClient)
        };
        let refiner = Refiner::new(client, config.refine.clone());

        Ok(Self {
            config: Arc::new(config),
            index,
            retriever,
            refiner,
            model_ready,
        })
    }

    /// Assemble state from pre-built components. Used by tests to inject a
    /// scripted model channel and an in-memory index.
    pub fn with_components(
        config: ServerConfig,
        index: Arc<CodeIndex>,
        retriever: Retriever,
        refiner: Refiner,
        model_ready: bool,
    ) -> Self {
        Self {
            config: Arc::new(config),
            index,
            retriever,
            refiner,
            model_ready,
        }
    }
}

/// Load index artifacts from `index.dir`, or build them from the configured
/// catalog CSVs when none exist yet.
async fn load_or_build_index(
    config: &ServerConfig,
    embedder: &EmbedClient,
    ann: AnnConfig,
) -> ServerResult<CodeIndex> {
    if let Some(dir) = &config.index.dir {
        match CodeIndex::load(dir, ann) {
            Ok(index) => {
                tracing::info!(codes = index.len(), dir = %dir.display(), "loaded index artifacts");
                return Ok(index);
            }
            Err(IndexError::NotFound(_)) => {
                tracing::info!(dir = %dir.display(), "no index artifacts, building from catalog");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let (diagnosis_csv, procedure_csv) =
        match (&config.index.diagnosis_csv, &config.index.procedure_csv) {
            (Some(dx), Some(px)) => (dx.as_path(), px.as_path()),
            _ => {
                return Err(ServerError::Config(
                    "no index artifacts found and catalog CSV paths are not configured".to_string(),
                ))
            }
        };

    let entries = load_catalog(diagnosis_csv, procedure_csv)?;
    let index = CodeIndex::build(entries, embedder, ann).await?;
    if let Some(dir) = &config.index.dir {
        index.save(dir)?;
        tracing::info!(codes = index.len(), dir = %dir.display(), "saved index artifacts");
    }
    Ok(index)
}

/// Model channel used when no API key is configured. Every call fails, which
/// drives the refiner's documented fallbacks.
struct OfflineGenerateClient;

#[async_trait]
impl GenerateClient for OfflineGenerateClient {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        Err(GenerateError::InvalidConfig(
            "model api_key not configured".to_string(),
        ))
    }
}
