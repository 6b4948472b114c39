use std::sync::Arc;

use code_index::{Candidate, CodeIndex};
use embed::EmbedClient;
use tracing::{debug, warn};

use crate::aggregate::aggregate;
use crate::error::RetrieveError;
use crate::plan::build_query_plan;
use crate::types::{Entity, RetrieveConfig};

/// Multi-query retriever: builds a query plan from the note and its
/// entities, fans out to the index, and aggregates the hits into one
/// deduplicated, boosted, ranked candidate pool.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<CodeIndex>,
    embedder: Arc<EmbedClient>,
    cfg: RetrieveConfig,
}

impl Retriever {
    pub fn new(
        index: Arc<CodeIndex>,
        embedder: Arc<EmbedClient>,
        cfg: RetrieveConfig,
    ) -> Result<Self, RetrieveError> {
        cfg.validate()?;
        Ok(Self {
            index,
            embedder,
            cfg,
        })
    }

    /// Retrieve the candidate pool for one request.
    ///
    /// Embedding or search failures degrade this request to an empty pool;
    /// they are logged and never abort the request.
    pub async fn retrieve(&self, text: &str, entities: &[Entity], top_k: usize) -> Vec<Candidate> {
        match self.try_retrieve(text, entities, top_k).await {
            Ok(pool) => pool,
            Err(err) => {
                warn!(error = %err, "retrieval failed, degrading to empty candidate pool");
                Vec::new()
            }
        }
    }

    async fn try_retrieve(
        &self,
        text: &str,
        entities: &[Entity],
        top_k: usize,
    ) -> Result<Vec<Candidate>, RetrieveError> {
        let queries = build_query_plan(text, entities, &self.cfg);
        let fetch = top_k.max(self.cfg.overfetch_floor);

        let vectors = self.embedder.embed_batch(&queries).await?;
        let hit_lists = self.index.search(&vectors, fetch)?;

        debug!(
            queries = queries.len(),
            fetch,
            hits = hit_lists.iter().map(Vec::len).sum::<usize>(),
            "retrieval fan-out complete"
        );
        Ok(aggregate(hit_lists, text, &self.cfg))
    }
}
