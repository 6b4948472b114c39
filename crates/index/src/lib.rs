//! # ClaimSense Index (`code_index`)
//!
//! Immutable vector index over the billing-code catalog. Built once from the
//! catalog CSVs plus an [`EmbedClient`], persisted as a small artifact
//! directory, and loaded read-only at service startup.
//!
//! Search is inner-product similarity over unit-length vectors: exact linear
//! scan for small catalogs, HNSW above a configurable size. Scores come back
//! as similarities in descending order, so callers never see raw distances.
//!
//! ## Artifact layout
//!
//! ```text
//! <dir>/vectors.bin    bincode-encoded Vec<Vec<f32>>
//! <dir>/meta.json      catalog entries, position-aligned with vectors
//! <dir>/manifest.json  schema version, count, dim, model name
//! ```

mod ann;
mod error;

pub use crate::ann::AnnConfig;
pub use crate::error::IndexError;

use std::fs;
use std::path::Path;

use catalog::{CodeEntry, CodeSystem};
use embed::EmbedClient;
use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SCHEMA_VERSION: u32 = 1;
const VECTORS_FILE: &str = "vectors.bin";
const META_FILE: &str = "meta.json";
const MANIFEST_FILE: &str = "manifest.json";

/// How many catalog texts go into one embedding request during a build.
const EMBED_BATCH: usize = 256;

/// HNSW needs a handful of points before the graph is meaningful.
const MIN_VECTORS_FOR_GRAPH: usize = 10;

/// One search hit: a catalog entry plus its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub code: String,
    pub system: CodeSystem,
    pub description: String,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexManifest {
    schema_version: u32,
    count: usize,
    dim: usize,
    model_name: String,
}

/// The searchable index: vectors, their catalog entries, and an optional
/// HNSW graph over them.
pub struct CodeIndex {
    dim: usize,
    model_name: String,
    entries: Vec<CodeEntry>,
    vectors: Vec<Vec<f32>>,
    hnsw: Option<Hnsw<'static, f32, DistDot>>,
    cfg: AnnConfig,
}

impl std::fmt::Debug for CodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeIndex")
            .field("dim", &self.dim)
            .field("model_name", &self.model_name)
            .field("entries", &self.entries)
            .field("vectors", &self.vectors)
            .field("hnsw", &self.hnsw.as_ref().map(|_| "Hnsw"))
            .field("cfg", &self.cfg)
            .finish()
    }
}

impl CodeIndex {
    /// Embed every catalog entry and assemble a fresh index.
    pub async fn build(
        entries: Vec<CodeEntry>,
        embedder: &EmbedClient,
        cfg: AnnConfig,
    ) -> Result<Self, IndexError> {
        let mut vectors = Vec::with_capacity(entries.len());
        for chunk in entries.chunks(EMBED_BATCH) {
            let texts: Vec<String> = chunk.iter().map(CodeEntry::embedding_text).collect();
            vectors.extend(embedder.embed_batch(&texts).await?);
        }

        info!(
            count = entries.len(),
            dim = embedder.dim(),
            "built code index from catalog"
        );
        Self::from_parts(
            entries,
            vectors,
            embedder.dim(),
            embedder.config().model_name.clone(),
            cfg,
        )
    }

    /// Assemble an index from already-embedded parts, validating alignment.
    pub fn from_parts(
        entries: Vec<CodeEntry>,
        vectors: Vec<Vec<f32>>,
        dim: usize,
        model_name: String,
        cfg: AnnConfig,
    ) -> Result<Self, IndexError> {
        if entries.len() != vectors.len() {
            return Err(IndexError::Corrupt(format!(
                "{} entries but {} vectors",
                entries.len(),
                vectors.len()
            )));
        }
        for vector in &vectors {
            if vector.len() != dim {
                return Err(IndexError::DimensionMismatch {
                    expected: dim,
                    got: vector.len(),
                });
            }
        }

        let mut index = Self {
            dim,
            model_name,
            entries,
            vectors,
            hnsw: None,
            cfg,
        };
        index.build_graph();
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn entries(&self) -> &[CodeEntry] {
        &self.entries
    }

    /// Search one query vector per input, returning up to `k` candidates each,
    /// sorted by descending similarity.
    pub fn search(
        &self,
        queries: &[Vec<f32>],
        k: usize,
    ) -> Result<Vec<Vec<Candidate>>, IndexError> {
        queries
            .iter()
            .map(|query| self.search_one(query, k))
            .collect()
    }

    fn search_one(&self, query: &[f32], k: usize) -> Result<Vec<Candidate>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                got: query.len(),
            });
        }
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let hits = match &self.hnsw {
            Some(hnsw) if self.cfg.should_use_ann(self.vectors.len()) => {
                let neighbours = hnsw.search(query, k, self.cfg.ef_search);
                neighbours
                    .into_iter()
                    // DistDot distance is 1 - <q, v>; undo it to report similarity.
                    .map(|n| (n.get_origin_id(), 1.0 - n.distance))
                    .collect()
            }
            _ => self.linear_search(query, k),
        };

        let mut candidates: Vec<Candidate> = hits
            .into_iter()
            .filter_map(|(idx, score)| {
                self.entries.get(idx).map(|entry| Candidate {
                    code: entry.code.clone(),
                    system: entry.system,
                    description: entry.description.clone(),
                    score,
                })
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(k);
        Ok(candidates)
    }

    /// Exact scan: inner product against every stored vector.
    fn linear_search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, v)| {
                let dot: f32 = query.iter().zip(v.iter()).map(|(a, b)| a * b).sum();
                (idx, dot)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    fn build_graph(&mut self) {
        let nb_elem = self.vectors.len();
        if !self.cfg.should_use_ann(nb_elem) || nb_elem < MIN_VECTORS_FOR_GRAPH {
            return;
        }

        let nb_layer = 16.min((nb_elem as f32).ln().trunc() as usize);
        let hnsw = Hnsw::<f32, DistDot>::new(
            self.cfg.m,
            nb_elem,
            nb_layer,
            self.cfg.ef_construction,
            DistDot {},
        );
        let data_for_insertion: Vec<(&Vec<f32>, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, vec)| (vec, idx))
            .collect();
        hnsw.parallel_insert(&data_for_insertion);

        debug!(count = nb_elem, layers = nb_layer, "built HNSW graph");
        self.hnsw = Some(hnsw);
    }

    /// Write the artifact directory, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<(), IndexError> {
        fs::create_dir_all(dir)?;

        let vectors = bincode::serde::encode_to_vec(&self.vectors, bincode::config::standard())
            .map_err(|e| IndexError::Codec(e.to_string()))?;
        fs::write(dir.join(VECTORS_FILE), vectors)?;

        let meta = serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| IndexError::Codec(e.to_string()))?;
        fs::write(dir.join(META_FILE), meta)?;

        let manifest = IndexManifest {
            schema_version: SCHEMA_VERSION,
            count: self.entries.len(),
            dim: self.dim,
            model_name: self.model_name.clone(),
        };
        let manifest =
            serde_json::to_vec_pretty(&manifest).map_err(|e| IndexError::Codec(e.to_string()))?;
        fs::write(dir.join(MANIFEST_FILE), manifest)?;

        info!(dir = %dir.display(), count = self.entries.len(), "saved index artifacts");
        Ok(())
    }

    /// Load an artifact directory written by [`save`](Self::save).
    pub fn load(dir: &Path, cfg: AnnConfig) -> Result<Self, IndexError> {
        let vectors_path = dir.join(VECTORS_FILE);
        let meta_path = dir.join(META_FILE);
        let manifest_path = dir.join(MANIFEST_FILE);
        if !vectors_path.exists() || !meta_path.exists() || !manifest_path.exists() {
            return Err(IndexError::NotFound(dir.to_path_buf()));
        }

        let manifest: IndexManifest = serde_json::from_slice(&fs::read(&manifest_path)?)
            .map_err(|e| IndexError::Corrupt(format!("manifest unreadable: {e}")))?;
        if manifest.schema_version != SCHEMA_VERSION {
            return Err(IndexError::Corrupt(format!(
                "unsupported schema version {}",
                manifest.schema_version
            )));
        }

        let (vectors, _): (Vec<Vec<f32>>, usize) =
            bincode::serde::decode_from_slice(&fs::read(&vectors_path)?, bincode::config::standard())
                .map_err(|e| IndexError::Corrupt(format!("vectors unreadable: {e}")))?;
        let entries: Vec<CodeEntry> = serde_json::from_slice(&fs::read(&meta_path)?)
            .map_err(|e| IndexError::Corrupt(format!("meta unreadable: {e}")))?;

        if vectors.len() != manifest.count || entries.len() != manifest.count {
            return Err(IndexError::Corrupt(format!(
                "manifest promises {} entries, found {} vectors and {} meta rows",
                manifest.count,
                vectors.len(),
                entries.len()
            )));
        }

        info!(dir = %dir.display(), count = manifest.count, "loaded index artifacts");
        Self::from_parts(entries, vectors, manifest.dim, manifest.model_name, cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embed::EmbedConfig;
    use tempfile::tempdir;

    fn stub_embedder() -> EmbedClient {
        EmbedClient::new(EmbedConfig::default()).unwrap()
    }

    fn sample_entries() -> Vec<CodeEntry> {
        vec![
            CodeEntry::new("M25.561", CodeSystem::Diagnosis, "Pain in right knee"),
            CodeEntry::new(
                "S83.511A",
                CodeSystem::Diagnosis,
                "Sprain of anterior cruciate ligament of right knee",
            ),
            CodeEntry::new("E11.9", CodeSystem::Diagnosis, "Type 2 diabetes mellitus"),
            CodeEntry::new(
                "29881",
                CodeSystem::Procedure,
                "Knee arthroscopy with meniscectomy",
            ),
            CodeEntry::new("73721", CodeSystem::Procedure, "MRI lower extremity joint"),
        ]
    }

    async fn build_index() -> (CodeIndex, EmbedClient) {
        let embedder = stub_embedder();
        let index = CodeIndex::build(sample_entries(), &embedder, AnnConfig::default())
            .await
            .unwrap();
        (index, embedder)
    }

    #[tokio::test]
    async fn build_aligns_entries_and_vectors() {
        let (index, _) = build_index().await;
        assert_eq!(index.len(), 5);
        assert_eq!(index.dim(), 384);
    }

    #[tokio::test]
    async fn exact_text_match_ranks_first() {
        let (index, embedder) = build_index().await;
        // Stub embeddings are hash-based, so an identical text is the only
        // guaranteed nearest neighbor.
        let query_text = CodeEntry::new("E11.9", CodeSystem::Diagnosis, "Type 2 diabetes mellitus")
            .embedding_text();
        let queries = embedder.embed_batch(&[query_text]).await.unwrap();

        let results = index.search(&queries, 3).unwrap();
        assert_eq!(results.len(), 1);
        let hits = &results[0];
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].code, "E11.9");
        assert!((hits[0].score - 1.0).abs() < 1e-4);
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[1].score >= hits[2].score);
    }

    #[tokio::test]
    async fn search_rejects_wrong_dimension() {
        let (index, _) = build_index().await;
        let err = index.search(&[vec![0.5f32; 8]], 3).unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn k_larger_than_catalog_returns_all() {
        let (index, embedder) = build_index().await;
        let queries = embedder
            .embed_batch(&["knee pain".to_string()])
            .await
            .unwrap();
        let results = index.search(&queries, 50).unwrap();
        assert_eq!(results[0].len(), 5);
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let (index, embedder) = build_index().await;
        let dir = tempdir().unwrap();
        index.save(dir.path()).unwrap();

        let loaded = CodeIndex::load(dir.path(), AnnConfig::default()).unwrap();
        assert_eq!(loaded.len(), index.len());
        assert_eq!(loaded.dim(), index.dim());
        assert_eq!(loaded.entries(), index.entries());

        let query_text = CodeEntry::new("M25.561", CodeSystem::Diagnosis, "Pain in right knee")
            .embedding_text();
        let queries = embedder.embed_batch(&[query_text]).await.unwrap();
        let hits = &loaded.search(&queries, 1).unwrap()[0];
        assert_eq!(hits[0].code, "M25.561");
    }

    #[test]
    fn load_missing_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let err = CodeIndex::load(&dir.path().join("absent"), AnnConfig::default()).unwrap_err();
        assert!(matches!(err, IndexError::NotFound(_)));
    }

    #[tokio::test]
    async fn load_detects_corrupt_vectors() {
        let (index, _) = build_index().await;
        let dir = tempdir().unwrap();
        index.save(dir.path()).unwrap();
        std::fs::write(dir.path().join(VECTORS_FILE), b"not bincode").unwrap();

        let err = CodeIndex::load(dir.path(), AnnConfig::default()).unwrap_err();
        assert!(matches!(err, IndexError::Corrupt(_)));
    }

    #[tokio::test]
    async fn load_detects_count_mismatch() {
        let (index, _) = build_index().await;
        let dir = tempdir().unwrap();
        index.save(dir.path()).unwrap();
        // Drop one meta row so the manifest count no longer matches.
        let mut entries: Vec<CodeEntry> =
            serde_json::from_slice(&std::fs::read(dir.path().join(META_FILE)).unwrap()).unwrap();
        entries.pop();
        std::fs::write(
            dir.path().join(META_FILE),
            serde_json::to_vec(&entries).unwrap(),
        )
        .unwrap();

        let err = CodeIndex::load(dir.path(), AnnConfig::default()).unwrap_err();
        assert!(matches!(err, IndexError::Corrupt(_)));
    }

    #[test]
    fn from_parts_rejects_misalignment() {
        let err = CodeIndex::from_parts(
            sample_entries(),
            vec![vec![0.0f32; 384]; 2],
            384,
            "m".into(),
            AnnConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IndexError::Corrupt(_)));
    }

    #[tokio::test]
    async fn hnsw_path_agrees_with_linear_on_top_hit() {
        let embedder = stub_embedder();
        // Enough synthetic entries to cross the graph threshold.
        let mut entries = sample_entries();
        for i in 0..40 {
            entries.push(CodeEntry::new(
                format!("Z{i:02}.0"),
                CodeSystem::Diagnosis,
                format!("Synthetic filler condition number {i}"),
            ));
        }
        let ann = AnnConfig::default().with_min_vectors_for_ann(10);
        let index = CodeIndex::build(entries.clone(), &embedder, ann).await.unwrap();

        let query_text = entries[2].embedding_text();
        let queries = embedder.embed_batch(&[query_text]).await.unwrap();
        let hits = &index.search(&queries, 5).unwrap()[0];
        assert_eq!(hits[0].code, "E11.9");
        assert!((hits[0].score - 1.0).abs() < 1e-3);
    }
}
