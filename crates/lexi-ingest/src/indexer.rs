//! Full index rebuild.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use lexi_core::{ChunkStore, Embedder, LexiConfig, LexiError, Result};
use lexi_store::SqliteStore;

use crate::pipeline::{FileFailure, Pipeline, PipelineOutput};

/// Summary of a completed rebuild.
#[derive(Debug, Clone)]
pub struct RebuildReport {
    pub documents: usize,
    pub chunks: usize,
    pub failures: Vec<FileFailure>,
    pub store_path: PathBuf,
}

/// Rebuilds the chunk index from a source directory.
///
/// Owns the embedding model for its whole lifetime; every rebuild reuses it.
pub struct Indexer {
    /// Document pipeline.
    pipeline: Pipeline,

    /// Embedding model.
    embedder: Arc<dyn Embedder>,

    /// Store location, replaced on every rebuild.
    store_path: PathBuf,

    /// Texts per embedding call.
    batch_size: usize,
}

impl Indexer {
    /// Create an indexer writing to the configured store path.
    pub fn new(config: &LexiConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        config.validate()?;
        info!(
            "Initializing indexer with store at {:?}",
            config.store.path
        );

        Ok(Self {
            pipeline: Pipeline::new(config)?,
            embedder,
            store_path: config.store.path.clone(),
            batch_size: config.embedding.batch_size,
        })
    }

    /// Write to `path` instead of the configured store.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Run the pipeline without touching the store.
    pub fn preview(&self, input_dir: &Path) -> Result<PipelineOutput> {
        self.pipeline.run(input_dir)
    }

    /// Replace the store with a fresh index of `input_dir`.
    ///
    /// The new index is embedded and written to a staging file next to the
    /// store, then renamed over it. Any failure before the rename leaves the
    /// previous index in place.
    pub async fn rebuild(&self, input_dir: &Path) -> Result<RebuildReport> {
        info!("Rebuilding index from {:?}", input_dir);
        let output = self.pipeline.run(input_dir)?;

        let mut embeddings = Vec::with_capacity(output.chunks.len());
        for batch in output.chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let vectors = self.embedder.embed_documents(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(LexiError::embedding(format!(
                    "Embedder returned {} vectors for {} texts",
                    vectors.len(),
                    texts.len()
                )));
            }
            embeddings.extend(vectors);
            debug!("Embedded {}/{} chunks", embeddings.len(), output.chunks.len());
        }

        let staging = self.staging_path();
        if let Err(e) = self.write_staged(&staging, &output, &embeddings).await {
            warn!("Discarding staged index {:?}: {}", staging, e);
            if let Err(cleanup) = SqliteStore::discard(&staging) {
                warn!("Failed to remove {:?}: {}", staging, cleanup);
            }
            return Err(e);
        }
        SqliteStore::replace(&staging, &self.store_path)?;

        info!(
            "Indexed {} chunks from {} documents into {:?}",
            output.chunks.len(),
            output.documents(),
            self.store_path
        );

        Ok(RebuildReport {
            documents: output.documents(),
            chunks: output.chunks.len(),
            failures: output.failures,
            store_path: self.store_path.clone(),
        })
    }

    /// Sibling of the store path that a rebuild writes into.
    fn staging_path(&self) -> PathBuf {
        let mut staging = self.store_path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }

    async fn write_staged(
        &self,
        staging: &Path,
        output: &PipelineOutput,
        embeddings: &[Vec<f32>],
    ) -> Result<()> {
        let store = SqliteStore::create(staging)?;
        store.upsert(&output.chunks, embeddings).await?;
        store.persist().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lexi_embed::HashingEmbedder;

    const REGULATION: &str = "CHƯƠNG I\nĐiều 1. Học phí\nThu theo tín chỉ.\nĐiều 2. Miễn giảm\nTheo quy định.\n";
    const HANDBOOK: &str = "# Liên hệ\nPhòng đào tạo.\n";

    fn source_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hocphi.txt"), REGULATION).unwrap();
        std::fs::write(dir.path().join("lien_he.md"), HANDBOOK).unwrap();
        dir
    }

    fn indexer(store_path: &Path) -> Indexer {
        let mut config = LexiConfig::default();
        config.embedding.batch_size = 2;
        Indexer::new(&config, Arc::new(HashingEmbedder::with_dimension(64).unwrap()))
            .unwrap()
            .with_store_path(store_path)
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed_documents(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }

        fn dimension(&self) -> usize {
            1
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed_documents(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Err(LexiError::embedding("model unavailable"))
        }

        fn dimension(&self) -> usize {
            64
        }
    }

    #[tokio::test]
    async fn test_rebuild() {
        let source = source_dir();
        let out = tempfile::tempdir().unwrap();
        let store_path = out.path().join("chunks.db");

        let report = indexer(&store_path).rebuild(source.path()).await.unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(report.chunks, 3);
        assert!(report.failures.is_empty());

        let store = SqliteStore::open(&store_path).unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(store.embedding(0).unwrap().map(|e| e.len()), Some(64));
        let hocphi = source.path().join("hocphi.txt");
        assert_eq!(
            store.sections(&hocphi.to_string_lossy()).await.unwrap(),
            vec!["CHƯƠNG I > Điều 1. Học phí", "CHƯƠNG I > Điều 2. Miễn giảm"]
        );
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_index() {
        let source = source_dir();
        let out = tempfile::tempdir().unwrap();
        let store_path = out.path().join("chunks.db");
        let indexer = indexer(&store_path);

        indexer.rebuild(source.path()).await.unwrap();
        indexer.rebuild(source.path()).await.unwrap();

        let store = SqliteStore::open(&store_path).unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_missing_source_leaves_store_untouched() {
        let source = source_dir();
        let out = tempfile::tempdir().unwrap();
        let store_path = out.path().join("chunks.db");
        let indexer = indexer(&store_path);
        indexer.rebuild(source.path()).await.unwrap();

        let err = indexer
            .rebuild(&source.path().join("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "SOURCE_NOT_FOUND");

        let store = SqliteStore::open(&store_path).unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_preview_does_not_create_store() {
        let source = source_dir();
        let out = tempfile::tempdir().unwrap();
        let store_path = out.path().join("chunks.db");

        let output = indexer(&store_path).preview(source.path()).unwrap();

        assert_eq!(output.chunks.len(), 3);
        assert!(!store_path.exists());
    }

    #[tokio::test]
    async fn test_embedder_count_mismatch() {
        let source = source_dir();
        let out = tempfile::tempdir().unwrap();
        let indexer = Indexer::new(&LexiConfig::default(), Arc::new(ShortEmbedder))
            .unwrap()
            .with_store_path(out.path().join("chunks.db"));

        let err = indexer.rebuild(source.path()).await.unwrap_err();
        assert_eq!(err.error_code(), "EMBEDDING_ERROR");
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_index() {
        let source = source_dir();
        let out = tempfile::tempdir().unwrap();
        let store_path = out.path().join("chunks.db");
        indexer(&store_path).rebuild(source.path()).await.unwrap();

        let failing = Indexer::new(&LexiConfig::default(), Arc::new(FailingEmbedder))
            .unwrap()
            .with_store_path(&store_path);
        let err = failing.rebuild(source.path()).await.unwrap_err();
        assert_eq!(err.error_code(), "EMBEDDING_ERROR");

        let store = SqliteStore::open(&store_path).unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
        assert!(!out.path().join("chunks.db.tmp").exists());
    }

    #[tokio::test]
    async fn test_rebuild_leaves_no_staging_file() {
        let source = source_dir();
        let out = tempfile::tempdir().unwrap();
        let store_path = out.path().join("chunks.db");

        let indexer = indexer(&store_path);
        indexer.rebuild(source.path()).await.unwrap();

        assert!(store_path.exists());
        assert!(!indexer.staging_path().exists());
        assert_eq!(indexer.staging_path(), out.path().join("chunks.db.tmp"));
    }
}
