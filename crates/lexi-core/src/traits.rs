//! Core traits defining the interfaces between components.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, DocumentClass, Metadata, SourceStats};

/// Document segmentation strategy.
pub trait Segmenter: Send + Sync {
    /// Segment a document's text into chunks.
    ///
    /// `metadata` is copied into every chunk; `section` is overwritten.
    fn segment(&self, text: &str, metadata: &Metadata) -> Vec<Chunk>;

    /// Document class this segmenter handles.
    fn document_class(&self) -> DocumentClass;
}

/// Embedding model boundary.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of chunk contents.
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Persisted chunk index boundary.
///
/// A rebuild creates a fresh store, calls `upsert` once with the complete
/// chunk set and then `persist`.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Insert chunks with their embeddings, in order.
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()>;

    /// Flush pending writes to durable storage.
    async fn persist(&self) -> Result<()>;

    /// Total number of stored chunks.
    async fn count(&self) -> Result<u64>;

    /// Chunk counts per source file.
    async fn source_stats(&self) -> Result<Vec<SourceStats>>;

    /// Sections stored for one source, in insertion order.
    async fn sections(&self, source: &str) -> Result<Vec<String>>;
}
