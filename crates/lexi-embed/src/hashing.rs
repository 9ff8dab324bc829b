//! Feature-hashing embedder.

use async_trait::async_trait;
use tracing::debug;

use lexi_core::{Embedder, LexiError, Result};

/// Deterministic bag-of-words embedder.
///
/// Each lowercased word is hashed with blake3 into one of `dimension`
/// buckets with a hash-derived sign; the resulting vector is L2 normalized.
/// Texts sharing words therefore land close together, which is enough to
/// exercise an index without a neural model.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a new hashing embedder with the default dimension.
    pub fn new() -> Self {
        Self { dimension: 768 }
    }

    /// Create an embedder producing `dimension`-sized vectors.
    pub fn with_dimension(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(LexiError::invalid_argument(
                "embedding dimension must be at least 1",
            ));
        }
        Ok(Self { dimension })
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for token in tokens(text) {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&bytes[..8]);
            let idx = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[idx] += sign;
        }

        l2_normalize(embedding)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        debug!("Embedding batch of {} texts", texts.len());
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Lowercased alphanumeric runs.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}
