//! lexi-embed - Embedding collaborators
//!
//! This crate provides embedders for the chunk index. The hashing embedder
//! is deterministic and dependency-free, suitable for offline rebuilds and
//! tests.

mod hashing;

pub use hashing::HashingEmbedder;

// Re-export the Embedder trait for convenience
pub use lexi_core::Embedder;
