//! lexi-chunk - Structural chunking
//!
//! This crate turns regulations and handbooks into size-bounded chunks whose
//! content starts with the structural path they came from.
//!
//! # Segmenters
//!
//! - [`RegulatorySegmenter`]: Chapter → Article splitting; long articles are
//!   sub-split and every piece keeps its article heading.
//!
//! - [`HandbookSegmenter`]: `#` / `##` / `###` heading splitting.
//!
//! - [`AdaptiveSegmenter`]: Picks one of the above from the file name.
//!
//! # Example
//!
//! ```rust
//! use lexi_chunk::RegulatorySegmenter;
//! use lexi_core::{ChunkingConfig, Metadata, Segmenter};
//!
//! let segmenter = RegulatorySegmenter::new(&ChunkingConfig::default()).unwrap();
//! let chunks = segmenter.segment("CHƯƠNG I\nĐiều 1. Phạm vi\nNội dung.", &Metadata::new());
//! assert_eq!(chunks[0].context_path, "CHƯƠNG I > Điều 1. Phạm vi");
//! ```

mod adaptive;
mod builder;
mod classify;
mod handbook;
mod recursive;
mod regulatory;
mod structure;

pub use adaptive::AdaptiveSegmenter;
pub use builder::{normalize_whitespace, ChunkBuilder};
pub use classify::{fold_ascii, DocumentClassifier};
pub use handbook::{HandbookSegmenter, HEADING_PATTERNS};
pub use recursive::{split_text, RecursiveSplitter};
pub use regulatory::{RegulatorySegmenter, ARTICLE_PATTERN, CHAPTER_PATTERN};
pub use structure::{BoundaryLevel, Section, StructureSplitter};

// Re-export types for convenience
pub use lexi_core::{Chunk, ChunkingConfig, ContextPath, DocumentClass, Metadata, Segmenter};
