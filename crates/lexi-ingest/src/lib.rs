//! lexi-ingest - Document pipeline and index rebuild
//!
//! [`Pipeline`] walks a source directory and turns every document into
//! chunks; [`Indexer`] embeds those chunks and writes them to a fresh store.

mod indexer;
mod pipeline;

pub use indexer::{Indexer, RebuildReport};
pub use pipeline::{FileFailure, Pipeline, PipelineOutput};
