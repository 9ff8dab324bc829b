//! lexi-core - Core types and traits for the LexiBot chunking pipeline
//!
//! This crate provides the foundational types, traits, and error handling
//! shared by the segmenters, the embedding and storage collaborators, and
//! the ingest pipeline.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{LexiError, Result};
pub use traits::*;
pub use types::*;
