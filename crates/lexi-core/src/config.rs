//! Configuration types for the chunking pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LexiError, Result};
use crate::types::{
    SplitConfig, ARTICLE_SPLIT_SIZE, CLAUSE_OVERLAP, HANDBOOK_OVERLAP, MAX_CHUNK_SIZE,
};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiConfig {
    /// Source document configuration.
    #[serde(default)]
    pub source: SourceConfig,

    /// Chunking configuration.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Document classification.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Embedding configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunk store configuration.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Source document configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory scanned recursively for documents.
    #[serde(default = "default_source_dir")]
    pub dir: PathBuf,

    /// File extensions to load (without the dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Abort the run on the first unreadable file.
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: default_source_dir(),
            extensions: default_extensions(),
            fail_fast: false,
        }
    }
}

/// What to do with a regulatory document that has neither chapters nor articles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnstructuredPolicy {
    /// Emit nothing for the document.
    #[default]
    Skip,
    /// Split the whole document under the default label.
    WholeDocument,
}

/// Chunking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk body size in characters.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Sub-split size for oversized articles.
    #[serde(default = "default_article_split_size")]
    pub article_split_size: usize,

    /// Overlap between article sub-split pieces.
    #[serde(default = "default_clause_overlap")]
    pub clause_overlap: usize,

    /// Overlap between handbook split pieces.
    #[serde(default = "default_handbook_overlap")]
    pub handbook_overlap: usize,

    /// Clear deeper handbook labels when a higher-level heading appears.
    #[serde(default)]
    pub reset_nested_headings: bool,

    /// Handling of regulatory documents without any structure.
    #[serde(default)]
    pub unstructured: UnstructuredPolicy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: MAX_CHUNK_SIZE,
            article_split_size: ARTICLE_SPLIT_SIZE,
            clause_overlap: CLAUSE_OVERLAP,
            handbook_overlap: HANDBOOK_OVERLAP,
            reset_nested_headings: false,
            unstructured: UnstructuredPolicy::Skip,
        }
    }
}

impl ChunkingConfig {
    /// Split configuration for oversized regulatory articles.
    pub fn article_split(&self) -> Result<SplitConfig> {
        SplitConfig::new(self.article_split_size, self.clause_overlap)
    }

    /// Split configuration for oversized handbook blocks.
    pub fn handbook_split(&self) -> Result<SplitConfig> {
        SplitConfig::new(self.max_chunk_size, self.handbook_overlap)
    }
}

/// Document classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// ASCII-folded filename stems marking regulatory documents.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding dimension.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Batch size for embedding.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: 768,
            batch_size: 32,
        }
    }
}

/// Chunk store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

// Default value functions

fn default_source_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_extensions() -> Vec<String> {
    vec!["txt".to_string(), "md".to_string()]
}

fn default_max_chunk_size() -> usize {
    MAX_CHUNK_SIZE
}

fn default_article_split_size() -> usize {
    ARTICLE_SPLIT_SIZE
}

fn default_clause_overlap() -> usize {
    CLAUSE_OVERLAP
}

fn default_handbook_overlap() -> usize {
    HANDBOOK_OVERLAP
}

fn default_keywords() -> Vec<String> {
    ["quyche", "quydinh", "quyetdinh", "luat", "daotao", "hocphi"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn default_dimension() -> usize {
    768
}

fn default_batch_size() -> usize {
    32
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexibot")
        .join("chunks.db")
}

impl LexiConfig {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LexiError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("lexibot").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        let local_config = PathBuf::from("lexibot.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }

    /// Reject settings that would make splitting or embedding impossible.
    pub fn validate(&self) -> Result<()> {
        self.chunking
            .article_split()
            .and_then(|_| self.chunking.handbook_split())
            .map_err(|e| LexiError::config(e.to_string()))?;
        if self.embedding.batch_size == 0 {
            return Err(LexiError::config("embedding.batch_size must be at least 1"));
        }
        if self.embedding.dimension == 0 {
            return Err(LexiError::config("embedding.dimension must be at least 1"));
        }
        Ok(())
    }
}
