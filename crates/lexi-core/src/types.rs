//! Core domain types for the chunking pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{LexiError, Result};

/// Default maximum chunk body size, in characters.
pub const MAX_CHUNK_SIZE: usize = 1500;

/// Sub-split size for oversized regulatory articles.
pub const ARTICLE_SPLIT_SIZE: usize = 1000;

/// Overlap between sub-split pieces of one article.
pub const CLAUSE_OVERLAP: usize = 150;

/// Overlap between split pieces of one handbook block.
pub const HANDBOOK_OVERLAP: usize = 200;

/// Context label used when a regulatory chunk has no discoverable structure.
pub const REGULATORY_DEFAULT_LABEL: &str = "Quy định chung";

/// Context label used when a handbook chunk precedes every heading.
pub const HANDBOOK_DEFAULT_LABEL: &str = "Thông tin chung";

/// Chunk metadata, ordered so serialized output is stable.
pub type Metadata = BTreeMap<String, String>;

/// Document class, determines the segmentation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentClass {
    /// Formal regulation: chapters, articles, clauses.
    Regulatory,
    /// Free-form handbook structured with Markdown headings.
    Handbook,
}

impl DocumentClass {
    /// Label substituted when no structural label is found.
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::Regulatory => REGULATORY_DEFAULT_LABEL,
            Self::Handbook => HANDBOOK_DEFAULT_LABEL,
        }
    }

    /// Lowercase name, as stored in chunk metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regulatory => "regulatory",
            Self::Handbook => "handbook",
        }
    }
}

impl std::fmt::Display for DocumentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source document as loaded from disk.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Path the document was read from.
    pub path: PathBuf,

    /// Decoded text with LF line endings.
    pub text: String,
}

impl RawDocument {
    /// Create a document, stripping a UTF-8 BOM and normalizing line endings.
    pub fn new(path: impl Into<PathBuf>, text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self {
            path: path.into(),
            text: text.replace("\r\n", "\n").replace('\r', "\n"),
        }
    }

    /// Decode raw bytes as UTF-8.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self> {
        let path = path.into();
        let text = String::from_utf8(bytes)
            .map_err(|e| LexiError::load_failed(&path, format!("invalid UTF-8: {}", e)))?;
        Ok(Self::new(path, &text))
    }

    /// Final path component, used for classification and logging.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Source string recorded in chunk metadata.
    pub fn source(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Ordered structural labels, coarsest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextPath {
    labels: Vec<String>,
}

impl ContextPath {
    /// Separator used when rendering the path.
    pub const SEPARATOR: &'static str = " > ";

    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path from labels, dropping blank ones.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = Self::new();
        for label in labels {
            path.push(label);
        }
        path
    }

    /// Append a label; blank labels are ignored.
    pub fn push(&mut self, label: impl AsRef<str>) {
        let label = label.as_ref().trim();
        if !label.is_empty() {
            self.labels.push(label.to_string());
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Render as `"A > B > C"`.
    pub fn render(&self) -> String {
        self.labels.join(Self::SEPARATOR)
    }
}

impl std::fmt::Display for ContextPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Separator strategy for the bounded recursive splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Separator {
    /// Blank line (`"\n\n"`).
    Paragraph,
    /// Line break (`"\n"`).
    Line,
    /// After sentence-terminating punctuation.
    Sentence,
    /// Single space.
    Whitespace,
    /// Character boundary, the last resort.
    Character,
}

impl Separator {
    /// Full priority list, coarsest first.
    pub fn all() -> Vec<Separator> {
        vec![
            Self::Paragraph,
            Self::Line,
            Self::Sentence,
            Self::Whitespace,
            Self::Character,
        ]
    }
}

/// Size-bounded splitting configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitConfig {
    /// Maximum piece size in characters.
    pub max_chunk_size: usize,

    /// Characters of trailing context carried into the next piece.
    pub overlap: usize,

    /// Separator strategies, tried in order.
    pub separators: Vec<Separator>,
}

impl SplitConfig {
    /// Create a validated configuration with the full separator list.
    pub fn new(max_chunk_size: usize, overlap: usize) -> Result<Self> {
        Self::with_separators(max_chunk_size, overlap, Separator::all())
    }

    /// Create a validated configuration with explicit separators.
    pub fn with_separators(
        max_chunk_size: usize,
        overlap: usize,
        separators: Vec<Separator>,
    ) -> Result<Self> {
        if max_chunk_size == 0 {
            return Err(LexiError::invalid_argument(
                "max_chunk_size must be greater than zero",
            ));
        }
        if overlap >= max_chunk_size {
            return Err(LexiError::invalid_argument(format!(
                "overlap ({}) must be smaller than max_chunk_size ({})",
                overlap, max_chunk_size
            )));
        }
        Ok(Self {
            max_chunk_size,
            overlap,
            separators,
        })
    }
}

/// A size-bounded text segment annotated with its structural path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `"[" + context_path + "]\n" + body`.
    pub content: String,

    /// Path of the document this chunk came from.
    pub source_file: String,

    /// Rendered structural path, never empty.
    pub context_path: String,

    /// Caller metadata plus `section`.
    pub metadata: Metadata,
}

impl Chunk {
    /// Content without the bracketed context prefix.
    pub fn body(&self) -> &str {
        let prefix_len = self.context_path.len() + 3;
        self.content.get(prefix_len..).unwrap_or("")
    }

    /// Blake3 hash of the content, hex encoded.
    pub fn content_hash(&self) -> String {
        hex::encode(blake3::hash(self.content.as_bytes()).as_bytes())
    }

    /// Document class recorded in metadata, if any.
    pub fn kind(&self) -> Option<&str> {
        self.metadata.get("kind").map(String::as_str)
    }
}

/// Per-source chunk counts reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    /// Source file path.
    pub source: String,

    /// Document class of the source.
    pub kind: String,

    /// Number of persisted chunks.
    pub chunks: u64,
}
