//! Heading-based segmentation for handbooks and guides.

use tracing::debug;

use lexi_core::{Chunk, ChunkingConfig, DocumentClass, Metadata, Result, Segmenter};

use crate::builder::{normalize_whitespace, ChunkBuilder};
use crate::recursive::{char_len, RecursiveSplitter};
use crate::structure::{BoundaryLevel, StructureSplitter};

/// ATX heading patterns for `#`, `##` and `###`; a closing run of `#` is
/// not part of the label.
pub const HEADING_PATTERNS: [(&str, &str); 3] = [
    ("h1", r"^\s{0,3}#[ \t]+(?P<label>.+?)(?:[ \t]+#+)?[ \t]*$"),
    ("h2", r"^\s{0,3}##[ \t]+(?P<label>.+?)(?:[ \t]+#+)?[ \t]*$"),
    ("h3", r"^\s{0,3}###[ \t]+(?P<label>.+?)(?:[ \t]+#+)?[ \t]*$"),
];

/// Segmenter for non-regulatory documents.
///
/// Splits at the first three heading levels; deeper headings stay in the
/// body. Text before the first heading is labelled `Thông tin chung`.
#[derive(Debug, Clone)]
pub struct HandbookSegmenter {
    headings: StructureSplitter,
    splitter: RecursiveSplitter,
    builder: ChunkBuilder,
    max_chunk_size: usize,
}

impl HandbookSegmenter {
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        let levels = HEADING_PATTERNS
            .iter()
            .map(|(name, pattern)| BoundaryLevel::new(*name, pattern))
            .collect::<Result<Vec<_>>>()?;

        let headings = StructureSplitter::new(levels)
            .with_reset_nested(config.reset_nested_headings)
            .with_fence_awareness(true);

        Ok(Self {
            headings,
            splitter: RecursiveSplitter::new(config.handbook_split()?),
            builder: ChunkBuilder::new(DocumentClass::Handbook.default_label()),
            max_chunk_size: config.max_chunk_size,
        })
    }
}

impl Segmenter for HandbookSegmenter {
    fn segment(&self, text: &str, metadata: &Metadata) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for section in self.headings.sections(text) {
            if !section.has_content() {
                continue;
            }

            let context = section.context();
            let body = normalize_whitespace(&section.body);
            if char_len(&body) <= self.max_chunk_size {
                chunks.push(self.builder.build(&body, metadata, &context));
                continue;
            }

            let pieces = self.splitter.split(&section.body);
            debug!(
                "Section '{}' split into {} pieces",
                context.render(),
                pieces.len()
            );
            for piece in pieces {
                chunks.push(self.builder.build(&piece, metadata, &context));
            }
        }

        chunks
    }

    fn document_class(&self) -> DocumentClass {
        DocumentClass::Handbook
    }
}
