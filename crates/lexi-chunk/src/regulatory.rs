//! Chapter → Article → Clause segmentation for regulations.

use tracing::{debug, warn};

use lexi_core::{
    Chunk, ChunkingConfig, ContextPath, DocumentClass, Metadata, Result, Segmenter,
    UnstructuredPolicy,
};

use crate::builder::ChunkBuilder;
use crate::recursive::{char_len, RecursiveSplitter};
use crate::structure::{BoundaryLevel, StructureSplitter};

/// `CHƯƠNG IV` / `CHƯƠNG II. QUY ĐỊNH CHUNG`: uppercase marker at column 0,
/// Roman numeral, optional title. Title-case `Chương ...` is body text.
pub const CHAPTER_PATTERN: &str = r"^(?P<label>CHƯƠNG\s+[IVXLCDM]+\b.*?)\s*$";

/// `Điều 5. Học phí` / `Điều 12: ...`: marker at column 0, number, `.` or
/// `:`, optional title.
pub const ARTICLE_PATTERN: &str = r"^(?P<label>Điều\s+\d+[.:].*?)\s*$";

const CHAPTER: usize = 0;
const ARTICLE: usize = 1;

/// Hierarchical segmenter for regulatory documents.
///
/// Every sub-chunk of a long article carries the full
/// `chapter > article` context, so no piece loses its article identity.
#[derive(Debug, Clone)]
pub struct RegulatorySegmenter {
    /// Chapter and article levels, article label reset on each chapter.
    outline: StructureSplitter,

    /// Article level alone, for documents without chapters.
    articles: StructureSplitter,

    splitter: RecursiveSplitter,
    builder: ChunkBuilder,
    max_chunk_size: usize,
    unstructured: UnstructuredPolicy,
}

impl RegulatorySegmenter {
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        let outline = StructureSplitter::new(vec![
            BoundaryLevel::new("chapter", CHAPTER_PATTERN)?,
            BoundaryLevel::new("article", ARTICLE_PATTERN)?,
        ])
        .with_reset_nested(true);
        let articles = StructureSplitter::new(vec![BoundaryLevel::new("article", ARTICLE_PATTERN)?]);

        Ok(Self {
            outline,
            articles,
            splitter: RecursiveSplitter::new(config.article_split()?),
            builder: ChunkBuilder::new(DocumentClass::Regulatory.default_label()),
            max_chunk_size: config.max_chunk_size,
            unstructured: config.unstructured,
        })
    }

    /// Chapter pass: preambles and articles under each chapter. Text before
    /// the first chapter heading is not emitted.
    fn segment_chapters(&self, text: &str, metadata: &Metadata, chunks: &mut Vec<Chunk>) {
        for section in self.outline.sections(text) {
            let Some(chapter) = section.label(CHAPTER) else {
                continue;
            };

            match section.label(ARTICLE) {
                Some(article) => {
                    let context = ContextPath::from_labels([chapter, article]);
                    self.push_article(chunks, &context, article, &section.body, metadata);
                }
                None if section.has_content() => {
                    let context = ContextPath::from_labels([chapter]);
                    chunks.push(self.builder.build(&section.body, metadata, &context));
                }
                None => {}
            }
        }
    }

    /// Article pass over the whole text, article heading as the only label.
    fn segment_articles(&self, text: &str, metadata: &Metadata, chunks: &mut Vec<Chunk>) {
        for section in self.articles.sections(text) {
            if let Some(article) = section.label(0) {
                let context = ContextPath::from_labels([article]);
                self.push_article(chunks, &context, article, &section.body, metadata);
            }
        }
    }

    /// Keep a short article whole; split a long one, repeating its context
    /// on every piece. Length is measured on the heading plus the body as
    /// written, blank lines included.
    fn push_article(
        &self,
        chunks: &mut Vec<Chunk>,
        context: &ContextPath,
        heading: &str,
        raw_body: &str,
        metadata: &Metadata,
    ) {
        let raw_len = char_len(heading) + char_len(raw_body);

        if raw_len < self.max_chunk_size {
            chunks.push(self.builder.build(raw_body, metadata, context));
            return;
        }

        let pieces = self.splitter.split(raw_body);
        debug!(
            "Article '{}' split into {} pieces ({} chars)",
            heading,
            pieces.len(),
            raw_len
        );
        for piece in pieces {
            chunks.push(self.builder.build(&piece, metadata, context));
        }
    }
}

impl Segmenter for RegulatorySegmenter {
    fn segment(&self, text: &str, metadata: &Metadata) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        self.segment_chapters(text, metadata, &mut chunks);

        if chunks.is_empty() {
            self.segment_articles(text, metadata, &mut chunks);
        }

        if chunks.is_empty() && !text.trim().is_empty() {
            let source = metadata.get("source").map(String::as_str).unwrap_or("<unknown>");
            match self.unstructured {
                UnstructuredPolicy::Skip => {
                    warn!(
                        "No chapter or article headings in {}, document produces no chunks",
                        source
                    );
                }
                UnstructuredPolicy::WholeDocument => {
                    debug!("No structure in {}, chunking whole document", source);
                    for piece in self.splitter.split(text) {
                        chunks.push(self.builder.build(&piece, metadata, &ContextPath::new()));
                    }
                }
            }
        }

        chunks
    }

    fn document_class(&self) -> DocumentClass {
        DocumentClass::Regulatory
    }
}
