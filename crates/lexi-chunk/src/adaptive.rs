//! Segmenter that dispatches on document class.

use lexi_core::{Chunk, DocumentClass, LexiConfig, Metadata, RawDocument, Result, Segmenter};

use crate::{DocumentClassifier, HandbookSegmenter, RegulatorySegmenter};

/// Classifies each document by file name and hands it to the matching
/// segmenter.
#[derive(Debug, Clone)]
pub struct AdaptiveSegmenter {
    classifier: DocumentClassifier,
    regulatory: RegulatorySegmenter,
    handbook: HandbookSegmenter,
}

impl AdaptiveSegmenter {
    /// Build both segmenters and the classifier from configuration.
    pub fn from_config(config: &LexiConfig) -> Result<Self> {
        Ok(Self {
            classifier: DocumentClassifier::from_config(&config.classifier),
            regulatory: RegulatorySegmenter::new(&config.chunking)?,
            handbook: HandbookSegmenter::new(&config.chunking)?,
        })
    }

    pub fn classify(&self, filename: &str) -> DocumentClass {
        self.classifier.classify(filename)
    }

    /// Segmenter for a document class.
    pub fn segmenter(&self, class: DocumentClass) -> &dyn Segmenter {
        match class {
            DocumentClass::Regulatory => &self.regulatory,
            DocumentClass::Handbook => &self.handbook,
        }
    }

    /// Classify and segment one document. Every chunk carries `source` and
    /// `kind` metadata.
    pub fn segment_document(&self, document: &RawDocument) -> (DocumentClass, Vec<Chunk>) {
        let segmenter = self.segmenter(self.classify(&document.file_name()));
        let class = segmenter.document_class();

        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), document.source());
        metadata.insert("kind".to_string(), class.as_str().to_string());

        (class, segmenter.segment(&document.text, &metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> AdaptiveSegmenter {
        AdaptiveSegmenter::from_config(&LexiConfig::default()).unwrap()
    }

    #[test]
    fn test_regulatory_dispatch() {
        let document = RawDocument::new(
            "data/quyche_hocphi.txt",
            "CHƯƠNG I\nĐiều 1. Mức thu\nTheo tín chỉ.",
        );
        let (class, chunks) = segmenter().segment_document(&document);

        assert_eq!(class, DocumentClass::Regulatory);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind(), Some("regulatory"));
        assert_eq!(chunks[0].source_file, document.source());
    }

    #[test]
    fn test_handbook_dispatch() {
        let document = RawDocument::new("data/so_tay.md", "# Thư viện\nMở cửa 7h.");
        let (class, chunks) = segmenter().segment_document(&document);

        assert_eq!(class, DocumentClass::Handbook);
        assert_eq!(chunks[0].context_path, "Thư viện");
        assert_eq!(chunks[0].kind(), Some("handbook"));
    }

    #[test]
    fn test_segmenter_matches_class() {
        let segmenter = segmenter();
        for class in [DocumentClass::Regulatory, DocumentClass::Handbook] {
            assert_eq!(segmenter.segmenter(class).document_class(), class);
        }
    }

    #[test]
    fn test_same_text_differs_by_class() {
        let text = "# Mục 1\nĐiều 1. Nội dung\nabc";
        let segmenter = segmenter();

        let (_, as_handbook) = segmenter.segment_document(&RawDocument::new("guide.md", text));
        let (_, as_regulation) =
            segmenter.segment_document(&RawDocument::new("quydinh.md", text));

        assert_eq!(as_handbook[0].context_path, "Mục 1");
        assert_eq!(as_regulation[0].context_path, "Điều 1. Nội dung");
    }
}
