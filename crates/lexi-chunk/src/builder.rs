//! Chunk construction with context injection.

use lexi_core::{Chunk, ContextPath, Metadata};

/// Builds emittable chunks from raw section text.
///
/// The rendered context path is prepended to the body in brackets so the
/// structural annotation travels with the text into the embedding space.
#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    default_label: String,
}

impl ChunkBuilder {
    /// Create a builder that substitutes `default_label` for an empty context.
    pub fn new(default_label: impl Into<String>) -> Self {
        Self {
            default_label: default_label.into(),
        }
    }

    /// Build a chunk from a raw body, caller metadata and its context.
    pub fn build(&self, raw_body: &str, metadata: &Metadata, context: &ContextPath) -> Chunk {
        let context_path = if context.is_empty() {
            self.default_label.clone()
        } else {
            context.render()
        };
        let body = normalize_whitespace(raw_body);

        let mut metadata = metadata.clone();
        metadata.insert("section".to_string(), context_path.clone());

        Chunk {
            content: format!("[{}]\n{}", context_path, body),
            source_file: metadata.get("source").cloned().unwrap_or_default(),
            context_path,
            metadata,
        }
    }
}

/// Collapse runs of blank lines into single newlines and trim the result.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), "data/quyche.txt".to_string());
        metadata.insert("section".to_string(), "stale".to_string());
        metadata
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("\n\n  Khoản 1.\n\n\n   \nKhoản 2.  \n\n"),
            "Khoản 1.\nKhoản 2."
        );
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_build_injects_context() {
        let builder = ChunkBuilder::new("Quy định chung");
        let context = ContextPath::from_labels(["CHƯƠNG I", "Điều 1. Phạm vi điều chỉnh"]);
        let chunk = builder.build("\nNội dung điều 1.\n\n", &metadata(), &context);

        assert_eq!(
            chunk.content,
            "[CHƯƠNG I > Điều 1. Phạm vi điều chỉnh]\nNội dung điều 1."
        );
        assert_eq!(chunk.context_path, "CHƯƠNG I > Điều 1. Phạm vi điều chỉnh");
        assert_eq!(chunk.source_file, "data/quyche.txt");
        assert_eq!(chunk.metadata["section"], chunk.context_path);
        assert_eq!(chunk.body(), "Nội dung điều 1.");
    }

    #[test]
    fn test_empty_context_uses_default_label() {
        let builder = ChunkBuilder::new("Thông tin chung");
        let chunk = builder.build("Giới thiệu", &Metadata::new(), &ContextPath::new());

        assert_eq!(chunk.context_path, "Thông tin chung");
        assert_eq!(chunk.content, "[Thông tin chung]\nGiới thiệu");
        assert!(chunk.source_file.is_empty());
    }
}
