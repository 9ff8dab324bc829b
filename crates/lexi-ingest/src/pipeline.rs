//! Directory-to-chunks pipeline.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use lexi_chunk::AdaptiveSegmenter;
use lexi_core::{Chunk, DocumentClass, LexiConfig, LexiError, RawDocument, Result};

/// A source file that could not be turned into chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// All chunks, in file order then structural order.
    pub chunks: Vec<Chunk>,

    /// Files skipped because they could not be read or decoded.
    pub failures: Vec<FileFailure>,

    /// Documents segmented as regulations.
    pub regulatory_documents: usize,

    /// Documents segmented as handbooks.
    pub handbook_documents: usize,
}

impl PipelineOutput {
    /// Number of documents that were segmented.
    pub fn documents(&self) -> usize {
        self.regulatory_documents + self.handbook_documents
    }
}

/// Loads every document under a directory, classifies it and segments it.
#[derive(Debug, Clone)]
pub struct Pipeline {
    segmenter: AdaptiveSegmenter,
    extensions: Vec<String>,
    fail_fast: bool,
}

impl Pipeline {
    pub fn new(config: &LexiConfig) -> Result<Self> {
        Ok(Self {
            segmenter: AdaptiveSegmenter::from_config(config)?,
            extensions: config
                .source
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            fail_fast: config.source.fail_fast,
        })
    }

    /// Run the pipeline over `input_dir`.
    ///
    /// A missing input directory fails before any file is read. Unreadable
    /// files are collected as failures unless `fail_fast` is set.
    pub fn run(&self, input_dir: &Path) -> Result<PipelineOutput> {
        if !input_dir.is_dir() {
            return Err(LexiError::SourceNotFound {
                path: input_dir.to_path_buf(),
            });
        }

        let mut output = PipelineOutput::default();

        for path in self.discover(input_dir, &mut output.failures)? {
            let document = match load(&path) {
                Ok(document) => document,
                Err(e) if self.fail_fast || e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    output.failures.push(FileFailure {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let (class, chunks) = self.segmenter.segment_document(&document);
            debug!(
                "{} classified as {}, {} chunks",
                document.source(),
                class,
                chunks.len()
            );

            match class {
                DocumentClass::Regulatory => output.regulatory_documents += 1,
                DocumentClass::Handbook => output.handbook_documents += 1,
            }
            output.chunks.extend(chunks);
        }

        info!(
            "Pipeline produced {} chunks from {} documents ({} failed)",
            output.chunks.len(),
            output.documents(),
            output.failures.len()
        );

        Ok(output)
    }

    /// Matching files under `input_dir`, sorted by name at every level.
    fn discover(&self, input_dir: &Path, failures: &mut Vec<FileFailure>) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(input_dir).follow_links(true).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if self.accepts(entry.path()) {
                        paths.push(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    if self.fail_fast {
                        return Err(LexiError::load_failed(path, e.to_string()));
                    }
                    warn!(error = %e, "Failed to walk source directory");
                    failures.push(FileFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(paths)
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }
}

fn load(path: &Path) -> Result<RawDocument> {
    let bytes = std::fs::read(path).map_err(|e| LexiError::load_failed(path, e.to_string()))?;
    RawDocument::from_bytes(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexi_core::{SourceConfig, UnstructuredPolicy};

    const REGULATION: &str = "QUY CHẾ ĐÀO TẠO\nCHƯƠNG I. QUY ĐỊNH CHUNG\nĐiều 1. Phạm vi\nÁp dụng cho sinh viên.\nĐiều 2. Đối tượng\nSinh viên chính quy.\n";
    const HANDBOOK: &str = "# Sổ tay\n## Thư viện\nMở cửa 7h đến 21h.\n";

    fn write(dir: &Path, name: &str, content: &[u8]) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn pipeline(config: &LexiConfig) -> Pipeline {
        Pipeline::new(config).unwrap()
    }

    #[test]
    fn test_missing_source_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = pipeline(&LexiConfig::default())
            .run(&dir.path().join("missing"))
            .unwrap_err();

        assert_eq!(err.error_code(), "SOURCE_NOT_FOUND");
    }

    #[test]
    fn test_file_as_source_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "quyche.txt", REGULATION.as_bytes());

        let err = pipeline(&LexiConfig::default())
            .run(&dir.path().join("quyche.txt"))
            .unwrap_err();
        assert!(matches!(err, LexiError::SourceNotFound { .. }));
    }

    #[test]
    fn test_mixed_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "so_tay.md", HANDBOOK.as_bytes());
        write(dir.path(), "quyche_daotao.txt", REGULATION.as_bytes());
        write(dir.path(), "scan.pdf", b"%PDF-1.4");

        let output = pipeline(&LexiConfig::default()).run(dir.path()).unwrap();

        assert_eq!(output.regulatory_documents, 1);
        assert_eq!(output.handbook_documents, 1);
        assert!(output.failures.is_empty());

        let sections: Vec<&str> = output
            .chunks
            .iter()
            .map(|c| c.context_path.as_str())
            .collect();
        assert_eq!(
            sections,
            vec![
                "CHƯƠNG I. QUY ĐỊNH CHUNG > Điều 1. Phạm vi",
                "CHƯƠNG I. QUY ĐỊNH CHUNG > Điều 2. Đối tượng",
                "Sổ tay > Thư viện",
            ]
        );
        assert!(output.chunks[0].source_file.ends_with("quyche_daotao.txt"));
        assert_eq!(output.chunks[2].kind(), Some("handbook"));
    }

    #[test]
    fn test_nested_directories_and_extension_case() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b/so_tay.MD", HANDBOOK.as_bytes());
        write(dir.path(), "a/luat.txt", REGULATION.as_bytes());

        let output = pipeline(&LexiConfig::default()).run(dir.path()).unwrap();

        assert_eq!(output.documents(), 2);
        assert!(output.chunks[0].source_file.ends_with("luat.txt"));
        assert!(output.chunks.last().unwrap().source_file.ends_with("so_tay.MD"));
    }

    #[test]
    fn test_invalid_utf8_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.txt", &[0x48, 0xff, 0xfe, 0x0a]);
        write(dir.path(), "so_tay.md", HANDBOOK.as_bytes());

        let output = pipeline(&LexiConfig::default()).run(dir.path()).unwrap();

        assert_eq!(output.documents(), 1);
        assert_eq!(output.failures.len(), 1);
        assert!(output.failures[0].path.ends_with("broken.txt"));
        assert!(output.failures[0].reason.contains("UTF-8"));
    }

    #[test]
    fn test_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.txt", &[0xff]);

        let config = LexiConfig {
            source: SourceConfig {
                fail_fast: true,
                ..SourceConfig::default()
            },
            ..LexiConfig::default()
        };
        let err = pipeline(&config).run(dir.path()).unwrap_err();

        assert_eq!(err.error_code(), "LOAD_FAILED");
    }

    #[test]
    fn test_unstructured_regulation() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "quydinh_nghi_tet.txt", "Lịch nghỉ Tết từ 1/2.".as_bytes());

        let output = pipeline(&LexiConfig::default()).run(dir.path()).unwrap();
        assert_eq!(output.regulatory_documents, 1);
        assert!(output.chunks.is_empty());

        let mut config = LexiConfig::default();
        config.chunking.unstructured = UnstructuredPolicy::WholeDocument;
        let output = pipeline(&config).run(dir.path()).unwrap();
        assert_eq!(output.chunks.len(), 1);
        assert_eq!(output.chunks[0].context_path, "Quy định chung");
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = pipeline(&LexiConfig::default()).run(dir.path()).unwrap();

        assert!(output.chunks.is_empty());
        assert_eq!(output.documents(), 0);
    }

    #[test]
    fn test_deterministic_runs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "quyche.txt", REGULATION.as_bytes());
        write(dir.path(), "so_tay.md", HANDBOOK.as_bytes());

        let pipeline = pipeline(&LexiConfig::default());
        let first = pipeline.run(dir.path()).unwrap();
        let second = pipeline.run(dir.path()).unwrap();

        assert_eq!(first.chunks, second.chunks);
    }
}
