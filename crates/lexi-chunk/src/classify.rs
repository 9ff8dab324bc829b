//! Filename-based document classification.

use std::path::Path;

use lexi_core::{ClassifierConfig, DocumentClass};

/// Decides whether a document is a regulation or a handbook from its name.
#[derive(Debug, Clone)]
pub struct DocumentClassifier {
    keywords: Vec<String>,
}

impl DocumentClassifier {
    /// Create a classifier from keyword stems.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| fold_ascii(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(&config.keywords)
    }

    /// Classify a file by its final path component. Total: unknown names
    /// are handbooks.
    pub fn classify(&self, filename: &str) -> DocumentClass {
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let folded = fold_ascii(&name);

        if self.keywords.iter().any(|k| folded.contains(k.as_str())) {
            DocumentClass::Regulatory
        } else {
            DocumentClass::Handbook
        }
    }
}

impl Default for DocumentClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

/// Lowercase, strip Vietnamese diacritics and drop everything that is not
/// ASCII alphanumeric, so `"Quy_chế Đào tạo"` folds to `"quychedaotao"`.
///
/// Decomposed input works too: combining marks are dropped as non-ASCII.
pub fn fold_ascii(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(strip_diacritic)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

fn strip_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ằ' | 'ắ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ầ' | 'ấ' | 'ẩ'
        | 'ẫ' | 'ậ' => 'a',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ' | 'ở'
        | 'ỡ' | 'ợ' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' => 'y',
        'đ' => 'd',
        other => other,
    }
}
