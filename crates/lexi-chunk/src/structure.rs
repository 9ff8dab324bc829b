//! Line-anchored hierarchical boundary splitting.
//!
//! Regulations (Chapter → Article) and handbooks (H1 → H2 → H3) are both
//! split by the same operation: scan lines, treat lines matching a level's
//! pattern as headings, remember the heading as that level's label, and
//! collect the lines in between as section bodies.

use regex::Regex;

use lexi_core::{ContextPath, LexiError, Result};

/// One heading level: a line pattern with a `label` capture.
#[derive(Debug, Clone)]
pub struct BoundaryLevel {
    pattern: Regex,
}

impl BoundaryLevel {
    /// Compile a level. The pattern is matched against single lines and must
    /// capture the heading text as `label`; `name` appears in errors only.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|e| LexiError::Pattern {
            level: name.clone(),
            message: e.to_string(),
        })?;

        if !pattern.capture_names().any(|n| n == Some("label")) {
            return Err(LexiError::Pattern {
                level: name,
                message: "pattern has no `label` capture group".to_string(),
            });
        }

        Ok(Self { pattern })
    }

    /// Heading label if `line` is a heading of this level.
    pub fn label(&self, line: &str) -> Option<String> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.name("label"))
            .map(|m| m.as_str().trim().to_string())
            .filter(|label| !label.is_empty())
    }
}

/// A run of body lines and the labels in effect for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Most recent label per level, coarsest first.
    pub labels: Vec<Option<String>>,

    /// Level of the heading that opened this section; `None` for text that
    /// precedes every heading.
    pub opened_by: Option<usize>,

    /// Body lines joined with `\n`, heading line excluded.
    pub body: String,
}

impl Section {
    pub fn label(&self, level: usize) -> Option<&str> {
        self.labels.get(level).and_then(|l| l.as_deref())
    }

    /// Labels in ascending level order, absent levels omitted.
    pub fn context(&self) -> ContextPath {
        ContextPath::from_labels(self.labels.iter().flatten())
    }

    pub fn has_content(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

/// Generic boundary splitter parameterized by an ordered list of levels.
#[derive(Debug, Clone)]
pub struct StructureSplitter {
    levels: Vec<BoundaryLevel>,
    reset_nested: bool,
    fence_aware: bool,
}

impl StructureSplitter {
    /// Create a splitter; levels are listed coarsest first.
    pub fn new(levels: Vec<BoundaryLevel>) -> Self {
        Self {
            levels,
            reset_nested: false,
            fence_aware: false,
        }
    }

    /// Clear deeper labels whenever a heading is seen.
    pub fn with_reset_nested(mut self, reset_nested: bool) -> Self {
        self.reset_nested = reset_nested;
        self
    }

    /// Never treat lines inside ``` or ~~~ fences as headings.
    pub fn with_fence_awareness(mut self, fence_aware: bool) -> Self {
        self.fence_aware = fence_aware;
        self
    }

    /// Split text into sections.
    ///
    /// Every heading opens a section, even when its body is empty; leading
    /// text before the first heading is returned only if it is non-blank.
    pub fn sections(&self, text: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut labels: Vec<Option<String>> = vec![None; self.levels.len()];
        let mut opened_by: Option<usize> = None;
        let mut body: Vec<&str> = Vec::new();
        let mut in_fence = false;

        for line in text.lines() {
            if self.fence_aware && is_fence(line) {
                in_fence = !in_fence;
                body.push(line);
                continue;
            }

            let heading = if in_fence {
                None
            } else {
                self.match_heading(line)
            };

            match heading {
                Some((level, label)) => {
                    close(&mut sections, &labels, opened_by, &mut body);
                    labels[level] = Some(label);
                    if self.reset_nested {
                        for deeper in labels.iter_mut().skip(level + 1) {
                            *deeper = None;
                        }
                    }
                    opened_by = Some(level);
                }
                None => body.push(line),
            }
        }

        close(&mut sections, &labels, opened_by, &mut body);
        sections
    }

    fn match_heading(&self, line: &str) -> Option<(usize, String)> {
        self.levels
            .iter()
            .enumerate()
            .find_map(|(idx, level)| level.label(line).map(|label| (idx, label)))
    }
}

fn close(
    sections: &mut Vec<Section>,
    labels: &[Option<String>],
    opened_by: Option<usize>,
    body: &mut Vec<&str>,
) {
    let has_text = body.iter().any(|line| !line.trim().is_empty());
    if opened_by.is_some() || has_text {
        sections.push(Section {
            labels: labels.to_vec(),
            opened_by,
            body: body.join("\n"),
        });
    }
    body.clear();
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}
