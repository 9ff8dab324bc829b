//! Bounded recursive text splitter.
//!
//! Splits text by trying progressively smaller separators until every piece
//! fits within the character limit, carrying a little trailing context from
//! each piece into the next.

use std::collections::VecDeque;

use lexi_core::{Separator, SplitConfig};

/// Recursive splitter that packs text into pieces of at most
/// `max_chunk_size` characters.
///
/// Tries each separator in order until pieces are small enough:
/// 1. Double newline (paragraph breaks)
/// 2. Single newline
/// 3. Sentence boundaries (. ! ?)
/// 4. Word boundaries (space)
/// 5. Character (last resort)
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    config: SplitConfig,
}

impl RecursiveSplitter {
    /// Create a splitter from a validated configuration.
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Split text into trimmed, non-empty pieces.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        self.split_recursive(text, &self.config.separators, &mut pieces);
        pieces
    }

    /// Recursively split text.
    fn split_recursive(&self, text: &str, separators: &[Separator], pieces: &mut Vec<String>) {
        // If text fits in one piece, keep it
        if char_len(text) <= self.config.max_chunk_size {
            push_piece(pieces, text);
            return;
        }

        for (sep_idx, separator) in separators.iter().enumerate() {
            let fragments = split_by_separator(text, *separator);
            if fragments.len() <= 1 {
                continue;
            }

            self.merge(fragments, &separators[sep_idx + 1..], pieces);
            return;
        }

        // Fallback: split by size
        self.split_by_size(text, pieces);
    }

    /// Greedily pack fragments into pieces, seeding each new piece with the
    /// trailing fragments of the previous one.
    fn merge(&self, fragments: Vec<&str>, remaining: &[Separator], pieces: &mut Vec<String>) {
        let max = self.config.max_chunk_size;
        let overlap = self.config.overlap;

        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut window_len = 0;
        // Whether the window holds a fragment not yet emitted.
        let mut dirty = false;

        for fragment in fragments {
            let len = char_len(fragment);

            if len > max {
                // Fragment itself is too big, recurse with the next separator
                if dirty {
                    push_piece(pieces, &join(&window));
                }
                window.clear();
                window_len = 0;
                dirty = false;
                self.split_recursive(fragment, remaining, pieces);
                continue;
            }

            if window_len + len > max && !window.is_empty() {
                if dirty {
                    push_piece(pieces, &join(&window));
                    dirty = false;
                }
                while window_len > overlap || (window_len > 0 && window_len + len > max) {
                    match window.pop_front() {
                        Some((_, dropped)) => window_len -= dropped,
                        None => break,
                    }
                }
            }

            window.push_back((fragment, len));
            window_len += len;
            // A whitespace-only tail must not re-emit the overlap on its own.
            if !fragment.trim().is_empty() {
                dirty = true;
            }
        }

        if dirty {
            push_piece(pieces, &join(&window));
        }
    }

    /// Split text by size (last resort when no separator applies).
    fn split_by_size(&self, text: &str, pieces: &mut Vec<String>) {
        let chars: Vec<char> = text.chars().collect();
        let max = self.config.max_chunk_size;
        let step = max - self.config.overlap;
        let mut start = 0;

        while start < chars.len() {
            let end = (start + max).min(chars.len());
            let piece: String = chars[start..end].iter().collect();
            push_piece(pieces, &piece);

            if end == chars.len() {
                break;
            }
            start += step;
        }
    }
}

/// Split text in one call.
pub fn split_text(text: &str, config: &SplitConfig) -> Vec<String> {
    RecursiveSplitter::new(config.clone()).split(text)
}

/// Split text by a separator, keeping the separator on the preceding
/// fragment so that concatenating fragments reproduces the text.
fn split_by_separator(text: &str, separator: Separator) -> Vec<&str> {
    match separator {
        Separator::Paragraph => text.split_inclusive("\n\n").collect(),
        Separator::Line => text.split_inclusive('\n').collect(),
        Separator::Sentence => text
            .split_inclusive(|c: char| matches!(c, '.' | '!' | '?'))
            .collect(),
        Separator::Whitespace => text.split_inclusive(' ').collect(),
        Separator::Character => text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect(),
    }
}

fn join(window: &VecDeque<(&str, usize)>) -> String {
    window.iter().map(|(fragment, _)| *fragment).collect()
}

fn push_piece(pieces: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        pieces.push(piece.to_string());
    }
}

/// Length in characters, the unit every size limit is expressed in.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
