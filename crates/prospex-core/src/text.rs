//! Text normalization.
//!
//! Turns raw extracted text into a canonical string plus a page map so
//! later spans can report a page number. Normalization never fails; empty
//! or unreadable input simply yields empty text and the engine raises the
//! `text_unusable` flag.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "word-\ncontinuation" from a line wrap; only rejoin into lowercase.
    static ref HYPHEN_WRAP: Regex = Regex::new(r"(\w)-[ \t]*\n[ \t]*([a-z])").unwrap();
}

/// Normalized document text with page boundaries.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    /// The canonical text.
    pub text: String,
    /// Byte offset at which each page starts. Always non-empty; page 1
    /// starts at offset 0.
    page_starts: Vec<usize>,
}

impl NormalizedText {
    /// 1-based page number containing the given byte offset.
    pub fn page_at(&self, offset: usize) -> usize {
        match self.page_starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Number of pages recorded during normalization.
    pub fn page_count(&self) -> usize {
        self.page_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Normalize raw document text.
///
/// Collapses runs of blanks, rejoins hyphen-broken words across line
/// wraps, strips non-printable characters, and converts form-feed page
/// breaks into recorded page boundaries.
pub fn normalize(raw: &str) -> NormalizedText {
    // Hyphenation first: page breaks are untouched by this pass.
    let rejoined = HYPHEN_WRAP.replace_all(raw, "$1$2");

    let mut text = String::with_capacity(rejoined.len());
    let mut page_starts = vec![0];
    let mut pending_spaces = 0usize;
    let mut pending_newlines = 0usize;

    for c in rejoined.chars() {
        match c {
            '\u{0c}' => {
                // Page break: flush as a line break and record the boundary.
                flush_whitespace(&mut text, &mut pending_spaces, &mut pending_newlines);
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                page_starts.push(text.len());
            }
            '\n' => pending_newlines += 1,
            ' ' | '\t' | '\u{a0}' => pending_spaces += 1,
            '\r' => {}
            c if c.is_control() => {}
            c => {
                flush_whitespace(&mut text, &mut pending_spaces, &mut pending_newlines);
                text.push(c);
            }
        }
    }

    while text.ends_with(['\n', ' ']) {
        text.pop();
    }

    NormalizedText { text, page_starts }
}

/// Largest char-boundary offset not exceeding `idx`. Byte-based window
/// and span arithmetic goes through this before slicing.
pub fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn flush_whitespace(text: &mut String, spaces: &mut usize, newlines: &mut usize) {
    if *newlines > 0 {
        // Runs of blank lines collapse to a single paragraph break.
        if !text.is_empty() {
            text.push('\n');
            if *newlines > 1 {
                text.push('\n');
            }
        }
    } else if *spaces > 0 && !text.is_empty() && !text.ends_with('\n') {
        text.push(' ');
    }
    *spaces = 0;
    *newlines = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collapse_whitespace() {
        let norm = normalize("Issue   Date:\t  15 March    2024");
        assert_eq!(norm.text, "Issue Date: 15 March 2024");
    }

    #[test]
    fn test_hyphen_rejoin() {
        let norm = normalize("the Stabilisa-\ntion Manager");
        assert_eq!(norm.text, "the Stabilisation Manager");
    }

    #[test]
    fn test_hyphen_before_uppercase_kept() {
        // Hyphens before capitals are usually real (e.g. ranges, names).
        let norm = normalize("NORD-\nLB");
        assert_eq!(norm.text, "NORD-\nLB");
    }

    #[test]
    fn test_page_map() {
        let norm = normalize("page one text\u{0c}page two text\u{0c}page three");
        assert_eq!(norm.page_count(), 3);
        assert_eq!(norm.page_at(0), 1);
        let second = norm.text.find("page two").unwrap();
        assert_eq!(norm.page_at(second), 2);
        let third = norm.text.find("page three").unwrap();
        assert_eq!(norm.page_at(third), 3);
    }

    #[test]
    fn test_strips_control_characters() {
        let norm = normalize("Coupon\u{0}: 3.5\u{7}%");
        assert_eq!(norm.text, "Coupon: 3.5%");
    }

    #[test]
    fn test_empty_input() {
        let norm = normalize("");
        assert!(norm.is_empty());
        assert_eq!(norm.page_count(), 1);
    }

    #[test]
    fn test_blank_line_collapse() {
        let norm = normalize("Terms\n\n\n\nConditions");
        assert_eq!(norm.text, "Terms\n\nConditions");
    }

    #[test]
    fn test_floor_char_boundary() {
        // The first "é" occupies bytes 4..6; 5 splits it.
        let s = "Société";
        assert_eq!(floor_char_boundary(s, 4), 4);
        assert_eq!(floor_char_boundary(s, 5), 4);
        assert_eq!(floor_char_boundary(s, 6), 6);
        assert_eq!(floor_char_boundary(s, 0), 0);
    }
}
