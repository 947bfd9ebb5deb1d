//! Section locator.
//!
//! Prospectuses put the same facts in predictable places: banks in the
//! distribution section, economics in the terms section. Locating those
//! sections first lets the extractors run narrow, high-precision passes
//! before falling back to the whole document.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{FieldKind, Span};
use crate::text::{floor_char_boundary, NormalizedText};

/// A recognized section family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// "Plan of Distribution", "Subscription and Sale", etc.
    Distribution,
    /// "Underwriting" and stabilisation sections.
    Underwriting,
    /// "Terms and Conditions", "Final Terms", pricing supplements.
    Terms,
    /// "Summary" / "Overview of the Offering".
    Summary,
}

impl SectionKind {
    /// Section kinds relevant to a field, in priority order.
    pub fn for_field(field: FieldKind) -> &'static [SectionKind] {
        match field {
            FieldKind::BankRole => &[
                SectionKind::Distribution,
                SectionKind::Underwriting,
                SectionKind::Summary,
            ],
            FieldKind::Issuer => &[SectionKind::Summary, SectionKind::Terms],
            _ => &[SectionKind::Terms, SectionKind::Summary],
        }
    }
}

/// A located section: its kind and the span it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub span: Span,
}

lazy_static! {
    // Headings start a line, optionally behind a section number, and are
    // matched case-insensitively to tolerate TITLE CASE and ALL CAPS.
    static ref HEADINGS: Vec<(SectionKind, Regex)> = vec![
        (
            SectionKind::Distribution,
            heading(r"plan\s+of\s+distribution|subscription\s+and\s+sale|placement\s+of\s+the\s+notes|distribution"),
        ),
        (
            SectionKind::Underwriting,
            heading(r"underwriting(?:\s+arrangements?)?|stabili[sz]ation"),
        ),
        (
            SectionKind::Terms,
            heading(r"(?:final\s+)?terms\s+(?:and\s+conditions\s+)?of\s+the\s+(?:notes|bonds|offering|issue)|terms\s+and\s+conditions|final\s+terms|pricing\s+supplement|key\s+terms"),
        ),
        (
            SectionKind::Summary,
            heading(r"summary(?:\s+of\s+the\s+(?:offering|notes|programme))?|overview\s+of\s+the\s+(?:offering|notes)|the\s+offering"),
        ),
    ];

    // Any heading at all, used to close the preceding section's span.
    static ref ANY_HEADING: Regex =
        heading(r"[A-Za-z][A-Za-z ,'&/-]{3,60}");
}

fn heading(body: &str) -> Regex {
    // Unwrap is fine: the alternations above are static and tested.
    Regex::new(&format!(r"(?im)^[ \t]*(?:[0-9]+(?:\.[0-9]+)*\.?[ \t]+)?(?:{body})[ \t]*:?[ \t]*$"))
        .unwrap()
}

/// Locate all recognized sections, in document order.
///
/// A section runs from the end of its heading line to the start of the
/// next recognized heading, capped at `max_span` bytes. Unrecognized
/// headings (any short title-like line) also close an open section, so a
/// "Plan of Distribution" span does not swallow the risk factors that
/// follow it.
pub fn locate(text: &NormalizedText, max_span: usize) -> Vec<Section> {
    let mut found: Vec<(usize, usize, SectionKind)> = Vec::new();

    for (kind, regex) in HEADINGS.iter() {
        for m in regex.find_iter(&text.text) {
            found.push((m.start(), m.end(), *kind));
        }
    }
    found.sort_by_key(|(start, _, _)| *start);
    found.dedup_by_key(|(start, _, _)| *start);

    let boundaries: Vec<usize> = ANY_HEADING
        .find_iter(&text.text)
        .map(|m| m.start())
        .collect();

    found
        .into_iter()
        .map(|(start, heading_end, kind)| {
            let next_heading = boundaries
                .iter()
                .copied()
                .find(|&b| b > heading_end)
                .unwrap_or(text.text.len());
            // The cap is byte arithmetic and can land inside a multi-byte
            // character; the other candidates are match offsets.
            let end = floor_char_boundary(
                &text.text,
                next_heading.min(heading_end + max_span).min(text.text.len()),
            );
            Section {
                kind,
                span: Span {
                    start: heading_end,
                    end,
                    page: text.page_at(start),
                },
            }
        })
        .collect()
}

/// Sections relevant to a field, preserving document order within each
/// priority class.
pub fn sections_for<'a>(sections: &'a [Section], field: FieldKind) -> Vec<&'a Section> {
    let kinds = SectionKind::for_field(field);
    let mut out = Vec::new();
    for kind in kinds {
        out.extend(sections.iter().filter(|s| s.kind == *kind));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_locates_distribution_heading() {
        let text = normalize(
            "PLAN OF DISTRIBUTION\nThe Joint Lead Managers have agreed to subscribe.\nRISK FACTORS\nInvesting involves risk.",
        );
        let sections = locate(&text, 6000);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::Distribution);
        let body = &text.text[sections[0].span.start..sections[0].span.end];
        assert!(body.contains("Joint Lead Managers"));
        assert!(!body.contains("Investing involves risk"));
    }

    #[test]
    fn test_numbered_heading() {
        let text = normalize("4.  Subscription and Sale\nBNP Paribas will act as manager.");
        let sections = locate(&text, 6000);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::Distribution);
    }

    #[test]
    fn test_span_capped_without_next_heading() {
        let filler = "x".repeat(500);
        let text = normalize(&format!("Terms and Conditions\n{filler}"));
        let sections = locate(&text, 100);
        assert_eq!(sections.len(), 1);
        let s = &sections[0];
        assert!(s.span.end - s.span.start <= 100);
    }

    #[test]
    fn test_span_cap_respects_char_boundaries() {
        // Heading ends at byte 11, so a 100-byte cap lands mid-"é".
        let body = "é".repeat(200);
        let text = normalize(&format!("FINAL TERMS\n{body}"));
        let sections = locate(&text, 100);
        assert_eq!(sections.len(), 1);
        let s = &sections[0];
        assert!(text.text.is_char_boundary(s.span.end));
        // Slicing the span must not panic.
        let _ = &text.text[s.span.start..s.span.end];
    }

    #[test]
    fn test_heading_free_document_yields_no_sections() {
        let text = normalize("This prospectus relates to an issue of notes by the company.");
        assert!(locate(&text, 6000).is_empty());
    }

    #[test]
    fn test_inline_mention_is_not_a_heading() {
        let text = normalize("As described under the plan of distribution below, the notes are offered.");
        assert!(locate(&text, 6000).is_empty());
    }

    #[test]
    fn test_sections_for_prefers_distribution_for_banks() {
        let text = normalize("SUMMARY\nsome overview\nPLAN OF DISTRIBUTION\nmanagers here\nTERMS AND CONDITIONS\nrates here");
        let sections = locate(&text, 6000);
        let for_banks = sections_for(&sections, FieldKind::BankRole);
        assert_eq!(for_banks[0].kind, SectionKind::Distribution);
    }

    #[test]
    fn test_sections_in_document_order() {
        let text = normalize("THE OFFERING\noverview\nUNDERWRITING\nbanks\nFINAL TERMS\nnumbers");
        let sections = locate(&text, 6000);
        assert_eq!(sections.len(), 3);
        assert!(sections[0].span.start < sections[1].span.start);
        assert!(sections[1].span.start < sections[2].span.start);
    }

    #[test]
    fn test_section_page_number() {
        let text = normalize("cover page\u{0c}PLAN OF DISTRIBUTION\nmanagers listed here");
        let sections = locate(&text, 6000);
        assert_eq!(sections[0].span.page, 2);
    }
}
