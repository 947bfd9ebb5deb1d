//! Field extractors.
//!
//! Each extractor runs the tier cascade for one field family: section
//! spans first, whole document second, and (for banks) a contextual
//! keyword scan last. A tier that produces an acceptable match stops the
//! cascade; weaker matches are kept as alternates for diagnostics.

pub mod amount;
pub mod banks;
pub mod coupon;
pub mod dates;

use crate::error::ExtractionError;
use crate::models::{FieldKind, Span, Tier};
use crate::patterns::PatternRegistry;
use crate::sections::{self, Section};
use crate::text::NormalizedText;

/// One raw pattern hit, before parsing and plausibility checks.
#[derive(Debug, Clone)]
pub struct RawMatch {
    pub field: FieldKind,
    /// Text of the value capture group.
    pub value: String,
    /// Full match, used for context lookups around the hit.
    pub full: String,
    pub span: Span,
    pub tier: Tier,
    pub pattern_id: String,
    pub weight: f64,
}

/// The accepted result of a cascade, plus how it was found.
#[derive(Debug, Clone)]
pub struct FieldOutcome<T> {
    pub value: T,
    pub tier: Tier,
    pub pattern_id: String,
    pub weight: f64,
    pub page: usize,
}

impl<T> FieldOutcome<T> {
    /// Field confidence: tier base scaled by pattern specificity.
    pub fn confidence(&self) -> f64 {
        self.tier.base_confidence() * self.weight
    }
}

/// Run a field's patterns over one region of the normalized text.
pub fn collect_in_region(
    registry: &PatternRegistry,
    text: &NormalizedText,
    field: FieldKind,
    tier: Tier,
    region: Span,
) -> Vec<RawMatch> {
    let slice = &text.text[region.start..region.end];
    let mut out = Vec::new();

    for pattern in registry.patterns_for(field, tier) {
        for caps in pattern.regex.captures_iter(slice) {
            let value = match caps.get(pattern.value_group) {
                Some(m) => m.as_str().to_string(),
                None => continue,
            };
            let full = caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
            let (start, end) = caps
                .get(0)
                .map(|m| (region.start + m.start(), region.start + m.end()))
                .unwrap_or((region.start, region.start));
            out.push(RawMatch {
                field,
                value,
                full,
                span: Span {
                    start,
                    end,
                    page: text.page_at(start),
                },
                tier,
                pattern_id: pattern.id.clone(),
                weight: pattern.weight,
            });
        }
    }

    out
}

/// Run the section tier over the field's relevant sections, then the
/// document tier over everything.
pub fn collect_cascade(
    registry: &PatternRegistry,
    text: &NormalizedText,
    located: &[Section],
    field: FieldKind,
) -> Vec<RawMatch> {
    let mut matches = Vec::new();

    for section in sections::sections_for(located, field) {
        matches.extend(collect_in_region(
            registry,
            text,
            field,
            Tier::Section,
            section.span,
        ));
    }

    matches.extend(collect_in_region(
        registry,
        text,
        field,
        Tier::Document,
        Span {
            start: 0,
            end: text.text.len(),
            page: 1,
        },
    ));

    matches
}

/// Pick the best acceptable match at the earliest tier that has one.
///
/// `parse` turns a raw match into a typed value, rejecting implausible
/// hits by returning `None`. Within a tier the highest pattern weight
/// wins; earlier document position breaks ties.
pub fn resolve<T, F>(matches: &[RawMatch], min_weight: f64, mut parse: F) -> Option<FieldOutcome<T>>
where
    F: FnMut(&RawMatch) -> Option<T>,
{
    for tier in [Tier::Section, Tier::Document, Tier::Contextual] {
        let mut best: Option<(&RawMatch, T)> = None;
        for m in matches.iter().filter(|m| m.tier == tier) {
            if m.weight < min_weight {
                continue;
            }
            let better = match &best {
                Some((b, _)) => {
                    m.weight > b.weight || (m.weight == b.weight && m.span.start < b.span.start)
                }
                None => true,
            };
            if better {
                if let Some(value) = parse(m) {
                    best = Some((m, value));
                }
            }
        }
        if let Some((m, value)) = best {
            return Some(FieldOutcome {
                value,
                tier: m.tier,
                pattern_id: m.pattern_id.clone(),
                weight: m.weight,
                page: m.span.page,
            });
        }
    }
    None
}

/// Like [`resolve`], but distinguishes "nothing matched" from "matches
/// existed and none parsed". The latter is a field error the engine
/// reports on the record instead of silently yielding null.
pub fn resolve_required<T, F>(
    field: FieldKind,
    matches: &[RawMatch],
    min_weight: f64,
    parse: F,
) -> Result<Option<FieldOutcome<T>>, ExtractionError>
where
    F: FnMut(&RawMatch) -> Option<T>,
{
    let eligible = matches.iter().filter(|m| m.weight >= min_weight).count();
    match resolve(matches, min_weight, parse) {
        Some(outcome) => Ok(Some(outcome)),
        None if eligible == 0 => Ok(None),
        None => Err(ExtractionError::Field {
            field: field.as_str().to_string(),
            reason: format!("{eligible} pattern match(es), none plausible"),
        }),
    }
}
