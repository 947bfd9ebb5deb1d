//! Bank and role extraction.
//!
//! Banks are named in lists introduced by role keywords ("Joint Lead
//! Managers:", "the Bookrunners"). The extractor anchors on those
//! keywords, reads a bounded window after each anchor, splits it into
//! candidate names, and keeps the ones that look like institutions. The
//! contextual tier relaxes the list shape and harvests capitalized
//! name runs near the anchors instead; it only runs when the pattern
//! tiers find nothing.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use super::collect_in_region;
use crate::models::{BankMention, BankRole, EngineConfig, FieldKind, Span, Tier};
use crate::patterns::PatternRegistry;
use crate::sections::{self, Section};
use crate::text::{floor_char_boundary, NormalizedText};

lazy_static! {
    // List delimiters within a role window. "and" only between names.
    static ref NAME_DELIMITER: Regex = Regex::new(r",|;|\n|•|\band\b|\bas\s+well\s+as\b").unwrap();

    // A run of capitalized words (with institution punctuation). List
    // parts and contextual windows both reduce to their leading run, so a
    // following sentence never rides along into a name.
    static ref PROPER_RUN: Regex = Regex::new(
        r"\b[A-Z][A-Za-zÀ-ÿ&.'-]*(?:\s+(?:[A-Z][A-Za-zÀ-ÿ&.'-]*|&|of|de|der))*"
    )
    .unwrap();

    // Words that disqualify a candidate outright.
    static ref INVALID_TERMS: HashSet<&'static str> = [
        "notes", "bonds", "securities", "issuer", "guarantor", "prospectus",
        "supplement", "pursuant", "prospective", "investors", "subscription",
        "stabilisation", "stabilization", "offering", "aggregate", "amount",
        "interest", "maturity", "herein", "hereof", "agreement", "section",
        "paragraph", "regulation", "directive", "article", "listing",
        "applicable", "redemption", "denominations", "clearing", "none",
        "manager", "managers", "bookrunner", "bookrunners", "underwriter",
        "underwriters", "dealer", "dealers", "arranger", "arrangers",
        "coordinator", "coordinators", "purchasers", "joint",
    ]
    .into_iter()
    .collect();

    // Suffixes marking a legal entity.
    static ref LEGAL_SUFFIX: Regex = Regex::new(
        r"(?i)\b(?:AG|PLC|plc|Ltd\.?|Limited|LLC|LLP|Inc\.?|SE|S\.?A\.?|N\.?V\.?|S\.?p\.?A\.?|GmbH|KGaA|Co\.?|& Co\.?)\s*$"
    )
    .unwrap();

    // Institution words anywhere in the name.
    static ref BANK_WORD: Regex = Regex::new(
        r"(?i)\b(?:bank|banque|banca|banco|bankers|capital|securities|markets|financial|invest(?:ment)?s?|partners|credit|crédit)\b"
    )
    .unwrap();

    static ref ACRONYM: Regex = Regex::new(r"^[A-Z]{2,6}$").unwrap();
}

/// Heuristic filter: does this token plausibly name a financial
/// institution?
pub fn is_plausible_bank_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.len() < 3 || trimmed.len() > 80 {
        return false;
    }
    if !trimmed.chars().next().is_some_and(|c| c.is_uppercase()) {
        return false;
    }
    let lower = trimmed.to_lowercase();
    if lower
        .split_whitespace()
        .any(|w| INVALID_TERMS.contains(w.trim_matches(|c: char| !c.is_alphanumeric())))
    {
        return false;
    }
    if trimmed.chars().filter(|c| c.is_numeric()).count() > 2 {
        return false;
    }

    if ACRONYM.is_match(trimmed) {
        return true;
    }
    if LEGAL_SUFFIX.is_match(trimmed) || BANK_WORD.is_match(trimmed) {
        return true;
    }
    // "Goldman Sachs", "Morgan Stanley": several capitalized words.
    let cap_words = trimmed
        .split_whitespace()
        .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
        .count();
    cap_words >= 2
}

/// Connector words that lead into a name list but are not part of a name.
const CONNECTORS: &[&str] = &[
    "the", "are", "is", "was", "were", "will", "be", "by", "of", "as", "include", "includes",
    "including", "acting", "each", "with", "together",
];

/// Trim list-artifact characters and leading connector words off a
/// candidate.
fn trim_candidate(raw: &str) -> &str {
    let mut t = raw
        .trim()
        .trim_matches(|c: char| {
            c == ':' || c == '-' || c == '–' || c == '(' || c == ')' || c == '"'
        })
        .trim();
    loop {
        let Some(first) = t.split_whitespace().next() else {
            break;
        };
        if CONNECTORS.contains(&first.to_lowercase().as_str()) {
            t = t[first.len()..].trim_start();
        } else {
            break;
        }
    }
    loop {
        let Some(last) = t.split_whitespace().last() else {
            break;
        };
        if CONNECTORS.contains(&last.to_lowercase().as_str()) {
            t = t[..t.len() - last.len()].trim_end();
        } else {
            break;
        }
    }
    t
}

/// Split a role window into candidate names and keep the plausible ones.
fn harvest_window(
    text: &NormalizedText,
    window: Span,
    role: BankRole,
    tier: Tier,
    out: &mut Vec<BankMention>,
) {
    let slice = &text.text[window.start..window.end];
    // A blank line ends the list.
    let slice = slice.split("\n\n").next().unwrap_or(slice);

    for part in NAME_DELIMITER.split(slice) {
        let offset = part.as_ptr() as usize - slice.as_ptr() as usize;
        let stripped = trim_candidate(part);
        // Keep only the leading capitalized run; prose following an
        // unsegmented list entry is not part of the name.
        let Some(run) = PROPER_RUN.find(stripped).filter(|m| m.start() == 0) else {
            continue;
        };
        let candidate = trim_candidate(run.as_str());
        if candidate.is_empty() || !is_plausible_bank_name(candidate) {
            continue;
        }
        let start = window.start + offset;
        out.push(BankMention {
            raw: candidate.to_string(),
            role,
            span: Span {
                start,
                end: start + part.len(),
                page: text.page_at(start),
            },
            tier,
        });
    }
}

/// Collect role anchors in a region, keeping only the most specific
/// anchor where matches overlap ("Joint Lead Managers" beats the generic
/// "Managers" inside it).
fn role_anchors(
    registry: &PatternRegistry,
    text: &NormalizedText,
    region: Span,
    tier: Tier,
) -> Vec<super::RawMatch> {
    let mut anchors = collect_in_region(registry, text, FieldKind::BankRole, tier, region);
    anchors.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (b.span.end - b.span.start).cmp(&(a.span.end - a.span.start)))
            .then_with(|| a.span.start.cmp(&b.span.start))
    });
    let mut kept: Vec<super::RawMatch> = Vec::new();
    for anchor in anchors {
        let overlaps = kept
            .iter()
            .any(|k| anchor.span.start < k.span.end && k.span.start < anchor.span.end);
        if !overlaps {
            kept.push(anchor);
        }
    }
    kept.sort_by_key(|a| a.span.start);
    kept
}

/// Run the anchor patterns over one region and harvest each anchor's
/// trailing window.
fn mentions_in_region(
    registry: &PatternRegistry,
    config: &EngineConfig,
    text: &NormalizedText,
    region: Span,
    tier: Tier,
) -> Vec<BankMention> {
    let mut out = Vec::new();
    let anchors = role_anchors(registry, text, region, tier);
    for (i, anchor) in anchors.iter().enumerate() {
        let role = BankRole::from_keyword(&anchor.full);
        let start = anchor.span.end;
        // The list belonging to one role ends where the next role begins.
        let limit = anchors
            .get(i + 1)
            .map(|next| next.span.start)
            .unwrap_or(region.end);
        let end = floor_char_boundary(&text.text, (start + config.role_window).min(limit));
        if start >= end {
            continue;
        }
        harvest_window(
            text,
            Span {
                start,
                end,
                page: text.page_at(start),
            },
            role,
            tier,
            &mut out,
        );
    }
    out
}

/// Contextual harvesting: capitalized runs near role keywords, no list
/// shape assumed.
fn contextual_mentions(
    registry: &PatternRegistry,
    config: &EngineConfig,
    text: &NormalizedText,
) -> Vec<BankMention> {
    let whole = Span {
        start: 0,
        end: text.text.len(),
        page: 1,
    };
    let mut out = Vec::new();
    for anchor in role_anchors(registry, text, whole, Tier::Contextual) {
        let role = BankRole::from_keyword(&anchor.full);
        let start =
            floor_char_boundary(&text.text, anchor.span.start.saturating_sub(config.context_window));
        let end = floor_char_boundary(
            &text.text,
            (anchor.span.end + config.context_window).min(text.text.len()),
        );
        let slice = &text.text[start..end];
        for m in PROPER_RUN.find_iter(slice) {
            let candidate = trim_candidate(m.as_str());
            if !is_plausible_bank_name(candidate) {
                continue;
            }
            let at = start + m.start();
            out.push(BankMention {
                raw: candidate.to_string(),
                role,
                span: Span {
                    start: at,
                    end: at + m.as_str().len(),
                    page: text.page_at(at),
                },
                tier: Tier::Contextual,
            });
        }
    }
    out
}

/// Extract bank mentions through the tier cascade.
///
/// Section-anchored lists win; failing that, document-wide anchored
/// lists; failing that, contextual proper-noun harvesting. Duplicate
/// (name, role) pairs within a tier collapse to the first occurrence.
pub fn extract(
    registry: &PatternRegistry,
    config: &EngineConfig,
    text: &NormalizedText,
    located: &[Section],
) -> Vec<BankMention> {
    let mut mentions = Vec::new();
    for section in sections::sections_for(located, FieldKind::BankRole) {
        mentions.extend(mentions_in_region(
            registry,
            config,
            text,
            section.span,
            Tier::Section,
        ));
    }

    if mentions.is_empty() {
        let whole = Span {
            start: 0,
            end: text.text.len(),
            page: 1,
        };
        mentions = mentions_in_region(registry, config, text, whole, Tier::Document);
    }

    if mentions.is_empty() {
        mentions = contextual_mentions(registry, config, text);
    }

    let mut seen = HashSet::new();
    mentions.retain(|m| seen.insert((m.raw.to_lowercase(), m.role)));
    mentions
}
