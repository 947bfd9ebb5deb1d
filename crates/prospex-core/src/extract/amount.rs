//! Issue size and currency extraction.
//!
//! Size and currency are extracted jointly: the strongest evidence is a
//! currency token directly adjacent to the figure. A bare figure with no
//! adjacent token is only accepted when a currency appears within a short
//! context window around it, and then at reduced weight.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use super::{collect_cascade, resolve_required, FieldOutcome, RawMatch};
use crate::error::ExtractionError;
use crate::models::{EngineConfig, FieldKind};
use crate::patterns::PatternRegistry;
use crate::sections::Section;
use crate::text::{floor_char_boundary, NormalizedText};

/// A parsed issue size with its currency, if one was identified.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountValue {
    pub size: Decimal,
    pub currency: Option<String>,
}

lazy_static! {
    static ref CURRENCY_TOKEN: Regex = Regex::new(r"\b(EUR|USD|GBP|JPY|CHF|SEK|NOK|DKK|AUD|CAD|CNY|HKD|SGD|PLN|CZK|HUF)\b|[€$£¥]").unwrap();
    // Continental-style figures: dot-grouped thousands, comma decimal.
    static ref EURO_DECIMAL: Regex = Regex::new(r"^\d{1,3}(?:\.\d{3})*,\d{1,2}$").unwrap();
    static ref NAMED_GROUPS: Regex = Regex::new(
        r"(?x)
        (?:(?P<cur1>[A-Z]{3}|[€$£¥])\s*)?
        (?P<amt>\d[\d,.]*)
        (?:\s*(?P<mult>(?i:million|billion|bn|mn)))?
        (?:\s*(?P<cur2>[A-Z]{3}|[€$£¥]))?"
    )
    .unwrap();
}

/// Map a currency token to its ISO code.
pub fn normalize_currency(token: &str) -> Option<String> {
    let code = match token.trim() {
        "$" => "USD",
        "€" => "EUR",
        "£" => "GBP",
        "¥" => "JPY",
        t if t.len() == 3 && t.chars().all(|c| c.is_ascii_uppercase()) => t,
        _ => return None,
    };
    Some(code.to_string())
}

/// Parse a figure like "500,000,000", "1.5", or "1.000.000,50", applying
/// a word multiplier.
pub fn parse_figure(raw: &str, multiplier: Option<&str>) -> Option<Decimal> {
    let trimmed = raw.trim().trim_end_matches('.');
    let cleaned = if EURO_DECIMAL.is_match(trimmed) {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.replace(',', "")
    };
    let base: Decimal = cleaned.parse().ok()?;
    if base <= Decimal::ZERO {
        return None;
    }
    let scaled = match multiplier.map(|m| m.to_lowercase()) {
        Some(m) if m == "million" || m == "mn" => base * Decimal::from(1_000_000u64),
        Some(m) if m == "billion" || m == "bn" => base * Decimal::from(1_000_000_000u64),
        _ => base,
    };
    Some(scaled.normalize())
}

fn parse_match(m: &RawMatch, text: &NormalizedText, context_window: usize) -> Option<AmountValue> {
    // Re-run the joint shape over the matched text to pull the named
    // groups back out; pattern captures beyond the value group are not
    // carried on the raw match.
    let caps = NAMED_GROUPS.captures(&m.full)?;
    let amt = caps.name("amt")?;
    let mult = caps.name("mult").map(|g| g.as_str());
    let size = parse_figure(amt.as_str(), mult)?;

    let currency = caps
        .name("cur1")
        .or_else(|| caps.name("cur2"))
        .and_then(|g| normalize_currency(g.as_str()))
        .or_else(|| context_currency(text, m, context_window));

    Some(AmountValue { size, currency })
}

/// Look for a currency token within `window` bytes around the match.
fn context_currency(text: &NormalizedText, m: &RawMatch, window: usize) -> Option<String> {
    let start = m.span.start.saturating_sub(window);
    let end = (m.span.end + window).min(text.text.len());
    let start = floor_char_boundary(&text.text, start);
    let end = floor_char_boundary(&text.text, end);
    CURRENCY_TOKEN
        .find(&text.text[start..end])
        .and_then(|t| normalize_currency(t.as_str()))
}

/// Extract issue size and currency through the tier cascade.
pub fn extract(
    registry: &PatternRegistry,
    config: &EngineConfig,
    text: &NormalizedText,
    located: &[Section],
) -> Result<Option<FieldOutcome<AmountValue>>, ExtractionError> {
    let mut matches = collect_cascade(registry, text, located, FieldKind::IssueSize);

    // A bare figure backed by a currency in its context window earns
    // enough weight to clear the acceptance floor; without one it stays
    // below it and never becomes the primary value.
    let window = 50usize;
    for m in matches.iter_mut() {
        if m.weight < config.min_accept.amount
            && context_currency(text, m, window).is_some()
        {
            m.weight = 0.6;
        }
    }

    resolve_required(FieldKind::IssueSize, &matches, config.min_accept.amount, |m| {
        parse_match(m, text, window)
    })
}
