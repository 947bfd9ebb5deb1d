//! Coupon rate extraction.
//!
//! Rates are normalized to a percentage figure regardless of how the text
//! writes them ("3.5%", "3.5 per cent.", "EURIBOR + 1.5%"). Zero-coupon
//! notes yield an explicit rate of zero rather than a missing field, and
//! floating-rate structures are surfaced so the validator can annotate
//! the record.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use super::{collect_cascade, resolve_required, FieldOutcome};
use crate::error::ExtractionError;
use crate::models::{EngineConfig, FieldKind, Tier};
use crate::patterns::PatternRegistry;
use crate::sections::Section;
use crate::text::NormalizedText;

/// Rates outside this band are treated as pattern noise, not coupons.
const MAX_PLAUSIBLE_RATE: i64 = 20;

lazy_static! {
    static ref ZERO_COUPON: Regex =
        Regex::new(r"(?i)\bzero[-\s]coupon\b|\bdo(?:es)?\s+not\s+bear\s+interest\b").unwrap();
    static ref FLOATING: Regex = Regex::new(
        r"(?i)\bfloating[-\s]rate\b|\b(?:EURIBOR|LIBOR|SONIA|SOFR|ESTR|€STR)\b|\breset\s+rate\b"
    )
    .unwrap();
}

/// A coupon figure with its structure classification.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponValue {
    /// Percentage rate; the margin over the reference rate for floaters.
    pub rate: Decimal,
    /// True for floating-rate structures.
    pub floating: bool,
}

/// Parse one captured rate literal, rejecting implausible figures.
pub fn parse_rate(raw: &str) -> Option<Decimal> {
    let rate: Decimal = raw.trim().parse().ok()?;
    (rate >= Decimal::ZERO && rate <= Decimal::from(MAX_PLAUSIBLE_RATE)).then_some(rate)
}

/// True when the text describes a floating-rate structure.
pub fn is_floating(text: &NormalizedText) -> bool {
    FLOATING.is_match(&text.text)
}

/// Extract the coupon through the tier cascade.
pub fn extract(
    registry: &PatternRegistry,
    config: &EngineConfig,
    text: &NormalizedText,
    located: &[Section],
) -> Result<Option<FieldOutcome<CouponValue>>, ExtractionError> {
    let floating = is_floating(text);

    let matches = collect_cascade(registry, text, located, FieldKind::Coupon);
    let outcome = resolve_required(FieldKind::Coupon, &matches, config.min_accept.coupon, |m| {
        parse_rate(&m.value).map(|rate| CouponValue {
            rate,
            floating: floating || m.pattern_id == "coupon_float_margin",
        })
    })?;

    if outcome.is_some() {
        return Ok(outcome);
    }

    // No explicit figure: a stated zero-coupon structure is still a rate.
    Ok(ZERO_COUPON.find(&text.text).map(|m| FieldOutcome {
        value: CouponValue {
            rate: Decimal::ZERO,
            floating: false,
        },
        tier: Tier::Document,
        pattern_id: "coupon_zero".to_string(),
        weight: 1.0,
        page: text.page_at(m.start()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_rate_band() {
        assert_eq!(parse_rate("3.5"), Some(dec("3.5")));
        assert_eq!(parse_rate("0"), Some(dec("0")));
        assert_eq!(parse_rate("20"), Some(dec("20")));
        assert_eq!(parse_rate("21"), None);
        assert_eq!(parse_rate("2024"), None);
    }

    #[test]
    fn test_extract_per_cent_form() {
        let registry = PatternRegistry::builtin().unwrap();
        let config = EngineConfig::default();
        let text = normalize("The notes bear interest at 3.875 per cent. per annum.");
        let outcome = extract(&registry, &config, &text, &[]).unwrap().unwrap();
        assert_eq!(outcome.value.rate, dec("3.875"));
        assert!(!outcome.value.floating);
    }

    #[test]
    fn test_extract_postfix_form() {
        let registry = PatternRegistry::builtin().unwrap();
        let config = EngineConfig::default();
        let text = normalize("an offering of 4.25% Notes due 2030");
        let outcome = extract(&registry, &config, &text, &[]).unwrap().unwrap();
        assert_eq!(outcome.value.rate, dec("4.25"));
    }

    #[test]
    fn test_extract_floating_margin() {
        let registry = PatternRegistry::builtin().unwrap();
        let config = EngineConfig::default();
        let text = normalize("Interest: three-month EURIBOR + 1.5% per annum");
        let outcome = extract(&registry, &config, &text, &[]).unwrap().unwrap();
        assert_eq!(outcome.value.rate, dec("1.5"));
        assert!(outcome.value.floating);
    }

    #[test]
    fn test_extract_zero_coupon() {
        let registry = PatternRegistry::builtin().unwrap();
        let config = EngineConfig::default();
        let text = normalize("The notes are zero-coupon and will not pay periodic interest.");
        let outcome = extract(&registry, &config, &text, &[]).unwrap().unwrap();
        assert_eq!(outcome.value.rate, Decimal::ZERO);
        assert_eq!(outcome.pattern_id, "coupon_zero");
    }

    #[test]
    fn test_implausible_rate_is_a_field_error() {
        let registry = PatternRegistry::builtin().unwrap();
        let config = EngineConfig::default();
        let text = normalize("interest rate: 99% as a typographical artefact");
        assert!(extract(&registry, &config, &text, &[]).is_err());
    }

    #[test]
    fn test_absent_coupon_is_none() {
        let registry = PatternRegistry::builtin().unwrap();
        let config = EngineConfig::default();
        let text = normalize("No interest language appears here.");
        assert!(extract(&registry, &config, &text, &[]).unwrap().is_none());
    }
}
