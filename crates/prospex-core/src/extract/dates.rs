//! Date parsing for issue and maturity dates.
//!
//! Pattern captures arrive as heterogeneous literals ("15 March 2024",
//! "March 15, 2024", "15/03/2024", "2024-03-15"). Parsing normalizes
//! ordinal suffixes and commas, then tries formats in order; ambiguous
//! numeric dates are read day-first, matching the predominantly European
//! documents this runs against.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use super::{collect_cascade, resolve_required, FieldOutcome};
use crate::error::ExtractionError;
use crate::models::{EngineConfig, FieldKind};
use crate::patterns::PatternRegistry;
use crate::sections::Section;
use crate::text::NormalizedText;

lazy_static! {
    static ref ORDINAL: Regex = Regex::new(r"(\d)(?:st|nd|rd|th)\b").unwrap();
    // "Jan." style abbreviation periods; numeric separators stay intact.
    static ref MONTH_DOT: Regex = Regex::new(r"([A-Za-z])\.").unwrap();
}

/// Textual formats, tried after normalization. Day-first before
/// month-first.
const TEXT_FORMATS: &[&str] = &["%d %B %Y", "%d %b %Y", "%B %d %Y", "%b %d %Y"];

/// Numeric formats. Day-first before US ordering, four-digit years before
/// two-digit.
const NUMERIC_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%d/%m/%y",
    "%d.%m.%y",
];

/// Parse one captured date literal. `None` when nothing fits.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL.replace_all(raw.trim(), "$1");
    let cleaned = MONTH_DOT.replace_all(&cleaned, "$1");
    let cleaned = cleaned.replace(',', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for fmt in TEXT_FORMATS.iter().chain(NUMERIC_FORMATS) {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, fmt) {
            return Some(date);
        }
    }
    None
}

/// Extract one date field through the tier cascade.
///
/// Any parseable date is returned, including one outside the configured
/// year window; the validator flags those as `date_out_of_range` with the
/// value kept on the record.
pub fn extract(
    registry: &PatternRegistry,
    config: &EngineConfig,
    text: &NormalizedText,
    located: &[Section],
    field: FieldKind,
) -> Result<Option<FieldOutcome<NaiveDate>>, ExtractionError> {
    let matches = collect_cascade(registry, text, located, field);
    resolve_required(field, &matches, config.min_accept.dates, |m| {
        parse_date(&m.value)
    })
}
