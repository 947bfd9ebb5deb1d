//! Pattern registry: match patterns as data, not code.
//!
//! Each pattern has an id, a field family, a tier tag, a compiled
//! expression, and the capture group holding the value. Patterns can be
//! tuned or replaced from a JSON file without touching extractor code, and
//! tests can target individual patterns by id.
//!
//! The registry is read-only after load and safe for unsynchronized
//! concurrent reads.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::models::{FieldKind, Tier};

/// Month-name alternation shared by the date expressions.
const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Oct|Nov|Dec";

/// A compiled, tagged match pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub id: String,
    pub field: FieldKind,
    pub tier: Tier,
    pub regex: Regex,
    /// Capture group holding the extracted value.
    pub value_group: usize,
    /// Specificity weight in [0, 1]; feeds field confidence and tier
    /// acceptance.
    pub weight: f64,
}

/// Serialized form of a pattern, as stored in a registry JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    pub id: String,
    pub field: FieldKind,
    pub tier: Tier,
    pub expr: String,
    #[serde(default = "default_group")]
    pub value_group: usize,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_group() -> usize {
    1
}

fn default_weight() -> f64 {
    1.0
}

/// Process-wide pattern table, keyed by (field, tier).
#[derive(Debug)]
pub struct PatternRegistry {
    by_key: HashMap<(FieldKind, Tier), Vec<Pattern>>,
}

impl PatternRegistry {
    /// Build the registry from the built-in pattern table.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_specs(default_specs())
    }

    /// Load the registry from a JSON file (an array of [`PatternSpec`]).
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let specs: Vec<PatternSpec> =
            serde_json::from_str(&content).map_err(|e| RegistryError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::from_specs(specs)
    }

    fn from_specs(specs: Vec<PatternSpec>) -> Result<Self, RegistryError> {
        let mut by_key: HashMap<(FieldKind, Tier), Vec<Pattern>> = HashMap::new();

        for spec in specs {
            let regex = Regex::new(&spec.expr).map_err(|source| RegistryError::BadPattern {
                id: spec.id.clone(),
                source,
            })?;
            if spec.value_group >= regex.captures_len() {
                return Err(RegistryError::BadGroup {
                    id: spec.id,
                    group: spec.value_group,
                });
            }
            by_key
                .entry((spec.field, spec.tier))
                .or_default()
                .push(Pattern {
                    id: spec.id,
                    field: spec.field,
                    tier: spec.tier,
                    regex,
                    value_group: spec.value_group,
                    weight: spec.weight,
                });
        }

        for field in [
            FieldKind::Issuer,
            FieldKind::BankRole,
            FieldKind::IssueDate,
            FieldKind::MaturityDate,
            FieldKind::IssueSize,
            FieldKind::Coupon,
        ] {
            if !by_key.keys().any(|(f, _)| *f == field) {
                return Err(RegistryError::EmptyField {
                    field: field.as_str().to_string(),
                });
            }
        }

        Ok(Self { by_key })
    }

    /// Patterns for a field at a tier, in registration order.
    ///
    /// The section-tier list doubles as the document-tier list unless a
    /// document- or contextual-specific list was registered: the cascade
    /// runs the same patterns wider, it does not need new ones.
    pub fn patterns_for(&self, field: FieldKind, tier: Tier) -> &[Pattern] {
        if let Some(patterns) = self.by_key.get(&(field, tier)) {
            return patterns;
        }
        if tier != Tier::Section {
            if let Some(patterns) = self.by_key.get(&(field, Tier::Section)) {
                return patterns;
            }
        }
        &[]
    }

    /// Look up a single pattern by id (test and diagnostics helper).
    pub fn pattern(&self, id: &str) -> Option<&Pattern> {
        self.by_key.values().flatten().find(|p| p.id == id)
    }
}

/// A date literal in any of the accepted formats.
fn date_expr() -> String {
    format!(
        r"\d{{1,2}}[./-]\d{{1,2}}[./-]\d{{2,4}}|\d{{4}}-\d{{1,2}}-\d{{1,2}}|\d{{1,2}}(?:st|nd|rd|th)?\s+(?:{m})\.?,?\s+\d{{4}}|(?:{m})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}",
        m = MONTHS
    )
}

fn spec(
    id: &str,
    field: FieldKind,
    tier: Tier,
    expr: String,
    value_group: usize,
    weight: f64,
) -> PatternSpec {
    PatternSpec {
        id: id.to_string(),
        field,
        tier,
        expr,
        value_group,
        weight,
    }
}

/// The built-in pattern table.
fn default_specs() -> Vec<PatternSpec> {
    use FieldKind::*;
    use Tier::*;

    let date = date_expr();
    // Case-sensitive even inside (?i) patterns: "EUR" is a currency,
    // "the" is not.
    let currency = r"(?-i:[A-Z]{3})|[€$£¥]";
    let amount = r"\d[\d,.]*";

    vec![
        // Issuer
        spec(
            "issuer_labeled",
            Issuer,
            Section,
            r"(?i)\bissuer\s*[:\-]\s*([A-Z][^\n;]{2,80})".into(),
            1,
            1.0,
        ),
        spec(
            "issuer_name_of",
            Issuer,
            Section,
            r"(?i)\bname\s+of\s+(?:the\s+)?issuer\s*[:\-]?\s*([A-Z][^\n;]{2,80})".into(),
            1,
            1.0,
        ),
        spec(
            "issuer_issued_by",
            Issuer,
            Section,
            r"(?i)\bissued\s+by\s+([A-Z][A-Za-z0-9 .,&'()-]{2,80}?)(?:\s+under|\s+pursuant|[\n;])".into(),
            1,
            0.8,
        ),
        // Issue date
        spec(
            "issue_date_labeled",
            IssueDate,
            Section,
            format!(
                r"(?i)(?:issue\s+date|date\s+of\s+issue|issuance\s+date)\s*[:\-]?\s*(?:on\s+)?({date})"
            ),
            1,
            1.0,
        ),
        spec(
            "issue_date_prose",
            IssueDate,
            Section,
            format!(
                r"(?i)(?:date\s+of\s+)?(?:initial\s+)?issu(?:e|ance)\s+(?:of\s+the\s+notes\s+)?(?:is|will\s+be)\s+(?:on\s+)?({date})"
            ),
            1,
            0.8,
        ),
        spec(
            "issue_date_dated",
            IssueDate,
            Section,
            format!(r"(?i)(?:final\s+terms|prospectus|supplement)\s+dated\s+({date})"),
            1,
            0.6,
        ),
        // Maturity date
        spec(
            "maturity_labeled",
            MaturityDate,
            Section,
            format!(
                r"(?i)(?:maturity\s+date|final\s+maturity|redemption\s+date)\s*[:\-]?\s*(?:on\s+)?({date})"
            ),
            1,
            1.0,
        ),
        spec(
            "maturity_mature",
            MaturityDate,
            Section,
            format!(r"(?i)(?:will\s+mature|matures|to\s+mature)\s+(?:on|at)\s+({date})"),
            1,
            0.9,
        ),
        spec(
            "maturity_due",
            MaturityDate,
            Section,
            format!(r"(?i)notes?\s+(?:maturing|due)\s+(?:on\s+|in\s+)?({date})"),
            1,
            0.7,
        ),
        // Issue size / currency (joint capture via named groups)
        spec(
            "size_labeled",
            IssueSize,
            Section,
            format!(
                r"(?i)(?:aggregate\s+(?:nominal\s+|principal\s+)?amount|(?:total\s+)?(?:issue|principal)\s+(?:size|amount)|series\s+amount)(?:\s+of\s+(?:the\s+)?(?:notes|securities|bonds))?\s*[:\-]?\s*(?:up\s+to\s+)?(?P<cur>{currency})\s*(?P<amt>{amount})(?:\s*(?P<mult>million|billion|bn|mn))?"
            ),
            2,
            1.0,
        ),
        spec(
            "size_issue_of",
            IssueSize,
            Section,
            format!(
                r"(?i)issu(?:e|ance)\s+of\s+(?P<cur>{currency})\s*(?P<amt>{amount})(?:\s*(?P<mult>million|billion|bn|mn))?"
            ),
            2,
            0.8,
        ),
        spec(
            "size_inverted",
            IssueSize,
            Section,
            format!(
                r"(?i)(?P<amt>{amount})(?:\s*(?P<mult>million|billion|bn|mn))?\s*(?P<cur>{currency})\s+(?:in\s+)?aggregate\s+(?:nominal\s+|principal\s+)?amount"
            ),
            1,
            0.9,
        ),
        spec(
            "size_bare_number",
            IssueSize,
            Section,
            format!(
                r"(?i)(?:nominal|principal)\s+amount\s*[:\-]?\s*(?P<amt>{amount})(?:\s*(?P<mult>million|billion|bn|mn))?"
            ),
            1,
            0.4,
        ),
        // Coupon
        spec(
            "coupon_labeled",
            Coupon,
            Section,
            r"(?i)(?:interest\s+rate|coupon\s+rate|rate\s+of\s+interest|fixed\s+rate|coupon|interest)\s*[:\-]?\s*(?:of\s+)?(\d+(?:\.\d+)?)\s*(?:per\s*cent\.?|%)".into(),
            1,
            1.0,
        ),
        spec(
            "coupon_postfix",
            Coupon,
            Section,
            r"(?i)(\d+(?:\.\d+)?)\s*(?:per\s*cent\.?|%)\s+(?:fixed\s+)?(?:rate\s+)?(?:notes|bonds|interest|coupon)".into(),
            1,
            0.9,
        ),
        spec(
            "coupon_prose",
            Coupon,
            Section,
            r"(?i)(?:bear(?:s|ing)?\s+interest\s+at|pays|carries|offering)\s+(?:a\s+)?(?:fixed\s+)?(?:rate\s+)?(?:of\s+)?(\d+(?:\.\d+)?)\s*(?:per\s*cent\.?|%)".into(),
            1,
            0.8,
        ),
        spec(
            "coupon_float_margin",
            Coupon,
            Section,
            r"(?i)(?:EURIBOR|LIBOR|SONIA|SOFR|ESTR|€STR)\s*(?:\+|plus)\s*(\d+(?:\.\d+)?)\s*(?:per\s*cent\.?|%)".into(),
            1,
            0.9,
        ),
        // Bank role anchors. The bank extractor harvests names from the
        // window after each anchor; the matched keyword classifies the role.
        spec(
            "role_lead_managers",
            BankRole,
            Section,
            r"(?i)\b(?:joint\s+)?lead\s+managers?\b".into(),
            0,
            1.0,
        ),
        spec(
            "role_bookrunners",
            BankRole,
            Section,
            r"(?i)\b(?:joint\s+)?(?:active\s+)?book[-\s]?runners?\b".into(),
            0,
            1.0,
        ),
        spec(
            "role_underwriters",
            BankRole,
            Section,
            r"(?i)\b(?:underwriters?|initial\s+purchasers?)\b".into(),
            0,
            1.0,
        ),
        spec(
            "role_stabilisation",
            BankRole,
            Section,
            r"(?i)\bstabili[sz](?:ation|ing)\s+managers?\b".into(),
            0,
            1.0,
        ),
        spec(
            "role_generic",
            BankRole,
            Section,
            r"(?i)\b(?:global\s+coordinators?|co[-\s]?managers?|managers?|dealers?|arrangers?)\b".into(),
            0,
            0.6,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_compiles() {
        let registry = PatternRegistry::builtin().unwrap();
        assert!(!registry.patterns_for(FieldKind::Coupon, Tier::Section).is_empty());
    }

    #[test]
    fn test_document_tier_falls_back_to_section_list() {
        let registry = PatternRegistry::builtin().unwrap();
        let section = registry.patterns_for(FieldKind::IssueDate, Tier::Section);
        let document = registry.patterns_for(FieldKind::IssueDate, Tier::Document);
        assert_eq!(section.len(), document.len());
    }

    #[test]
    fn test_pattern_by_id() {
        let registry = PatternRegistry::builtin().unwrap();
        let p = registry.pattern("size_labeled").unwrap();
        let caps = p
            .regex
            .captures("Aggregate Nominal Amount: EUR 500,000,000")
            .unwrap();
        assert_eq!(caps.name("cur").unwrap().as_str(), "EUR");
        assert_eq!(caps.name("amt").unwrap().as_str(), "500,000,000");
    }

    #[test]
    fn test_issue_date_pattern_matches_long_form() {
        let registry = PatternRegistry::builtin().unwrap();
        let p = registry.pattern("issue_date_labeled").unwrap();
        let caps = p.regex.captures("Issue Date: 15 March 2024").unwrap();
        assert_eq!(&caps[1], "15 March 2024");
    }

    #[test]
    fn test_float_margin_pattern() {
        let registry = PatternRegistry::builtin().unwrap();
        let p = registry.pattern("coupon_float_margin").unwrap();
        let caps = p.regex.captures("3-month EURIBOR + 1.5%").unwrap();
        assert_eq!(&caps[1], "1.5");
    }

    #[test]
    fn test_bad_pattern_is_fatal() {
        let specs = vec![PatternSpec {
            id: "broken".into(),
            field: FieldKind::Coupon,
            tier: Tier::Section,
            expr: "(unclosed".into(),
            value_group: 1,
            weight: 1.0,
        }];
        assert!(PatternRegistry::from_specs(specs).is_err());
    }

    #[test]
    fn test_bad_group_is_fatal() {
        let specs = vec![PatternSpec {
            id: "nogroup".into(),
            field: FieldKind::Coupon,
            tier: Tier::Section,
            expr: r"\d+%".into(),
            value_group: 1,
            weight: 1.0,
        }];
        assert!(matches!(
            PatternRegistry::from_specs(specs),
            Err(RegistryError::BadGroup { .. })
        ));
    }
}
