//! Record types produced by the extraction engine.
//!
//! A [`Document`] goes in, an [`ExtractionRecord`] comes out. Everything in
//! between (`Span`, `BankMention`, raw matches) is created and discarded
//! within one extraction call.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An input document. Immutable; the engine never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Caller-assigned identifier (e.g. a filename or ISIN).
    pub id: String,

    /// Raw document text. Form-feed characters are treated as page breaks.
    pub text: String,

    /// Source path or URL, carried through as provenance only.
    pub source: Option<String>,
}

impl Document {
    /// Create a document from an id and raw text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source: None,
        }
    }

    /// Attach a source path or URL.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A contiguous text region within one normalized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start offset (bytes into the normalized text).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// 1-based page number the span starts on.
    pub page: usize,
}

/// One strategy level in the extraction fallback cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Patterns run only within located section spans.
    Section,
    /// Patterns run against the whole normalized text.
    Document,
    /// Role-keyword anchor scan with proper-noun harvesting (banks only).
    Contextual,
}

impl Tier {
    /// Base confidence contributed by the tier a value was found at.
    pub fn base_confidence(&self) -> f64 {
        match self {
            Tier::Section => 1.0,
            Tier::Document => 0.85,
            Tier::Contextual => 0.6,
        }
    }
}

/// Field families the pattern registry and extractors are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Issuer,
    BankRole,
    IssueDate,
    MaturityDate,
    IssueSize,
    Coupon,
}

impl FieldKind {
    /// Stable key used in confidence maps and provenance entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Issuer => "issuer",
            FieldKind::BankRole => "banks",
            FieldKind::IssueDate => "issue_date",
            FieldKind::MaturityDate => "maturity_date",
            FieldKind::IssueSize => "issue_size",
            FieldKind::Coupon => "coupon_rate",
        }
    }
}

/// Role a bank plays in the issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankRole {
    LeadManager,
    Bookrunner,
    Underwriter,
    StabilisationManager,
    Other,
}

impl BankRole {
    /// Classify a role from the keyword text that introduced it.
    pub fn from_keyword(keyword: &str) -> Self {
        let k = keyword.to_lowercase();
        if k.contains("lead manager") {
            BankRole::LeadManager
        } else if k.contains("bookrunner") || k.contains("book runner") || k.contains("book-runner")
        {
            BankRole::Bookrunner
        } else if k.contains("underwriter") || k.contains("initial purchaser") {
            BankRole::Underwriter
        } else if k.contains("stabilis") || k.contains("stabiliz") {
            BankRole::StabilisationManager
        } else {
            BankRole::Other
        }
    }
}

/// A raw bank mention found by the bank/role extractor. Transient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankMention {
    /// Name exactly as it appeared in the text (after token trimming).
    pub raw: String,
    /// Role associated with the list the name appeared in.
    pub role: BankRole,
    /// Where the mention was found.
    pub span: Span,
    /// Tier that produced it.
    pub tier: Tier,
}

/// How a raw bank name was matched against the alias registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Fuzzy,
    None,
}

/// A bank name after standardization. Derived 1:1 from a [`BankMention`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedBank {
    /// The raw extracted name, preserved unmodified.
    pub raw_name: String,
    /// Canonical name, or `None` when no alias matched at the threshold.
    pub standard_name: Option<String>,
    /// Match confidence in [0, 1].
    pub confidence: f64,
    /// How the match was made.
    pub match_type: MatchType,
}

/// One (bank, role) entry in the final record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankEntry {
    pub bank: StandardizedBank,
    pub role: BankRole,
}

/// Provenance for one populated field: which pattern won, at which tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub field: String,
    pub pattern_id: String,
    pub tier: Tier,
    pub page: usize,
}

/// The final, externally visible output of one extraction call.
///
/// Every omitted field serializes as an explicit `null` (never absent), and
/// every populated field has an entry in `confidence`, so downstream
/// consumers can distinguish "not found" from "not attempted". Missing
/// fields carry a confidence of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub document_id: String,
    pub source: Option<String>,
    pub issuer: Option<String>,
    pub banks: Vec<BankEntry>,
    pub issue_size: Option<Decimal>,
    pub currency: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub maturity_date: Option<NaiveDate>,
    pub coupon_rate: Option<Decimal>,
    /// Per-field confidence, keyed by [`FieldKind::as_str`] names plus
    /// `currency`. Ordered map so serialization is byte-stable.
    pub confidence: BTreeMap<String, f64>,
    /// Winning pattern per populated field, in field order.
    pub provenance: Vec<Provenance>,
    /// Plausibility annotations, in validator order. Never removes data.
    pub validation_flags: Vec<String>,
}

impl ExtractionRecord {
    /// An all-null record for a document, with zero confidences.
    pub fn empty(document_id: impl Into<String>, source: Option<String>) -> Self {
        let mut confidence = BTreeMap::new();
        for key in [
            "issuer",
            "banks",
            "issue_size",
            "currency",
            "issue_date",
            "maturity_date",
            "coupon_rate",
        ] {
            confidence.insert(key.to_string(), 0.0);
        }

        Self {
            document_id: document_id.into(),
            source,
            issuer: None,
            banks: Vec::new(),
            issue_size: None,
            currency: None,
            issue_date: None,
            maturity_date: None,
            coupon_rate: None,
            confidence,
            provenance: Vec::new(),
            validation_flags: Vec::new(),
        }
    }
}
