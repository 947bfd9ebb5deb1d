//! Data models for documents, extraction records, and engine configuration.

pub mod config;
pub mod record;

pub use config::{AcceptThresholds, EngineConfig};
pub use record::{
    BankEntry, BankMention, BankRole, Document, ExtractionRecord, FieldKind, MatchType,
    Provenance, Span, StandardizedBank, Tier,
};
