//! Core library for bond prospectus fact extraction.
//!
//! This crate provides:
//! - Text normalization with page tracking
//! - A data-driven pattern registry with tiered fallback
//! - Section location and field extractors (banks, dates, size, coupon)
//! - Bank name standardization against an alias registry
//! - Record reconciliation, confidence scoring, and validation

pub mod engine;
pub mod error;
pub mod extract;
pub mod models;
pub mod patterns;
pub mod reconcile;
pub mod sections;
pub mod standardize;
pub mod text;
pub mod validate;

pub use engine::ExtractionEngine;
pub use error::{ExtractionError, ProspexError, RegistryError, Result};
pub use models::{
    BankEntry, BankRole, Document, EngineConfig, ExtractionRecord, MatchType, Provenance,
    StandardizedBank, Tier,
};
pub use patterns::{Pattern, PatternRegistry, PatternSpec};
pub use standardize::{AliasRegistry, AliasSpec};
