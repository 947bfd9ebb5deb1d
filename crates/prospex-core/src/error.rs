//! Error types for the prospex-core library.

use thiserror::Error;

/// Main error type for the prospex library.
#[derive(Error, Debug)]
pub enum ProspexError {
    /// Registry load/parse error (fatal at engine construction).
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while loading the pattern or alias registries.
///
/// These surface at `ExtractionEngine::new` so that misconfiguration is
/// caught before any document is processed.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Failed to read a registry file.
    #[error("failed to read registry file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a registry file as JSON.
    #[error("failed to parse registry file {path}: {reason}")]
    Parse { path: String, reason: String },

    /// A pattern expression did not compile.
    #[error("pattern `{id}` failed to compile: {source}")]
    BadPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    /// A pattern references a capture group it does not define.
    #[error("pattern `{id}` has no capture group {group}")]
    BadGroup { id: String, group: usize },

    /// The registry contains no patterns for a field the engine needs.
    #[error("registry defines no patterns for field `{field}`")]
    EmptyField { field: String },
}

/// Errors scoped to a single field during extraction.
///
/// These never escape the engine: the affected field is nulled, a
/// `field_extraction_error` flag is recorded, and the remaining fields
/// are still extracted.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A field extractor hit an unexpected internal fault.
    #[error("extraction failed for {field}: {reason}")]
    Field { field: String, reason: String },
}

/// Result type for the prospex library.
pub type Result<T> = std::result::Result<T, ProspexError>;
