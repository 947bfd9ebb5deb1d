//! The extraction engine.
//!
//! One engine instance holds the compiled pattern and alias registries
//! and is reused across documents; construction is the only fallible
//! step. `extract` is total: whatever the input text looks like, it
//! returns a record, degrading to nulls and validation flags instead of
//! failing.

use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result};
use crate::extract::{self, amount, banks, coupon, dates, FieldOutcome};
use crate::models::{Document, EngineConfig, ExtractionRecord, FieldKind};
use crate::patterns::PatternRegistry;
use crate::reconcile::{self, Outcomes};
use crate::sections;
use crate::standardize::AliasRegistry;
use crate::text::{self, NormalizedText};
use crate::validate::{self, ValidationContext};

/// Prospectus fact extraction engine.
pub struct ExtractionEngine {
    config: EngineConfig,
    registry: PatternRegistry,
    aliases: AliasRegistry,
}

impl ExtractionEngine {
    /// Build an engine from a configuration.
    ///
    /// Registries named in the configuration are loaded and compiled
    /// here; a malformed registry file or pattern is a construction
    /// error, never a per-document one.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let registry = match &config.pattern_registry {
            Some(path) => PatternRegistry::from_file(path)?,
            None => PatternRegistry::builtin()?,
        };
        let aliases = match &config.alias_registry {
            Some(path) => AliasRegistry::from_file(path)?,
            None => AliasRegistry::builtin(),
        };
        Ok(Self {
            config,
            registry,
            aliases,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Extract all supported fields from one document.
    pub fn extract(&self, document: &Document) -> ExtractionRecord {
        let text = text::normalize(&document.text);
        if text.is_empty() {
            info!(document = %document.id, "unusable text, returning empty record");
            let mut record = ExtractionRecord::empty(document.id.clone(), document.source.clone());
            record.validation_flags = vec![validate::TEXT_UNUSABLE.to_string()];
            return record;
        }

        let located = sections::locate(&text, self.config.max_section_span);
        debug!(
            document = %document.id,
            pages = text.page_count(),
            sections = located.len(),
            "document normalized"
        );

        let mut context = ValidationContext::default();
        let mut outcomes = Outcomes::default();

        outcomes.issuer = self.issuer(&text, &located);

        let mentions = banks::extract(&self.registry, &self.config, &text, &located);
        outcomes.banks = mentions
            .into_iter()
            .map(|m| {
                let standardized = self
                    .aliases
                    .standardize(&m.raw, self.config.fuzzy_threshold);
                (m, standardized)
            })
            .collect();

        outcomes.issue_date = self.field(&mut context, &document.id, || {
            dates::extract(
                &self.registry,
                &self.config,
                &text,
                &located,
                FieldKind::IssueDate,
            )
        });
        outcomes.maturity_date = self.field(&mut context, &document.id, || {
            dates::extract(
                &self.registry,
                &self.config,
                &text,
                &located,
                FieldKind::MaturityDate,
            )
        });
        outcomes.amount = self.field(&mut context, &document.id, || {
            amount::extract(&self.registry, &self.config, &text, &located)
        });
        outcomes.coupon = self.field(&mut context, &document.id, || {
            coupon::extract(&self.registry, &self.config, &text, &located)
        });

        context.coupon_floating = outcomes
            .coupon
            .as_ref()
            .map_or_else(|| coupon::is_floating(&text), |o| o.value.floating);

        if let Some(o) = outcomes.coupon.as_mut() {
            o.value.rate = reconcile::round_rate(o.value.rate);
        }

        let mut record = reconcile::build_record(document, outcomes);
        record.validation_flags = validate::validate(&record, &self.config, context);
        info!(
            document = %document.id,
            banks = record.banks.len(),
            flags = record.validation_flags.len(),
            "extraction complete"
        );
        record
    }

    /// Run one fallible field extractor, converting its error into the
    /// `field_extraction_error` annotation instead of propagating it.
    fn field<T, F>(
        &self,
        context: &mut ValidationContext,
        document_id: &str,
        run: F,
    ) -> Option<FieldOutcome<T>>
    where
        F: FnOnce() -> std::result::Result<Option<FieldOutcome<T>>, ExtractionError>,
    {
        match run() {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(document = %document_id, error = %e, "field extraction failed");
                context.field_error = true;
                None
            }
        }
    }

    fn issuer(
        &self,
        text: &NormalizedText,
        located: &[sections::Section],
    ) -> Option<FieldOutcome<String>> {
        let matches =
            extract::collect_cascade(&self.registry, text, located, FieldKind::Issuer);
        extract::resolve(&matches, 0.0, |m| {
            let cleaned = m
                .value
                .trim()
                .trim_end_matches(['.', ',', ';', ':'])
                .trim()
                .to_string();
            (cleaned.len() >= 3).then_some(cleaned)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchType;
    use pretty_assertions::assert_eq;

    fn engine() -> ExtractionEngine {
        ExtractionEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_document_gets_unusable_flag() {
        let record = engine().extract(&Document::new("empty", "   \n  "));
        assert_eq!(record.validation_flags, vec!["text_unusable".to_string()]);
        assert!(record.banks.is_empty());
        assert!(record.issue_size.is_none());
    }

    #[test]
    fn test_issuer_extraction() {
        let record = engine().extract(&Document::new(
            "doc",
            "Issuer: Acme Industrial Finance B.V.\nIssue Date: 15 March 2024",
        ));
        assert_eq!(
            record.issuer.as_deref(),
            Some("Acme Industrial Finance B.V")
        );
    }

    #[test]
    fn test_bank_standardization_flows_through() {
        let record = engine().extract(&Document::new(
            "doc",
            "Joint Lead Managers: BNP Paribas, Deutsche Bank AG",
        ));
        assert_eq!(record.banks.len(), 2);
        assert!(record
            .banks
            .iter()
            .all(|b| b.bank.match_type == MatchType::Exact));
    }

    #[test]
    fn test_field_error_is_annotated_not_fatal() {
        let record = engine().extract(&Document::new(
            "doc",
            "Joint Lead Managers: BNP Paribas\ninterest rate: 99% typo",
        ));
        assert!(record.coupon_rate.is_none());
        assert!(record
            .validation_flags
            .contains(&"field_extraction_error".to_string()));
    }

    #[test]
    fn test_missing_registry_file_fails_construction() {
        let config = EngineConfig {
            pattern_registry: Some("/nonexistent/patterns.json".into()),
            ..EngineConfig::default()
        };
        assert!(ExtractionEngine::new(config).is_err());
    }
}
