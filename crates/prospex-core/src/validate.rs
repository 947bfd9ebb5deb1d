//! Record validation.
//!
//! Validation annotates, it never deletes: every check that fails adds a
//! flag to the record and leaves the extracted values untouched. Flag
//! order is fixed so records diff cleanly.

use chrono::Datelike;

use crate::models::{EngineConfig, ExtractionRecord, MatchType};

pub const TEXT_UNUSABLE: &str = "text_unusable";
pub const NO_BANKS_FOUND: &str = "no_banks_found";
pub const LOW_CONFIDENCE_BANK: &str = "low_confidence_bank";
pub const DATE_ORDER_INVALID: &str = "date_order_invalid";
pub const DATE_OUT_OF_RANGE: &str = "date_out_of_range";
pub const MISSING_SIZE_OR_CURRENCY: &str = "missing_size_or_currency";
pub const COUPON_VARIABLE: &str = "coupon_variable";
pub const FIELD_EXTRACTION_ERROR: &str = "field_extraction_error";

/// Extraction-side facts the record itself does not carry.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationContext {
    /// The coupon extractor identified a floating-rate structure.
    pub coupon_floating: bool,
    /// At least one field extractor failed and was skipped.
    pub field_error: bool,
}

/// Compute the plausibility flags for a record, in canonical order.
pub fn validate(
    record: &ExtractionRecord,
    config: &EngineConfig,
    context: ValidationContext,
) -> Vec<String> {
    let mut flags = Vec::new();

    if record.banks.is_empty() {
        flags.push(NO_BANKS_FOUND.to_string());
    } else if record
        .banks
        .iter()
        .any(|b| b.bank.match_type == MatchType::None)
    {
        flags.push(LOW_CONFIDENCE_BANK.to_string());
    }

    if let (Some(issue), Some(maturity)) = (record.issue_date, record.maturity_date) {
        if maturity <= issue {
            flags.push(DATE_ORDER_INVALID.to_string());
        }
    }

    let out_of_range = record
        .issue_date
        .iter()
        .chain(record.maturity_date.iter())
        .any(|d| d.year() < config.min_year || d.year() > config.max_year);
    if out_of_range {
        flags.push(DATE_OUT_OF_RANGE.to_string());
    }

    if record.issue_size.is_none() || record.currency.is_none() {
        flags.push(MISSING_SIZE_OR_CURRENCY.to_string());
    }

    if context.coupon_floating {
        flags.push(COUPON_VARIABLE.to_string());
    }

    if context.field_error {
        flags.push(FIELD_EXTRACTION_ERROR.to_string());
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BankEntry, BankRole, StandardizedBank};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn base_record() -> ExtractionRecord {
        let mut record = ExtractionRecord::empty("doc-1", None);
        record.banks = vec![BankEntry {
            bank: StandardizedBank {
                raw_name: "Deutsche Bank AG".to_string(),
                standard_name: Some("Deutsche Bank AG".to_string()),
                confidence: 1.0,
                match_type: MatchType::Exact,
            },
            role: BankRole::LeadManager,
        }];
        record.issue_size = Some("500000000".parse().unwrap());
        record.currency = Some("EUR".to_string());
        record.issue_date = NaiveDate::from_ymd_opt(2024, 3, 15);
        record.maturity_date = NaiveDate::from_ymd_opt(2031, 3, 15);
        record
    }

    #[test]
    fn test_clean_record_has_no_flags() {
        let flags = validate(
            &base_record(),
            &EngineConfig::default(),
            ValidationContext::default(),
        );
        assert!(flags.is_empty());
    }

    #[test]
    fn test_no_banks() {
        let mut record = base_record();
        record.banks.clear();
        let flags = validate(&record, &EngineConfig::default(), ValidationContext::default());
        assert_eq!(flags, vec![NO_BANKS_FOUND.to_string()]);
    }

    #[test]
    fn test_unmatched_bank_flags_low_confidence() {
        let mut record = base_record();
        record.banks[0].bank.standard_name = None;
        record.banks[0].bank.match_type = MatchType::None;
        let flags = validate(&record, &EngineConfig::default(), ValidationContext::default());
        assert_eq!(flags, vec![LOW_CONFIDENCE_BANK.to_string()]);
    }

    #[test]
    fn test_inverted_dates() {
        let mut record = base_record();
        record.maturity_date = NaiveDate::from_ymd_opt(2020, 1, 1);
        let flags = validate(&record, &EngineConfig::default(), ValidationContext::default());
        assert_eq!(flags, vec![DATE_ORDER_INVALID.to_string()]);
    }

    #[test]
    fn test_date_out_of_configured_range() {
        let mut record = base_record();
        let config = EngineConfig {
            max_year: 2028,
            ..EngineConfig::default()
        };
        record.maturity_date = NaiveDate::from_ymd_opt(2031, 3, 15);
        let flags = validate(&record, &config, ValidationContext::default());
        assert_eq!(flags, vec![DATE_OUT_OF_RANGE.to_string()]);
    }

    #[test]
    fn test_missing_currency_only() {
        let mut record = base_record();
        record.currency = None;
        let flags = validate(&record, &EngineConfig::default(), ValidationContext::default());
        assert_eq!(flags, vec![MISSING_SIZE_OR_CURRENCY.to_string()]);
    }

    #[test]
    fn test_missing_both_size_and_currency() {
        let mut record = base_record();
        record.issue_size = None;
        record.currency = None;
        let flags = validate(&record, &EngineConfig::default(), ValidationContext::default());
        assert_eq!(flags, vec![MISSING_SIZE_OR_CURRENCY.to_string()]);
    }

    #[test]
    fn test_floating_coupon_flag() {
        let flags = validate(
            &base_record(),
            &EngineConfig::default(),
            ValidationContext {
                coupon_floating: true,
                field_error: false,
            },
        );
        assert_eq!(flags, vec![COUPON_VARIABLE.to_string()]);
    }

    #[test]
    fn test_flag_order_is_canonical() {
        let mut record = base_record();
        record.banks.clear();
        record.currency = None;
        record.maturity_date = NaiveDate::from_ymd_opt(2020, 1, 1);
        let flags = validate(
            &record,
            &EngineConfig::default(),
            ValidationContext {
                coupon_floating: true,
                field_error: true,
            },
        );
        assert_eq!(
            flags,
            vec![
                NO_BANKS_FOUND.to_string(),
                DATE_ORDER_INVALID.to_string(),
                MISSING_SIZE_OR_CURRENCY.to_string(),
                COUPON_VARIABLE.to_string(),
                FIELD_EXTRACTION_ERROR.to_string(),
            ]
        );
    }
}
