//! Reconciliation: merge per-field outcomes into one record.
//!
//! Duplicate bank mentions collapse onto their canonical identity, each
//! populated field gets a confidence entry and a provenance row, and
//! missing fields get explicit zero confidence so consumers never have to
//! guess whether a field was attempted.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::extract::amount::AmountValue;
use crate::extract::coupon::CouponValue;
use crate::extract::FieldOutcome;
use crate::models::{
    BankEntry, BankMention, BankRole, Document, ExtractionRecord, FieldKind, Provenance,
    StandardizedBank, Tier,
};

/// Field outcomes collected by the engine, pre-reconciliation.
#[derive(Debug, Default)]
pub struct Outcomes {
    pub issuer: Option<FieldOutcome<String>>,
    pub banks: Vec<(BankMention, StandardizedBank)>,
    pub issue_date: Option<FieldOutcome<NaiveDate>>,
    pub maturity_date: Option<FieldOutcome<NaiveDate>>,
    pub amount: Option<FieldOutcome<AmountValue>>,
    pub coupon: Option<FieldOutcome<CouponValue>>,
}

/// Build the final record from the collected outcomes.
pub fn build_record(document: &Document, outcomes: Outcomes) -> ExtractionRecord {
    let mut record = ExtractionRecord::empty(document.id.clone(), document.source.clone());

    if let Some(o) = outcomes.issuer {
        record.issuer = Some(o.value.clone());
        set_field(&mut record, FieldKind::Issuer, &o);
    }

    let bank_tier = outcomes.banks.first().map(|(m, _)| m.tier);
    record.banks = merge_banks(outcomes.banks);
    if !record.banks.is_empty() {
        let mean: f64 = record.banks.iter().map(|b| b.bank.confidence).sum::<f64>()
            / record.banks.len() as f64;
        let tier = bank_tier.unwrap_or(Tier::Document);
        record
            .confidence
            .insert(FieldKind::BankRole.as_str().to_string(), tier.base_confidence() * mean);
    }

    if let Some(o) = outcomes.issue_date {
        record.issue_date = Some(o.value);
        set_field(&mut record, FieldKind::IssueDate, &o);
    }
    if let Some(o) = outcomes.maturity_date {
        record.maturity_date = Some(o.value);
        set_field(&mut record, FieldKind::MaturityDate, &o);
    }
    if let Some(o) = &outcomes.amount {
        record.issue_size = Some(o.value.size);
        record.currency = o.value.currency.clone();
        set_field(&mut record, FieldKind::IssueSize, o);
        if record.currency.is_some() {
            record
                .confidence
                .insert("currency".to_string(), o.confidence());
        }
    }
    if let Some(o) = &outcomes.coupon {
        record.coupon_rate = Some(o.value.rate);
        set_field(&mut record, FieldKind::Coupon, o);
    }

    record
}

fn set_field<T>(record: &mut ExtractionRecord, field: FieldKind, outcome: &FieldOutcome<T>) {
    record
        .confidence
        .insert(field.as_str().to_string(), outcome.confidence());
    record.provenance.push(Provenance {
        field: field.as_str().to_string(),
        pattern_id: outcome.pattern_id.clone(),
        tier: outcome.tier,
        page: outcome.page,
    });
}

/// Collapse standardized mentions onto unique (identity, role) pairs.
///
/// Identity is the canonical name when one matched, the cleaned raw name
/// otherwise; repeated sightings keep the highest-confidence entry.
/// Output order follows first sighting, so records are stable across
/// runs.
fn merge_banks(mentions: Vec<(BankMention, StandardizedBank)>) -> Vec<BankEntry> {
    let mut entries: Vec<(String, BankRole, BankEntry)> = Vec::new();

    for (mention, standardized) in mentions {
        let identity = standardized
            .standard_name
            .clone()
            .unwrap_or_else(|| crate::standardize::clean_name(&standardized.raw_name));

        match entries
            .iter_mut()
            .find(|(id, role, _)| *id == identity && *role == mention.role)
        {
            Some((_, _, existing)) => {
                if standardized.confidence > existing.bank.confidence {
                    existing.bank = standardized;
                }
            }
            None => {
                entries.push((
                    identity,
                    mention.role,
                    BankEntry {
                        bank: standardized,
                        role: mention.role,
                    },
                ));
            }
        }
    }

    entries.into_iter().map(|(_, _, e)| e).collect()
}

/// Coupon rounding for presentation: rates keep at most four decimal
/// places.
pub fn round_rate(rate: Decimal) -> Decimal {
    rate.round_dp(4).normalize()
}
