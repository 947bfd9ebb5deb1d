//! Bank name standardization.
//!
//! Raw mentions arrive in many shapes ("Deutsche Bank", "DEUTSCHE BANK
//! AG", "Deutsche Bank Aktiengesellschaft"); downstream consumers need
//! one canonical name per institution. Matching is two-stage: an exact
//! lookup on the cleaned name, then a token-set fuzzy comparison against
//! every alias. Below the threshold the raw name is kept unmatched
//! rather than guessed at.

use std::collections::HashMap;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::models::{MatchType, StandardizedBank};

/// Confidence assigned to names no alias matched.
const UNMATCHED_CONFIDENCE: f64 = 0.3;

lazy_static! {
    static ref PARENTHETICAL: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref LEGAL_TAIL: Regex = Regex::new(
        r"(?i)[\s,]+(?:ag|aktiengesellschaft|plc|ltd|limited|llc|llp|inc|incorporated|se|sa|nv|spa|gmbh|kgaa|co|& co|and co|international|europe|group|corporation|corp)\.?$"
    )
    .unwrap();
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9&\s]").unwrap();
}

/// One alias entry, as stored in an alias registry JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasSpec {
    pub alias: String,
    pub canonical: String,
}

/// Alias table mapping cleaned names to canonical institution names.
#[derive(Debug)]
pub struct AliasRegistry {
    /// Insertion-ordered (alias, canonical) pairs; order breaks fuzzy
    /// score ties deterministically.
    entries: Vec<(String, String)>,
    exact: HashMap<String, String>,
}

impl AliasRegistry {
    /// Build the registry from the built-in alias table.
    pub fn builtin() -> Self {
        Self::from_pairs(default_aliases())
    }

    /// Load the registry from a JSON file (an array of [`AliasSpec`]).
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let specs: Vec<AliasSpec> =
            serde_json::from_str(&content).map_err(|e| RegistryError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_pairs(
            specs.into_iter().map(|s| (s.alias, s.canonical)).collect(),
        ))
    }

    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut entries = Vec::with_capacity(pairs.len());
        let mut exact = HashMap::with_capacity(pairs.len());
        for (alias, canonical) in pairs {
            let key = clean_name(&alias);
            if key.is_empty() {
                continue;
            }
            exact.entry(key.clone()).or_insert_with(|| canonical.clone());
            entries.push((key, canonical));
        }
        Self { entries, exact }
    }

    /// Standardize one raw bank name.
    ///
    /// `threshold` is the fuzzy acceptance score on a 0-100 scale. The
    /// raw name is always preserved on the result.
    pub fn standardize(&self, raw: &str, threshold: f64) -> StandardizedBank {
        let cleaned = clean_name(raw);

        if let Some(canonical) = self.exact.get(&cleaned) {
            return StandardizedBank {
                raw_name: raw.to_string(),
                standard_name: Some(canonical.clone()),
                confidence: 1.0,
                match_type: MatchType::Exact,
            };
        }

        let mut best: Option<(&str, f64)> = None;
        for (alias, canonical) in &self.entries {
            let score = token_set_ratio(&cleaned, alias);
            // Strictly-greater keeps the first entry on ties.
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((canonical.as_str(), score));
            }
        }

        match best {
            Some((canonical, score)) if score >= threshold => StandardizedBank {
                raw_name: raw.to_string(),
                standard_name: Some(canonical.to_string()),
                confidence: score / 100.0,
                match_type: MatchType::Fuzzy,
            },
            _ => StandardizedBank {
                raw_name: raw.to_string(),
                standard_name: None,
                confidence: UNMATCHED_CONFIDENCE,
                match_type: MatchType::None,
            },
        }
    }
}

/// Reduce a bank name to a comparison key: lowercase, no parentheticals,
/// no legal-form tail, no punctuation. Periods are deleted rather than
/// spaced out so "S.p.A." reduces to "spa" and "J.P." to "jp".
pub fn clean_name(raw: &str) -> String {
    let mut s = PARENTHETICAL.replace_all(raw, " ").to_lowercase();
    s = s.replace('.', "");
    s = NON_ALNUM.replace_all(&s, " ").to_string();
    s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some(rest) = s.strip_prefix("the ") {
        s = rest.to_string();
    }
    // Legal forms stack ("... Co. Ltd."), so strip until stable.
    loop {
        let stripped = LEGAL_TAIL.replace(&s, "").trim().to_string();
        if stripped == s || stripped.is_empty() {
            break;
        }
        s = stripped;
    }
    s
}

/// Levenshtein edit distance.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Similarity of two strings on a 0-100 scale.
fn ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 100.0;
    }
    let dist = levenshtein(a, b);
    ((total - dist.min(total)) as f64 / total as f64) * 100.0
}

/// Token-set similarity: order-insensitive and tolerant of one side
/// carrying extra tokens, so "deutsche bank" scores high against
/// "deutsche bank securities".
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta: std::collections::BTreeSet<&str> = a.split_whitespace().collect();
    let tb: std::collections::BTreeSet<&str> = b.split_whitespace().collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let inter: Vec<&str> = ta.intersection(&tb).copied().collect();
    let only_a: Vec<&str> = ta.difference(&tb).copied().collect();
    let only_b: Vec<&str> = tb.difference(&ta).copied().collect();

    let base = inter.join(" ");
    let with_a = if only_a.is_empty() {
        base.clone()
    } else if base.is_empty() {
        only_a.join(" ")
    } else {
        format!("{base} {}", only_a.join(" "))
    };
    let with_b = if only_b.is_empty() {
        base.clone()
    } else if base.is_empty() {
        only_b.join(" ")
    } else {
        format!("{base} {}", only_b.join(" "))
    };

    ratio(&base, &with_a)
        .max(ratio(&base, &with_b))
        .max(ratio(&with_a, &with_b))
}

/// The built-in alias table, keyed on cleaned forms of the names that
/// appear in European prospectuses.
fn default_aliases() -> Vec<(String, String)> {
    let pairs: &[(&str, &str)] = &[
        ("BNP Paribas", "BNP Paribas"),
        ("BNP", "BNP Paribas"),
        ("Deutsche Bank", "Deutsche Bank AG"),
        ("Deutsche Bank Aktiengesellschaft", "Deutsche Bank AG"),
        ("DB", "Deutsche Bank AG"),
        ("Citigroup", "Citigroup Global Markets Limited"),
        ("Citigroup Global Markets", "Citigroup Global Markets Limited"),
        ("Citi", "Citigroup Global Markets Limited"),
        ("Citibank", "Citigroup Global Markets Limited"),
        ("Goldman Sachs", "Goldman Sachs International"),
        ("Goldman Sachs & Co", "Goldman Sachs International"),
        ("GS", "Goldman Sachs International"),
        ("J.P. Morgan", "J.P. Morgan SE"),
        ("JP Morgan", "J.P. Morgan SE"),
        ("JPMorgan", "J.P. Morgan SE"),
        ("JPMorgan Chase", "J.P. Morgan SE"),
        ("Morgan Stanley", "Morgan Stanley & Co. International plc"),
        ("Morgan Stanley & Co", "Morgan Stanley & Co. International plc"),
        ("Merrill Lynch", "BofA Securities Europe SA"),
        ("BofA Securities", "BofA Securities Europe SA"),
        ("Bank of America", "BofA Securities Europe SA"),
        ("Bank of America Merrill Lynch", "BofA Securities Europe SA"),
        ("Barclays", "Barclays Bank PLC"),
        ("Barclays Bank", "Barclays Bank PLC"),
        ("Barclays Capital", "Barclays Bank PLC"),
        ("HSBC", "HSBC Bank plc"),
        ("HSBC Bank", "HSBC Bank plc"),
        ("HSBC Continental Europe", "HSBC Bank plc"),
        ("UBS", "UBS AG"),
        ("UBS Investment Bank", "UBS AG"),
        ("UBS Europe", "UBS AG"),
        ("Credit Suisse", "Credit Suisse Securities"),
        ("Credit Suisse Securities", "Credit Suisse Securities"),
        ("Societe Generale", "Société Générale"),
        ("Société Générale", "Société Générale"),
        ("SocGen", "Société Générale"),
        ("SG", "Société Générale"),
        ("Credit Agricole", "Crédit Agricole CIB"),
        ("Crédit Agricole", "Crédit Agricole CIB"),
        ("Credit Agricole CIB", "Crédit Agricole CIB"),
        ("CACIB", "Crédit Agricole CIB"),
        ("Natixis", "Natixis"),
        ("Commerzbank", "Commerzbank AG"),
        ("UniCredit", "UniCredit Bank AG"),
        ("UniCredit Bank", "UniCredit Bank AG"),
        ("HypoVereinsbank", "UniCredit Bank AG"),
        ("Banca IMI", "Banca IMI S.p.A."),
        ("Intesa Sanpaolo", "Intesa Sanpaolo S.p.A."),
        ("IMI Intesa Sanpaolo", "Intesa Sanpaolo S.p.A."),
        ("Mediobanca", "Mediobanca S.p.A."),
        ("Santander", "Banco Santander SA"),
        ("Banco Santander", "Banco Santander SA"),
        ("BBVA", "Banco Bilbao Vizcaya Argentaria SA"),
        ("Banco Bilbao Vizcaya Argentaria", "Banco Bilbao Vizcaya Argentaria SA"),
        ("ING", "ING Bank NV"),
        ("ING Bank", "ING Bank NV"),
        ("ABN AMRO", "ABN AMRO Bank NV"),
        ("ABN AMRO Bank", "ABN AMRO Bank NV"),
        ("Rabobank", "Coöperatieve Rabobank UA"),
        ("Nomura", "Nomura International plc"),
        ("Nomura International", "Nomura International plc"),
        ("Mizuho", "Mizuho International plc"),
        ("Mizuho Securities", "Mizuho International plc"),
        ("MUFG", "MUFG Securities EMEA plc"),
        ("MUFG Securities", "MUFG Securities EMEA plc"),
        ("SMBC", "SMBC Bank EU AG"),
        ("SMBC Nikko", "SMBC Bank EU AG"),
        ("RBC", "RBC Capital Markets"),
        ("RBC Capital Markets", "RBC Capital Markets"),
        ("Royal Bank of Canada", "RBC Capital Markets"),
        ("Scotiabank", "Scotiabank Europe plc"),
        ("TD Securities", "TD Global Finance"),
        ("NatWest", "NatWest Markets Plc"),
        ("NatWest Markets", "NatWest Markets Plc"),
        ("Royal Bank of Scotland", "NatWest Markets Plc"),
        ("RBS", "NatWest Markets Plc"),
        ("Lloyds", "Lloyds Bank Corporate Markets plc"),
        ("Lloyds Bank", "Lloyds Bank Corporate Markets plc"),
        ("Standard Chartered", "Standard Chartered Bank"),
        ("Nordea", "Nordea Bank Abp"),
        ("Nordea Bank", "Nordea Bank Abp"),
        ("SEB", "Skandinaviska Enskilda Banken AB"),
        ("Skandinaviska Enskilda Banken", "Skandinaviska Enskilda Banken AB"),
        ("Danske Bank", "Danske Bank A/S"),
        ("Swedbank", "Swedbank AB"),
        ("DNB", "DNB Bank ASA"),
        ("DZ Bank", "DZ BANK AG"),
        ("LBBW", "Landesbank Baden-Württemberg"),
        ("Landesbank Baden-Wurttemberg", "Landesbank Baden-Württemberg"),
        ("Helaba", "Landesbank Hessen-Thüringen"),
        ("NordLB", "Norddeutsche Landesbank"),
        ("BayernLB", "Bayerische Landesbank"),
        ("KBC", "KBC Bank NV"),
        ("KBC Bank", "KBC Bank NV"),
        ("Erste Group", "Erste Group Bank AG"),
        ("Erste Bank", "Erste Group Bank AG"),
        ("Raiffeisen Bank International", "Raiffeisen Bank International AG"),
        ("RBI", "Raiffeisen Bank International AG"),
        ("CaixaBank", "CaixaBank SA"),
        ("Jefferies", "Jefferies GmbH"),
        ("Wells Fargo", "Wells Fargo Securities International"),
        ("Wells Fargo Securities", "Wells Fargo Securities International"),
    ];
    pairs
        .iter()
        .map(|(a, c)| (a.to_string(), c.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("Deutsche Bank AG"), "deutsche bank");
        assert_eq!(clean_name("The Goldman Sachs Group, Inc."), "goldman sachs");
        assert_eq!(
            clean_name("Morgan Stanley & Co. International plc"),
            "morgan stanley"
        );
        assert_eq!(clean_name("Banca IMI S.p.A."), "banca imi");
        assert_eq!(clean_name("HSBC Bank plc (London Branch)"), "hsbc bank");
    }

    #[test]
    fn test_exact_match_on_cleaned_form() {
        let registry = AliasRegistry::builtin();
        let result = registry.standardize("DEUTSCHE BANK AG", 85.0);
        assert_eq!(result.standard_name.as_deref(), Some("Deutsche Bank AG"));
        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.raw_name, "DEUTSCHE BANK AG");
    }

    #[test]
    fn test_fuzzy_match_extra_tokens() {
        // Extra tokens on the raw side leave the alias a full token
        // subset, which token-set scoring treats as a complete match.
        let registry = AliasRegistry::builtin();
        let result = registry.standardize("Goldman Sachs Bank Europe", 85.0);
        assert_eq!(
            result.standard_name.as_deref(),
            Some("Goldman Sachs International")
        );
        assert_eq!(result.match_type, MatchType::Fuzzy);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_fuzzy_match_typo() {
        let registry = AliasRegistry::builtin();
        let result = registry.standardize("Goldman Sach", 85.0);
        assert_eq!(
            result.standard_name.as_deref(),
            Some("Goldman Sachs International")
        );
        assert_eq!(result.match_type, MatchType::Fuzzy);
        assert!(result.confidence >= 0.85 && result.confidence < 1.0);
    }

    #[test]
    fn test_below_threshold_kept_raw() {
        let registry = AliasRegistry::builtin();
        let result = registry.standardize("Volksbank Musterstadt eG", 85.0);
        assert_eq!(result.standard_name, None);
        assert_eq!(result.match_type, MatchType::None);
        assert_eq!(result.raw_name, "Volksbank Musterstadt eG");
        assert!(result.confidence < 0.5);
    }

    #[test]
    fn test_token_set_ratio_order_insensitive() {
        assert_eq!(token_set_ratio("bank deutsche", "deutsche bank"), 100.0);
    }

    #[test]
    fn test_token_set_ratio_subset_scores_high() {
        let score = token_set_ratio("deutsche bank", "deutsche bank securities");
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_token_set_ratio_disjoint_scores_low() {
        assert!(token_set_ratio("deutsche bank", "banco santander") < 50.0);
    }

    #[test]
    fn test_ambiguous_tie_prefers_first_entry() {
        // Both aliases reduce to the same key; first registration wins.
        let registry = AliasRegistry::from_pairs(vec![
            ("Alpha Bank".to_string(), "Alpha Bank AE".to_string()),
            ("Alpha Bank".to_string(), "Alpha Bank Roumania".to_string()),
        ]);
        let result = registry.standardize("Alpha Bank", 85.0);
        assert_eq!(result.standard_name.as_deref(), Some("Alpha Bank AE"));
    }

    #[test]
    fn test_threshold_from_config_is_respected() {
        let registry = AliasRegistry::builtin();
        let strict = registry.standardize("Goldman Sach", 99.0);
        assert_eq!(strict.match_type, MatchType::None);
    }
}
