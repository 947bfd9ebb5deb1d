//! Configuration for the extraction engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Engine configuration, supplied once at construction.
///
/// The engine reads no environment variables and holds no globals; all
/// tuning lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fuzzy alias match acceptance threshold on a 0-100 scale.
    pub fuzzy_threshold: f64,

    /// Earliest plausible year for issue/maturity dates.
    pub min_year: i32,

    /// Latest plausible year for issue/maturity dates.
    pub max_year: i32,

    /// Maximum section span length in bytes, bounding runaway spans when
    /// no further heading is found.
    pub max_section_span: usize,

    /// Window after a role keyword scanned for bank names (tiers 1-2).
    pub role_window: usize,

    /// Window after a role anchor scanned in the contextual tier.
    pub context_window: usize,

    /// Per-field minimum match weight for a tier to be accepted.
    pub min_accept: AcceptThresholds,

    /// Optional JSON file overriding the built-in pattern registry.
    pub pattern_registry: Option<PathBuf>,

    /// Optional JSON file overriding the built-in bank alias registry.
    pub alias_registry: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 85.0,
            min_year: 1990,
            max_year: 2050,
            max_section_span: 6000,
            role_window: 300,
            context_window: 200,
            min_accept: AcceptThresholds::default(),
            pattern_registry: None,
            alias_registry: None,
        }
    }
}

/// Minimum match weight per field family for a tier to stop the cascade.
///
/// A tier producing only matches below the threshold is treated as a miss
/// and the next tier runs; the weak matches are still retained as
/// alternates. Amounts default above the weight of number-only matches so
/// a number with no adjacent currency token never becomes primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptThresholds {
    pub banks: f64,
    pub dates: f64,
    pub amount: f64,
    pub coupon: f64,
}

impl Default for AcceptThresholds {
    fn default() -> Self {
        Self {
            banks: 0.0,
            dates: 0.0,
            amount: 0.5,
            coupon: 0.0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.fuzzy_threshold, 85.0);
        assert_eq!(config.min_year, 1990);
        assert_eq!(config.max_year, 2050);
        assert!(config.min_accept.amount > 0.4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"fuzzy_threshold": 90.0}"#).unwrap();
        assert_eq!(config.fuzzy_threshold, 90.0);
        assert_eq!(config.max_section_span, 6000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = EngineConfig::default();
        config.fuzzy_threshold = 92.5;
        config.role_window = 400;
        config.save(&path).unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded.fuzzy_threshold, 92.5);
        assert_eq!(loaded.role_window, 400);
        assert_eq!(loaded.min_year, config.min_year);
    }

    #[test]
    fn test_from_file_missing_path_fails() {
        assert!(EngineConfig::from_file(std::path::Path::new("/nonexistent/config.json")).is_err());
    }
}
