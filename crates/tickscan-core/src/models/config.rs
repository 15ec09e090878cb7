//! Detection pattern configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PatternError;

/// Category a detection pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    /// Locates a monetary amount line.
    Amount,
    /// Locates a payment instrument mention.
    Payment,
}

impl Default for PatternCategory {
    fn default() -> Self {
        Self::Amount
    }
}

/// One entry in the ranked detection pattern set.
///
/// A pattern matches a line either by case-insensitive marker substring
/// or, when `regex` is set, by regular expression. Lower rank means
/// higher priority. Patterns are immutable once loaded for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionPattern {
    /// Stable identifier, also used as the statistics key.
    pub name: String,

    /// Text marker searched case-insensitively within a line.
    pub marker: String,

    /// Optional regular expression used instead of the marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    /// Priority for tie-breaking; lower wins.
    pub rank: u32,

    /// Category of line this pattern locates.
    #[serde(default)]
    pub category: PatternCategory,
}

impl DetectionPattern {
    /// Build a marker-only pattern.
    pub fn marker(name: &str, marker: &str, rank: u32, category: PatternCategory) -> Self {
        Self {
            name: name.to_string(),
            marker: marker.to_string(),
            regex: None,
            rank,
            category,
        }
    }

    /// Compile the regex matcher, if any. Invalid expressions are
    /// reported once and treated as absent.
    pub fn compiled_regex(&self) -> Option<regex::Regex> {
        let source = self.regex.as_deref()?;
        match regex::Regex::new(source) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("pattern {} has invalid regex {:?}: {e}", self.name, source);
                None
            }
        }
    }
}

/// Ranked pattern sets, one list per category.
///
/// Loaded once per process from a JSON document of the shape
/// `{"amount": [...], "payment": [...]}`. When the source is missing or
/// unreadable the [`builtin`](Self::builtin) set is used instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Amount detection patterns, ordered by rank.
    pub amount: Vec<DetectionPattern>,
    /// Payment detection patterns, ordered by rank.
    pub payment: Vec<DetectionPattern>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PatternConfig {
    /// The built-in default pattern set, used when no configuration
    /// file is available. Markers cover the labels commonly printed on
    /// French register receipts.
    pub fn builtin() -> Self {
        use PatternCategory::{Amount, Payment};

        let amount = vec![
            DetectionPattern::marker("TOTAL_TTC", "TOTAL TTC", 1, Amount),
            DetectionPattern::marker("MONTANT_TTC", "MONTANT TTC", 2, Amount),
            DetectionPattern::marker("NET_A_PAYER", "NET A PAYER", 3, Amount),
            DetectionPattern::marker("TOTAL_A_PAYER", "TOTAL A PAYER", 4, Amount),
            DetectionPattern::marker("A_PAYER", "A PAYER", 5, Amount),
            DetectionPattern {
                name: "TTC".to_string(),
                marker: "TTC".to_string(),
                // Also catches the dotted "T.T.C." rendering.
                regex: Some(r"(?i)\bT\.?T\.?C\b".to_string()),
                rank: 6,
                category: Amount,
            },
            DetectionPattern::marker("TOTAL", "TOTAL", 7, Amount),
            DetectionPattern::marker("MONTANT", "MONTANT", 8, Amount),
            DetectionPattern::marker("SOMME", "SOMME", 9, Amount),
        ];

        let payment = vec![
            DetectionPattern::marker("CARTE_BANCAIRE", "CARTE BANCAIRE", 1, Payment),
            DetectionPattern::marker("SANS_CONTACT", "SANS CONTACT", 2, Payment),
            DetectionPattern::marker("CB", "CB", 3, Payment),
            DetectionPattern::marker("ESPECES", "ESPECES", 4, Payment),
            DetectionPattern::marker("CHEQUE", "CHEQUE", 5, Payment),
            DetectionPattern::marker("VIREMENT", "VIREMENT", 6, Payment),
            DetectionPattern::marker("PAYPAL", "PAYPAL", 7, Payment),
        ];

        Self { amount, payment }
    }

    /// Load pattern configuration from a JSON file.
    ///
    /// Distinguishes unreadable files, invalid JSON, and JSON whose
    /// top level is not a category map; the last case is a structural
    /// defect and fails loudly rather than half-loading.
    pub fn from_file(path: &Path) -> Result<Self, PatternError> {
        let display = path.display().to_string();

        let content = std::fs::read_to_string(path).map_err(|e| PatternError::Read {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| PatternError::Parse {
                path: display.clone(),
                reason: e.to_string(),
            })?;

        if !value.is_object() {
            return Err(PatternError::Invalid { path: display });
        }

        serde_json::from_value(value).map_err(|e| PatternError::Parse {
            path: display,
            reason: e.to_string(),
        })
    }

    /// Save the pattern configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), PatternError> {
        let display = path.display().to_string();

        let content = serde_json::to_string_pretty(self).map_err(|e| PatternError::Write {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        std::fs::write(path, content).map_err(|e| PatternError::Write {
            path: display,
            reason: e.to_string(),
        })
    }

    /// Highest rank currently in use across both categories.
    pub fn max_rank(&self) -> u32 {
        self.amount
            .iter()
            .chain(self.payment.iter())
            .map(|p| p.rank)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_ranked() {
        let config = PatternConfig::builtin();
        assert!(!config.amount.is_empty());
        assert!(!config.payment.is_empty());

        let ranks: Vec<u32> = config.amount.iter().map(|p| p.rank).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");

        let config = PatternConfig::builtin();
        config.save(&path).unwrap();

        let loaded = PatternConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_non_mapping_config_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        match PatternConfig::from_file(&path) {
            Err(PatternError::Invalid { .. }) => {}
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_config_is_read_error() {
        let path = Path::new("/nonexistent/patterns.json");
        assert!(matches!(
            PatternConfig::from_file(path),
            Err(PatternError::Read { .. })
        ));
    }

    #[test]
    fn test_invalid_regex_is_dropped() {
        let pattern = DetectionPattern {
            name: "BAD".to_string(),
            marker: "BAD".to_string(),
            regex: Some("((".to_string()),
            rank: 1,
            category: PatternCategory::Amount,
        };
        assert!(pattern.compiled_regex().is_none());
    }
}
