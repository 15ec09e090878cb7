//! Detection pattern management.
//!
//! The pattern set is loaded once at application startup and shared by
//! reference into every parser; there is no ambient global. Reads far
//! outnumber writes (writes happen only on explicit reload or when a
//! learned pattern is appended), so accessors hand out copies taken
//! under a read lock.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{info, warn};

use crate::error::PatternError;
use crate::models::config::{DetectionPattern, PatternCategory, PatternConfig};

/// Owner of the ranked detection pattern sets.
pub struct PatternManager {
    path: PathBuf,
    config: RwLock<PatternConfig>,
}

impl PatternManager {
    /// Open the manager against a configuration file.
    ///
    /// The path is absolutized against the current directory up front,
    /// so later reloads and saves are independent of where the process
    /// has moved to. A missing or unreadable file is a recoverable
    /// condition: the built-in default set is used and the fallback is
    /// logged, never surfaced as an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = absolutize(path.into());

        let config = match PatternConfig::from_file(&path) {
            Ok(config) => {
                info!(
                    "loaded {} amount / {} payment patterns from {}",
                    config.amount.len(),
                    config.payment.len(),
                    path.display()
                );
                config
            }
            Err(e) => {
                warn!("{e}; falling back to built-in patterns");
                PatternConfig::builtin()
            }
        };

        Self {
            path,
            config: RwLock::new(config),
        }
    }

    /// Manager over the built-in default set, with no backing file.
    pub fn builtin() -> Self {
        Self {
            path: PathBuf::new(),
            config: RwLock::new(PatternConfig::builtin()),
        }
    }

    /// Absolute path of the backing configuration file.
    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// Amount patterns, rank-ordered. Returns a copy; the set cannot
    /// change underneath a parse in progress.
    pub fn amount_patterns(&self) -> Vec<DetectionPattern> {
        let mut patterns = self.read().amount.clone();
        patterns.sort_by_key(|p| p.rank);
        patterns
    }

    /// Payment patterns, rank-ordered copy.
    pub fn payment_patterns(&self) -> Vec<DetectionPattern> {
        let mut patterns = self.read().payment.clone();
        patterns.sort_by_key(|p| p.rank);
        patterns
    }

    /// Re-read the configuration file, replacing the loaded set.
    pub fn reload(&self) -> Result<(), PatternError> {
        let config = PatternConfig::from_file(&self.path)?;
        *self.write() = config;
        info!("reloaded patterns from {}", self.path.display());
        Ok(())
    }

    /// Append a learned pattern at the lowest priority (max rank + 1).
    /// A learned marker never outranks a curated one until an operator
    /// promotes it by editing the configuration.
    pub fn learn(&self, mut pattern: DetectionPattern) {
        let mut config = self.write();
        pattern.rank = config.max_rank() + 1;

        info!(
            "learned new {} pattern {} (marker {:?}, rank {})",
            match pattern.category {
                PatternCategory::Amount => "amount",
                PatternCategory::Payment => "payment",
            },
            pattern.name,
            pattern.marker,
            pattern.rank
        );

        match pattern.category {
            PatternCategory::Amount => config.amount.push(pattern),
            PatternCategory::Payment => config.payment.push(pattern),
        }
    }

    /// Persist the current set to the configuration file.
    pub fn save(&self) -> Result<(), PatternError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PatternError::Write {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                })?;
            }
        }
        self.read().save(&self.path)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, PatternConfig> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, PatternConfig> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.as_os_str().is_empty() || path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_builtin() {
        let manager = PatternManager::open("/nonexistent/patterns.json");

        let patterns = manager.amount_patterns();
        assert_eq!(patterns, PatternConfig::builtin().amount);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(&path, "{not json").unwrap();

        let manager = PatternManager::open(&path);
        assert!(!manager.amount_patterns().is_empty());
        assert_eq!(manager.payment_patterns(), PatternConfig::builtin().payment);
    }

    #[test]
    fn test_patterns_are_rank_ordered() {
        let manager = PatternManager::builtin();
        let ranks: Vec<u32> = manager.amount_patterns().iter().map(|p| p.rank).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn test_learn_appends_at_lowest_priority() {
        let manager = PatternManager::builtin();
        let before_max = manager.amount_patterns().last().unwrap().rank;

        manager.learn(DetectionPattern::marker(
            "PRICE_FINAL",
            "PRICE FINAL",
            0,
            PatternCategory::Amount,
        ));

        let patterns = manager.amount_patterns();
        let learned = patterns.last().unwrap();
        assert_eq!(learned.name, "PRICE_FINAL");
        assert!(learned.rank > before_max);
    }

    #[test]
    fn test_learn_save_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");

        let manager = PatternManager::open(&path);
        manager.learn(DetectionPattern::marker(
            "PRICE",
            "PRICE",
            0,
            PatternCategory::Amount,
        ));
        manager.save().unwrap();

        let reopened = PatternManager::open(&path);
        assert!(reopened.amount_patterns().iter().any(|p| p.name == "PRICE"));
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");

        let mut config = PatternConfig::builtin();
        config.save(&path).unwrap();

        let manager = PatternManager::open(&path);
        let before = manager.amount_patterns().len();

        config.amount.push(DetectionPattern::marker(
            "GRAND_TOTAL",
            "GRAND TOTAL",
            42,
            PatternCategory::Amount,
        ));
        config.save(&path).unwrap();

        manager.reload().unwrap();
        assert_eq!(manager.amount_patterns().len(), before + 1);
    }

    #[test]
    fn test_config_path_absolutized() {
        let manager = PatternManager::open("relative/patterns.json");
        assert!(manager.config_path().is_absolute());
    }
}
