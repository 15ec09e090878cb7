//! Scan history: append-only event log and derived statistics.
//!
//! The JSONL log is the source of truth; the two aggregate documents
//! (performance by document kind, reliability by pattern) are derived
//! projections that can be rebuilt from the log at any time. Every
//! logged scan corresponds to exactly one update of each projection.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::HistoryError;
use crate::learn::amount_epsilon;
use crate::models::scan::{DocumentKind, METHOD_NONE};
use crate::models::stats::{PatternStat, PerformanceStats, ScanLogEntry, SuccessLevel};

/// File name of the append-only scan log.
pub const SCAN_LOG_FILE: &str = "scans.jsonl";
/// File name of the per-document-kind performance projection.
pub const PERFORMANCE_FILE: &str = "performance.json";
/// File name of the per-pattern reliability projection.
pub const PATTERN_STATS_FILE: &str = "patterns.json";

/// Classify a scan outcome for the performance counters.
///
/// `Exact` means the amount matched on first detection with no
/// correction; `Partial` means a correction was applied but the value
/// was findable; `Failed` means a scan error or no usable amount at
/// all.
pub fn determine_success_level(
    detected_amount: Decimal,
    corrected_amount: Option<Decimal>,
    scan_error: bool,
) -> SuccessLevel {
    if scan_error {
        return SuccessLevel::Failed;
    }

    match corrected_amount {
        None => {
            if detected_amount.is_zero() {
                SuccessLevel::Failed
            } else {
                SuccessLevel::Exact
            }
        }
        Some(corrected) => {
            if (detected_amount - corrected).abs() <= amount_epsilon() {
                SuccessLevel::Exact
            } else {
                SuccessLevel::Partial
            }
        }
    }
}

/// Owner of the scan log and its derived statistics documents.
///
/// Appends and projection updates are serialized behind one writer
/// mutex; projection documents are replaced via temp-file-then-rename
/// so readers never observe a torn file.
pub struct ScanHistory {
    log_path: PathBuf,
    performance_path: PathBuf,
    pattern_stats_path: PathBuf,
    writer: Mutex<()>,
}

impl ScanHistory {
    /// Open (creating if needed) a history directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| HistoryError::Open {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            log_path: dir.join(SCAN_LOG_FILE),
            performance_path: dir.join(PERFORMANCE_FILE),
            pattern_stats_path: dir.join(PATTERN_STATS_FILE),
            writer: Mutex::new(()),
        })
    }

    /// Record one scan outcome: appends the entry to the log and
    /// applies it to both projections, as a single serialized write.
    pub fn log_scan(&self, entry: &ScanLogEntry) -> Result<(), HistoryError> {
        let line =
            serde_json::to_string(entry).map_err(|e| HistoryError::Serialize(e.to_string()))?;

        let _guard = self.lock();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| HistoryError::Append(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| HistoryError::Append(e.to_string()))?;

        self.apply_performance(entry.document_kind, entry.success)?;
        self.apply_pattern(&entry.detection_method, entry.success)?;

        debug!(
            "logged {} scan via {} ({})",
            entry.document_kind,
            entry.detection_method,
            entry.success.as_str()
        );
        Ok(())
    }

    /// Apply one outcome to the per-document-kind counters.
    pub fn update_performance_stats(
        &self,
        kind: DocumentKind,
        outcome: SuccessLevel,
    ) -> Result<(), HistoryError> {
        let _guard = self.lock();
        self.apply_performance(kind, outcome)
    }

    /// Apply one outcome to a pattern's hit/success counters.
    pub fn update_pattern_stats(
        &self,
        pattern_id: &str,
        success: bool,
    ) -> Result<(), HistoryError> {
        let _guard = self.lock();
        let mut stats: BTreeMap<String, PatternStat> = self.read_doc(&self.pattern_stats_path)?;
        stats.entry(pattern_id.to_string()).or_default().record(success);
        self.write_doc(&self.pattern_stats_path, &stats)
    }

    /// Current per-document-kind performance projection.
    pub fn performance_stats(&self) -> Result<BTreeMap<String, PerformanceStats>, HistoryError> {
        self.read_doc(&self.performance_path)
    }

    /// Current per-pattern reliability projection.
    pub fn pattern_stats(&self) -> Result<BTreeMap<String, PatternStat>, HistoryError> {
        self.read_doc(&self.pattern_stats_path)
    }

    /// Read the full scan log. Corrupt lines are skipped with a
    /// warning; they never poison the rest of the history.
    pub fn read_log(&self) -> Result<Vec<ScanLogEntry>, HistoryError> {
        let content = match std::fs::read_to_string(&self.log_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(HistoryError::Stats {
                    path: self.log_path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let mut entries = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("skipping corrupt scan log line {}: {e}", number + 1),
            }
        }
        Ok(entries)
    }

    /// Recompute both projections from the log alone and replace the
    /// stored documents. The log is the source of truth; this makes
    /// the derived state catch up with it.
    pub fn rebuild_stats(&self) -> Result<(), HistoryError> {
        let entries = self.read_log()?;

        let mut performance: BTreeMap<String, PerformanceStats> = BTreeMap::new();
        let mut patterns: BTreeMap<String, PatternStat> = BTreeMap::new();

        for entry in &entries {
            performance
                .entry(entry.document_kind.as_str().to_string())
                .or_default()
                .record(entry.success);

            if entry.detection_method != METHOD_NONE {
                patterns
                    .entry(entry.detection_method.clone())
                    .or_default()
                    .record(entry.success == SuccessLevel::Exact);
            }
        }

        let _guard = self.lock();
        self.write_doc(&self.performance_path, &performance)?;
        self.write_doc(&self.pattern_stats_path, &patterns)?;

        debug!("rebuilt stats from {} log entries", entries.len());
        Ok(())
    }

    fn apply_performance(
        &self,
        kind: DocumentKind,
        outcome: SuccessLevel,
    ) -> Result<(), HistoryError> {
        let mut stats: BTreeMap<String, PerformanceStats> =
            self.read_doc(&self.performance_path)?;
        stats.entry(kind.as_str().to_string()).or_default().record(outcome);
        self.write_doc(&self.performance_path, &stats)
    }

    fn apply_pattern(&self, method: &str, outcome: SuccessLevel) -> Result<(), HistoryError> {
        // "none" is not a pattern; misses already show up in the
        // performance counters.
        if method == METHOD_NONE {
            return Ok(());
        }
        let mut stats: BTreeMap<String, PatternStat> = self.read_doc(&self.pattern_stats_path)?;
        stats
            .entry(method.to_string())
            .or_default()
            .record(outcome == SuccessLevel::Exact);
        self.write_doc(&self.pattern_stats_path, &stats)
    }

    fn read_doc<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T, HistoryError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => {
                return Err(HistoryError::Stats {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| HistoryError::Stats {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn write_doc<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), HistoryError> {
        let content = serde_json::to_string_pretty(value)
            .map_err(|e| HistoryError::Serialize(e.to_string()))?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, content).map_err(|e| HistoryError::Stats {
            path: tmp.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::rename(&tmp, path).map_err(|e| HistoryError::Stats {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
