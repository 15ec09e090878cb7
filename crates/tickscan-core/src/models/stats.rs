//! Scan history records and aggregate statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::scan::DocumentKind;

/// Outcome classification of one scan attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessLevel {
    /// Amount matched on first detection, no correction needed.
    Exact,
    /// Amount required a user correction but was findable in the text.
    Partial,
    /// Scan error: the correct value never appeared in the text.
    Failed,
}

impl SuccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// One durable record of a scan attempt. Append-only: entries are
/// written once and never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanLogEntry {
    /// When the scan was recorded.
    pub timestamp: DateTime<Utc>,

    /// Kind of document that was scanned.
    pub document_kind: DocumentKind,

    /// Amount the extractor reported (`0.00` = not found).
    pub detected_amount: Decimal,

    /// Amount the user confirmed, when a correction took place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_amount: Option<Decimal>,

    /// Identifier of the pattern/strategy that produced the amount.
    pub detection_method: String,

    /// Reliability flag reported by the extractor.
    pub reliable: bool,

    /// Outcome classification driving the aggregate counters.
    pub success: SuccessLevel,
}

/// Accumulated scan counters for one document kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Total scans recorded.
    pub scans: u64,
    /// Scans that needed no correction.
    pub exact: u64,
    /// Scans corrected by the user but findable in the text.
    pub partial: u64,
    /// Unrecoverable scan errors.
    pub failed: u64,
}

impl PerformanceStats {
    /// Record one outcome.
    pub fn record(&mut self, level: SuccessLevel) {
        self.scans += 1;
        match level {
            SuccessLevel::Exact => self.exact += 1,
            SuccessLevel::Partial => self.partial += 1,
            SuccessLevel::Failed => self.failed += 1,
        }
    }

    /// Share of scans that produced a usable amount (exact or partial).
    pub fn success_rate(&self) -> f64 {
        if self.scans == 0 {
            return 0.0;
        }
        (self.exact + self.partial) as f64 / self.scans as f64
    }

    /// Share of scans that required a user correction.
    pub fn correction_rate(&self) -> f64 {
        if self.scans == 0 {
            return 0.0;
        }
        self.partial as f64 / self.scans as f64
    }
}

/// Lifetime hit/success counters for one detection pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternStat {
    /// Times the pattern produced the detected amount.
    pub hits: u64,
    /// Hits that needed no correction.
    pub successes: u64,
}

impl PatternStat {
    /// Record one hit.
    pub fn record(&mut self, success: bool) {
        self.hits += 1;
        if success {
            self.successes += 1;
        }
    }

    /// Reliability score derived purely from the accumulated counts.
    pub fn reliability_score(&self) -> f64 {
        if self.hits == 0 {
            return 0.0;
        }
        self.successes as f64 / self.hits as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_rates() {
        let mut stats = PerformanceStats::default();
        stats.record(SuccessLevel::Exact);
        stats.record(SuccessLevel::Exact);
        stats.record(SuccessLevel::Partial);
        stats.record(SuccessLevel::Failed);

        assert_eq!(stats.scans, 4);
        assert!((stats.success_rate() - 0.75).abs() < f64::EPSILON);
        assert!((stats.correction_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pattern_reliability() {
        let mut stat = PatternStat::default();
        assert_eq!(stat.reliability_score(), 0.0);

        stat.record(true);
        stat.record(true);
        stat.record(false);
        assert!((stat.reliability_score() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_log_entry_json_line() {
        let entry = ScanLogEntry {
            timestamp: Utc::now(),
            document_kind: DocumentKind::Ticket,
            detected_amount: Decimal::new(2580, 2),
            corrected_amount: None,
            detection_method: "TOTAL_TTC".to_string(),
            reliable: true,
            success: SuccessLevel::Exact,
        };

        let line = serde_json::to_string(&entry).unwrap();
        assert!(!line.contains('\n'));

        let back: ScanLogEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(back, entry);
    }
}
