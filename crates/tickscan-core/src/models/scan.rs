//! Scan result models produced by the document parsers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of scanned document, selecting the parser strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Store/restaurant receipt (ticket de caisse).
    Ticket,
    /// Ride-hailing or taxi receipt.
    RideReceipt,
    /// Salary payslip.
    Payslip,
}

impl DocumentKind {
    /// Stable identifier used as a statistics key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::RideReceipt => "ride_receipt",
            Self::Payslip => "payslip",
        }
    }
}

impl Default for DocumentKind {
    fn default() -> Self {
        Self::Ticket
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ticket" | "receipt" => Ok(Self::Ticket),
            "ride" | "ride_receipt" => Ok(Self::RideReceipt),
            "payslip" | "salary" => Ok(Self::Payslip),
            other => Err(format!("unknown document kind: {other}")),
        }
    }
}

/// One amount candidate found on a document, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAmount {
    /// Parsed numeric value, rounded to 2 decimal places.
    pub value: Decimal,
    /// Name of the detection pattern that matched the line.
    pub pattern: String,
    /// The normalized line the candidate was found on.
    pub line: String,
}

/// Structured output of parsing one document.
///
/// Immutable after creation; consumed by the caller to build a
/// transaction record and by the scan history for statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted amount; `0.00` means "not found".
    pub amount: Decimal,

    /// Extracted document date, if any was recognizable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Identifier of the pattern or strategy that produced the amount.
    pub detection_method: String,

    /// Whether the amount is trustworthy (cross-validated or a single
    /// unambiguous match).
    pub reliable: bool,

    /// All amount candidates considered, in pattern-rank order.
    pub candidates: Vec<CandidateAmount>,

    /// Payment instrument detected from the payment pattern set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Detection method recorded when no pattern produced an amount.
pub const METHOD_NONE: &str = "none";

/// Detection method recorded when several patterns agreed on one value.
pub const METHOD_CROSS_VALIDATED: &str = "cross_validated";

impl ExtractionResult {
    /// A result carrying no detected amount.
    pub fn not_found() -> Self {
        Self {
            amount: Decimal::ZERO,
            date: None,
            detection_method: METHOD_NONE.to_string(),
            reliable: false,
            candidates: Vec::new(),
            payment_method: None,
        }
    }

    /// Whether any amount was detected at all.
    pub fn has_amount(&self) -> bool {
        !self.amount.is_zero()
    }
}
