//! Core library for receipt OCR text processing.
//!
//! This crate provides:
//! - Normalization of raw recognized text into clean line sequences
//! - Amount/date/payment extraction with ranked detection patterns
//! - Cross-validation and reliability scoring of candidate amounts
//! - Pattern-set management with learned-pattern persistence
//! - Correction analysis that learns new patterns from user fixes
//! - An append-only scan history with derived reliability statistics

pub mod error;
pub mod history;
pub mod learn;
pub mod models;
pub mod patterns;
pub mod ticket;

pub use error::{HistoryError, PatternError, Result, TickscanError};
pub use history::{determine_success_level, ScanHistory};
pub use learn::{generate_amount_variants, CorrectionAnalysis, CorrectionAnalyzer};
pub use models::config::{DetectionPattern, PatternCategory, PatternConfig};
pub use models::scan::{CandidateAmount, DocumentKind, ExtractionResult};
pub use models::stats::{PatternStat, PerformanceStats, ScanLogEntry, SuccessLevel};
pub use patterns::PatternManager;
pub use ticket::{normalize, DocumentParser, ParserDispatch, TicketParser};
