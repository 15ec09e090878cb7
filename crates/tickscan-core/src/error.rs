//! Error types for the tickscan-core library.

use thiserror::Error;

/// Main error type for the tickscan library.
#[derive(Error, Debug)]
pub enum TickscanError {
    /// Pattern configuration error.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Scan history / statistics error.
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to loading and persisting pattern configuration.
///
/// These surface from the internal load path only; the public
/// [`PatternManager::open`](crate::patterns::PatternManager::open)
/// boundary converts them into the built-in default set.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Failed to read the pattern file.
    #[error("failed to read pattern file {path}: {reason}")]
    Read { path: String, reason: String },

    /// The pattern file is not valid JSON.
    #[error("pattern file {path} is not valid JSON: {reason}")]
    Parse { path: String, reason: String },

    /// The pattern file parsed but is structurally not a category map.
    #[error("pattern file {path} must map pattern categories to pattern lists")]
    Invalid { path: String },

    /// Failed to write the pattern file.
    #[error("failed to write pattern file {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Errors related to the scan log and aggregate statistics.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Failed to create or open the history directory.
    #[error("failed to open history directory {path}: {reason}")]
    Open { path: String, reason: String },

    /// Failed to append to the scan log.
    #[error("failed to append scan log entry: {0}")]
    Append(String),

    /// Failed to read or replace a stats document.
    #[error("failed to update stats document {path}: {reason}")]
    Stats { path: String, reason: String },

    /// Failed to serialize a record.
    #[error("failed to serialize record: {0}")]
    Serialize(String),
}

/// Result type for the tickscan library.
pub type Result<T> = std::result::Result<T, TickscanError>;
