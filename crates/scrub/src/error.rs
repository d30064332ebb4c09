//! Error types for the Scrub library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Scrub operations.
#[derive(Debug, Error)]
pub enum ScrubError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to load.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Error saving or loading an artifact.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The table violates a structural invariant.
    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

/// Structural table errors.
///
/// These are the only errors that abort a whole rule application run: no
/// per-rule recovery is meaningful on a table whose columns disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// A column's length differs from the table's row count.
    #[error("column '{column}' has {found} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    /// Two columns share a name.
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// Failure while applying a rule to a single cell.
///
/// Cell errors are counted in the rule's log entry and never abort the rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// A numeric operation met a value with no numeric form.
    #[error("value '{value}' is not numeric")]
    NotNumeric { value: String },

    /// A fill statistic could not be computed for the column.
    #[error("{statistic} is undefined for column '{column}'")]
    StatisticUndefined { statistic: String, column: String },
}

/// Result type alias for Scrub operations.
pub type Result<T> = std::result::Result<T, ScrubError>;
