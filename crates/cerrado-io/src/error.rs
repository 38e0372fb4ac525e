//! I/O error types for cerrado-io.

use std::path::PathBuf;

use cerrado_prep::PrepError;

/// Errors from file I/O, CSV parsing, dataset extraction, and result serialization.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of cells than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} cells, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of cells (from header).
        expected: usize,
        /// Actual number of cells in this row.
        got: usize,
    },

    /// Returned when a cell of a column declared numeric does not parse as a number.
    #[error("invalid number in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    InvalidNumber {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Column name.
        column: String,
        /// The raw cell text.
        raw: String,
    },

    /// Returned when a cell of a column declared numeric parses to an infinite value.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Column name.
        column: String,
        /// The raw cell text.
        raw: String,
    },

    /// Returned when the header names the same column twice.
    #[error("duplicate column \"{name}\" in {path}")]
    DuplicateColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The repeated name.
        name: String,
    },

    /// Returned when a requested column is not in the table.
    #[error("column \"{name}\" not found (available: {})", available.join(", "))]
    UnknownColumn {
        /// The requested name.
        name: String,
        /// Names that do exist.
        available: Vec<String>,
    },

    /// Returned when a feature column is categorical.
    #[error("column \"{name}\" is categorical, a numeric feature column is required")]
    NotNumeric {
        /// The offending column.
        name: String,
    },

    /// Returned when a feature or label cell is missing.
    #[error("column \"{column}\" is missing a value at row {row_index}")]
    MissingValue {
        /// The offending column.
        column: String,
        /// Zero-based row index.
        row_index: usize,
    },

    /// Returned when the delimiter and the decimal marker are the same byte.
    #[error("delimiter and decimal marker are both '{marker}'")]
    InvalidFormat {
        /// The shared character.
        marker: char,
    },

    /// Returned when a parsed table violates a table invariant.
    #[error(transparent)]
    Table(#[from] PrepError),

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result artifact cannot be encoded as JSON.
    #[error("cannot encode {path} as JSON")]
    SerializeJson {
        /// Path of the artifact.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
