//! Error types for the sweeper pipeline.
//!
//! This module defines the error hierarchy:
//!
//! - [`CsvError`] - CSV decoding and parsing errors
//! - [`PipelineError`] - Intake, parse and processing failures of one run
//! - [`ExportError`] - Rendering or writing export files
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the file contents.
    #[error("Failed to decode content as {encoding}: {message}")]
    EncodingError { encoding: String, message: String },

    /// Invalid CSV format.
    #[error("Line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl CsvError {
    /// Build a parse error from a `csv` crate error, keeping its line number.
    pub fn from_csv(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => CsvError::IoError(io),
            _ => CsvError::ParseError { line, message },
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Failures of a single processing run.
///
/// Each variant is recoverable: the caller keeps whatever result it had
/// before the run and may retry.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload is not a CSV file; rejected before any processing.
    #[error("{0}")]
    InvalidInput(String),

    /// Decoding the table failed.
    #[error("Error parsing CSV: {0}")]
    Parse(#[from] CsvError),

    /// An unexpected fault inside the transformation.
    #[error("Error processing file: {0}")]
    Processing(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while rendering or writing export files.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing to disk failed.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The rendered bytes were not valid UTF-8.
    #[error("Export encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Unknown export target name.
    #[error("Unknown export target: {0}")]
    UnknownTarget(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Export error.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Nothing to return for the request.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
