//! Error types for the comps transformation pipeline.
//!
//! - [`IngestError`] - Reading the input workbook
//! - [`ReportError`] - Serializing the formatted output
//! - [`ConfigError`] - Loading report configuration
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP surface errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Errors while reading the raw comps workbook.
#[derive(Debug, Error)]
pub enum IngestError {
    /// File name does not end in a recognized spreadsheet extension.
    #[error("Invalid file type '{0}': please upload a valid Excel file (.xlsx or .xls)")]
    InvalidFileType(String),

    /// Expected sheet is absent and the workbook has more than one sheet.
    #[error("Sheet \"{expected}\" not found. Sheets present: {}", format_sheet_list(.found))]
    SheetNotFound { expected: String, found: Vec<String> },

    /// The resolved sheet has no data rows below the header.
    #[error("No data found in sheet \"{0}\"")]
    EmptySheet(String),

    /// The bytes could not be decoded as a workbook.
    #[error("Error reading file: {0}")]
    ReadFailure(String),
}

fn format_sheet_list(names: &[String]) -> String {
    if names.is_empty() {
        return "(none)".to_string();
    }
    names
        .iter()
        .map(|n| format!("\"{}\"", n))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors while serializing the output workbook.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The xlsx writer rejected a cell, format or the final save.
    #[error("Error writing output workbook: {0}")]
    WriteFailure(String),
}

impl From<rust_xlsxwriter::XlsxError> for ReportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ReportError::WriteFailure(err.to_string())
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading a report configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the file.
    #[error("Config IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed JSON.
    #[error("Config JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A value was present but unusable.
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input could not be read.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Output could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem error around the transform (reading input, saving output).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for report rendering.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for the full pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
