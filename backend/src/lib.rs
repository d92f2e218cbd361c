//! # Comps - quartile-banded reports from raw MLS comps exports
//!
//! Comps reads a raw "existing sold comps" workbook, keeps a fixed set of
//! columns, ranks the sales by sold price and writes a formatted workbook
//! where every quartile band has its own fill color and live `AVERAGE`
//! formulas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Raw  .xlsx  │────▶│  Ingestor   │────▶│  Transform  │────▶│ Report .xlsx│
//! │ (MLS export)│     │ (calamine)  │     │ (quartiles) │     │ (formulas)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use comps::{process_file, NoProgress, TransformOptions};
//!
//! let report = process_file("comps.xlsx".as_ref(), &TransformOptions::default(), &NoProgress)?;
//! println!("Quartile sizes: {}", report.output.summary.quartile_sizes);
//! std::fs::write(&report.file_name, &report.xlsx)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cell values, records and the column allowlist
//! - [`config`] - Report configuration (file, environment)
//! - [`parser`] - Workbook ingestion
//! - [`transform`] - Column filtering, ranking, quartiles and pipeline
//! - [`report`] - Output layout and `.xlsx` rendering
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Ingestion
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod report;

// HTTP API
pub mod api;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    IngestError,
    PipelineError,
    PipelineResult,
    ReportError,
    ServerError,
};

// =============================================================================
// Re-exports - Models & Config
// =============================================================================

pub use models::{CellValue, Record, COLUMN_ALLOWLIST, SALE_PRICE_COLUMN};

pub use config::{ReportConfig, DEFAULT_PORT};

// =============================================================================
// Re-exports - Ingestion
// =============================================================================

pub use parser::{
    check_file_type,
    parse_workbook_bytes,
    parse_workbook_file,
    resolve_sheet,
    ParseResult,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    band_for_rank,
    filter_records,
    format_currency,
    sort_by_price_desc,
    summarize,
    Band,
    BandSummary,
    BoundarySet,
    StatisticsSummary,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    process_bytes,
    process_file,
    transform_bytes,
    transform_records,
    NoProgress,
    ProcessedReport,
    ProgressSink,
    SourceInfo,
    TransformOptions,
    TransformOutput,
};

// =============================================================================
// Re-exports - Report
// =============================================================================

pub use report::{build_output_table, output_file_name, render_xlsx, write_xlsx, OutputTable};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, UploadResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
