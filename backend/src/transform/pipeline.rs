//! High-level pipeline API: raw workbook in, banded report out.
//!
//! Combines ingestion, column filtering, ranking, statistics and layout.
//! Every call is independent: the output table and the summary are
//! returned to the caller, who threads them into display and download.
//!
//! # Example
//!
//! ```rust,ignore
//! use comps::{process_file, NoProgress, TransformOptions};
//!
//! let report = process_file("comps.xlsx".as_ref(), &TransformOptions::default(), &NoProgress)?;
//! println!("{} records, {}", report.output.summary.record_count, report.output.summary.price_range);
//! std::fs::write(&report.file_name, &report.xlsx)?;
//! ```

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::Path;

use super::columns::filter_records;
use super::quartile::{sort_by_price_desc, BoundarySet};
use super::stats::{summarize, StatisticsSummary};
use crate::api::logs::{log_info, log_success, log_warning};
use crate::config::ReportConfig;
use crate::error::PipelineResult;
use crate::models::Record;
use crate::parser::{check_file_type, parse_workbook_bytes, ParseResult};
use crate::report::layout::{build_output_table, OutputTable};
use crate::report::writer::{output_file_name, render_xlsx};

/// Receives coarse progress updates. Purely advisory.
pub trait ProgressSink {
    fn report(&self, percent: u8, label: &str);
}

/// Discards progress updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u8, _label: &str) {}
}

/// Options for one transform
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Report text and sheet names
    pub config: ReportConfig,

    /// Date used for the date stamp and the output file name
    pub today: NaiveDate,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self::new(ReportConfig::default())
    }
}

impl TransformOptions {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            today: Local::now().date_naive(),
        }
    }
}

/// Where the records came from
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub sheet_name: String,
    pub sheet_names: Vec<String>,
    pub headers: Vec<String>,
    pub used_fallback: bool,
    pub row_count: usize,
}

impl From<&ParseResult> for SourceInfo {
    fn from(parsed: &ParseResult) -> Self {
        Self {
            sheet_name: parsed.sheet_name.clone(),
            sheet_names: parsed.sheet_names.clone(),
            headers: parsed.headers.clone(),
            used_fallback: parsed.used_fallback,
            row_count: parsed.records.len(),
        }
    }
}

/// Result of the transform, before serialization
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub table: OutputTable,
    pub summary: StatisticsSummary,
    /// Filtered records in rank order
    pub records: Vec<Record>,
    pub source: SourceInfo,
}

/// Transform plus the rendered workbook
#[derive(Debug, Clone)]
pub struct ProcessedReport {
    pub output: TransformOutput,
    /// `.xlsx` bytes
    pub xlsx: Vec<u8>,
    /// Suggested download name
    pub file_name: String,
}

/// Transform already-ingested records. Never fails.
pub fn transform_records(
    records: &[Record],
    options: &TransformOptions,
    progress: &dyn ProgressSink,
) -> TransformOutput {
    progress.report(70, "Filtering columns...");
    let filtered = filter_records(records);

    progress.report(75, "Sorting by price...");
    let sorted = sort_by_price_desc(filtered);

    progress.report(80, "Calculating quartiles...");
    let boundaries = BoundarySet::new(sorted.len());
    let summary = summarize(&sorted, &boundaries);
    log_success(format!("Price range: {}", summary.price_range));
    log_info(format!("Quartile sizes: {}", summary.quartile_sizes));
    for band in summary.bands.iter().filter(|b| b.size == 0) {
        log_warning(format!("Quartile {} is empty, its averages read n/a", band.band));
    }

    progress.report(85, "Creating formatted workbook...");
    let table = build_output_table(&sorted, &boundaries, &options.config, options.today);

    TransformOutput {
        table,
        summary,
        records: sorted,
        source: SourceInfo {
            row_count: records.len(),
            ..SourceInfo::default()
        },
    }
}

/// Ingest workbook bytes and transform them.
///
/// When `file_name` is given its extension is checked first.
pub fn transform_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    options: &TransformOptions,
    progress: &dyn ProgressSink,
) -> PipelineResult<TransformOutput> {
    if let Some(name) = file_name {
        check_file_type(name)?;
        log_info(format!("Selected: {}", name));
    }

    progress.report(30, "Processing data...");
    let parsed = parse_workbook_bytes(bytes, &options.config.input_sheet)?;

    progress.report(60, "Loading raw data...");
    if parsed.used_fallback {
        log_warning(format!(
            "Sheet \"{}\" not found, using the only sheet \"{}\"",
            options.config.input_sheet, parsed.sheet_name
        ));
    }
    log_success(format!(
        "Read {} rows, {} columns from \"{}\"",
        parsed.records.len(),
        parsed.headers.len(),
        parsed.sheet_name
    ));

    let mut output = transform_records(&parsed.records, options, progress);
    output.source = SourceInfo::from(&parsed);
    Ok(output)
}

/// Transform and render to `.xlsx` in one step.
pub fn process_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    options: &TransformOptions,
    progress: &dyn ProgressSink,
) -> PipelineResult<ProcessedReport> {
    let output = transform_bytes(bytes, file_name, options, progress)?;

    progress.report(95, "Writing workbook...");
    let xlsx = render_xlsx(&output.table)?;

    progress.report(100, "Done");
    Ok(ProcessedReport {
        output,
        xlsx,
        file_name: output_file_name(options.today),
    })
}

/// Read a workbook from disk, transform and render it.
pub fn process_file(
    path: &Path,
    options: &TransformOptions,
    progress: &dyn ProgressSink,
) -> PipelineResult<ProcessedReport> {
    let name = path.to_string_lossy();
    check_file_type(&name)?;

    progress.report(10, "Reading file...");
    let bytes = std::fs::read(path)?;
    process_bytes(&bytes, Some(&name), options, progress)
}
