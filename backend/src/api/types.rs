//! REST API types for client integration.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::pipeline::{ProcessedReport, SourceInfo};
use crate::transform::stats::StatisticsSummary;

/// Response sent after an upload is transformed.
///
/// Carries what the client shows on success; the formatted workbook itself
/// is served by `/api/transform`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Always "ready" on success
    pub status: String,

    /// Suggested name for the formatted workbook
    pub file_name: String,

    /// Record count, price range, band sizes and averages
    pub summary: StatisticsSummary,

    /// Input workbook metadata
    pub source: SourceInfo,
}

impl From<ProcessedReport> for UploadResponse {
    fn from(report: ProcessedReport) -> Self {
        UploadResponse {
            job_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            file_name: report.file_name,
            summary: report.output.summary,
            source: report.output.source,
        }
    }
}

/// Optional form fields accepted next to the uploaded file.
#[derive(Debug, Clone, Default)]
pub struct UploadFields {
    pub subdivision: Option<String>,
    pub sheet: Option<String>,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}
