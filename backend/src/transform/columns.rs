//! Column allowlist filtering.

use crate::models::{CellValue, Record, COLUMN_ALLOWLIST};

/// Project `record` onto [`COLUMN_ALLOWLIST`], in allowlist order.
///
/// Every allowlist column is present in the result; columns the source row
/// lacks become [`CellValue::Null`]. Other columns are dropped.
pub fn filter_columns(record: &Record) -> Record {
    COLUMN_ALLOWLIST
        .iter()
        .map(|col| (*col, record.get(col).cloned().unwrap_or(CellValue::Null)))
        .collect()
}

/// [`filter_columns`] over a whole sheet.
pub fn filter_records(records: &[Record]) -> Vec<Record> {
    records.iter().map(filter_columns).collect()
}
