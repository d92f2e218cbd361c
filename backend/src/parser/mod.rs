//! Spreadsheet ingestion.
//!
//! Converts the raw comps workbook into ordered [`Record`]s keyed by the
//! header row. No column-specific logic here.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use crate::api::logs::log_warning;
use crate::error::{IngestError, IngestResult};
use crate::models::{CellValue, Record};

static SPREADSHEET_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(xlsx|xls)$").expect("static regex"));

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// One record per non-empty data row
    pub records: Vec<Record>,
    /// Column headers, in sheet order
    pub headers: Vec<String>,
    /// Sheet the records were read from
    pub sheet_name: String,
    /// Every sheet in the workbook
    pub sheet_names: Vec<String>,
    /// Whether the single-sheet fallback was used
    pub used_fallback: bool,
}

/// Reject file names that are not `.xlsx` / `.xls`.
pub fn check_file_type(file_name: &str) -> IngestResult<()> {
    if SPREADSHEET_EXTENSION.is_match(file_name.trim()) {
        Ok(())
    } else {
        Err(IngestError::InvalidFileType(file_name.to_string()))
    }
}

/// Pick the sheet to read.
///
/// The `expected` name wins when present. Otherwise a workbook with exactly
/// one sheet falls back to that sheet; anything else is an error naming
/// the sheets that were found.
pub fn resolve_sheet(sheet_names: &[String], expected: &str) -> IngestResult<(String, bool)> {
    if sheet_names.iter().any(|n| n == expected) {
        return Ok((expected.to_string(), false));
    }
    match sheet_names {
        [only] => Ok((only.clone(), true)),
        _ => Err(IngestError::SheetNotFound {
            expected: expected.to_string(),
            found: sheet_names.to_vec(),
        }),
    }
}

/// Parse a workbook file. The extension is checked before reading.
pub fn parse_workbook_file<P: AsRef<Path>>(
    path: P,
    expected_sheet: &str,
) -> IngestResult<ParseResult> {
    let path = path.as_ref();
    check_file_type(&path.to_string_lossy())?;

    let bytes = std::fs::read(path)
        .map_err(|e| IngestError::ReadFailure(format!("cannot read '{}': {}", path.display(), e)))?;

    parse_workbook_bytes(&bytes, expected_sheet)
}

/// Parse workbook bytes (xlsx, xls). The format is sniffed from content.
pub fn parse_workbook_bytes(bytes: &[u8], expected_sheet: &str) -> IngestResult<ParseResult> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::ReadFailure(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let (sheet_name, used_fallback) = resolve_sheet(&sheet_names, expected_sheet)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::ReadFailure(format!("sheet \"{}\": {}", sheet_name, e)))?;

    let (headers, records) = rows_to_records(&range);
    if records.is_empty() {
        return Err(IngestError::EmptySheet(sheet_name));
    }

    Ok(ParseResult {
        records,
        headers,
        sheet_name,
        sheet_names,
        used_fallback,
    })
}

/// Turn a sheet range into records, using the first row as the header.
///
/// Rows whose cells are all empty are skipped. Columns with a blank
/// header are ignored. A repeated header keeps its first column under the
/// plain name; later ones become `Name_1`, `Name_2`, ...
pub fn rows_to_records(range: &Range<Data>) -> (Vec<String>, Vec<Record>) {
    let mut rows = range.rows();

    let header_cells: Vec<Option<String>> = match rows.next() {
        Some(row) => dedupe_headers(row.iter().map(header_name).collect()),
        None => return (Vec::new(), Vec::new()),
    };
    let headers: Vec<String> = header_cells.iter().flatten().cloned().collect();

    let mut records = Vec::new();
    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }

        let mut record = Record::new();
        for (i, header) in header_cells.iter().enumerate() {
            let Some(header) = header else { continue };
            let value = row.get(i).map(cell_to_value).unwrap_or_default();
            record.insert(header.clone(), value);
        }
        records.push(record);
    }

    (headers, records)
}

fn dedupe_headers(names: Vec<Option<String>>) -> Vec<Option<String>> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let name = name?;
            let mut unique = name.clone();
            let mut n = 1;
            while seen.contains(&unique) {
                unique = format!("{}_{}", name, n);
                n += 1;
            }
            if unique != name {
                log_warning(format!("Duplicate column \"{}\" read as \"{}\"", name, unique));
            }
            seen.insert(unique.clone());
            Some(unique)
        })
        .collect()
}

fn header_name(cell: &Data) -> Option<String> {
    let name = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!name.is_empty()).then_some(name)
}

/// Map a calamine cell onto a raw [`CellValue`] without coercion.
pub fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Date(dt.as_f64()),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sheet, workbook_bytes, Cell};

    #[test]
    fn test_check_file_type() {
        assert!(check_file_type("comps.xlsx").is_ok());
        assert!(check_file_type("Pagoda Grove_West Jordan_Model.XLS").is_ok());
        assert!(check_file_type("export.csv").is_err());
        assert!(check_file_type("report.xlsx.bak").is_err());
        assert!(check_file_type("xlsx").is_err());
    }

    #[test]
    fn test_resolve_sheet_exact_name() {
        let names = vec!["Summary".to_string(), "Existing Comps Data".to_string()];
        let (name, fallback) = resolve_sheet(&names, "Existing Comps Data").unwrap();
        assert_eq!(name, "Existing Comps Data");
        assert!(!fallback);
    }

    #[test]
    fn test_resolve_sheet_single_fallback() {
        let names = vec!["Foo".to_string()];
        let (name, fallback) = resolve_sheet(&names, "Existing Comps Data").unwrap();
        assert_eq!(name, "Foo");
        assert!(fallback);
    }

    #[test]
    fn test_resolve_sheet_multiple_fails() {
        let names = vec!["Foo".to_string(), "Bar".to_string()];
        match resolve_sheet(&names, "Existing Comps Data") {
            Err(IngestError::SheetNotFound { expected, found }) => {
                assert_eq!(expected, "Existing Comps Data");
                assert_eq!(found, names);
            }
            other => panic!("expected SheetNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bytes_reads_records() {
        let bytes = workbook_bytes(&[sheet(
            "Existing Comps Data",
            vec![
                vec![Cell::s("City"), Cell::s("Sold Price"), Cell::s("MLS #")],
                vec![Cell::s("Sandy"), Cell::n(500000.0), Cell::n(1801.0)],
                vec![Cell::s("Draper"), Cell::n(410000.0), Cell::Empty],
            ],
        )]);

        let result = parse_workbook_bytes(&bytes, "Existing Comps Data").unwrap();
        assert_eq!(result.sheet_name, "Existing Comps Data");
        assert!(!result.used_fallback);
        assert_eq!(result.headers, vec!["City", "Sold Price", "MLS #"]);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].get("City"), Some(&CellValue::Text("Sandy".into())));
        assert_eq!(result.records[0].get("Sold Price"), Some(&CellValue::Number(500000.0)));
        assert_eq!(result.records[1].get("MLS #"), Some(&CellValue::Null));
    }

    #[test]
    fn test_duplicate_headers_keep_first_column() {
        let bytes = workbook_bytes(&[sheet(
            "Existing Comps Data",
            vec![
                vec![
                    Cell::s("Sold Price"),
                    Cell::s("City"),
                    Cell::s("Sold Price"),
                    Cell::s("Sold Price"),
                ],
                vec![Cell::n(500000.0), Cell::s("Sandy"), Cell::s("see notes"), Cell::n(1.0)],
            ],
        )]);

        let result = parse_workbook_bytes(&bytes, "Existing Comps Data").unwrap();
        assert_eq!(result.headers, vec!["Sold Price", "City", "Sold Price_1", "Sold Price_2"]);

        let record = &result.records[0];
        assert_eq!(record.get("Sold Price"), Some(&CellValue::Number(500000.0)));
        assert_eq!(record.get("Sold Price_1"), Some(&CellValue::Text("see notes".into())));
        assert_eq!(record.get("Sold Price_2"), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_dedupe_headers_skips_blanks() {
        let name = |s: &str| Some(s.to_string());
        let names = vec![name("A"), None, name("A"), name("A_1")];
        assert_eq!(dedupe_headers(names), vec![name("A"), None, name("A_1"), name("A_1_1")]);
    }

    #[test]
    fn test_parse_bytes_keeps_dates() {
        let bytes = workbook_bytes(&[sheet(
            "Existing Comps Data",
            vec![
                vec![Cell::s("Sold Date"), Cell::s("Sold Price")],
                vec![Cell::d(45292.0), Cell::n(350000.0)],
            ],
        )]);

        let result = parse_workbook_bytes(&bytes, "Existing Comps Data").unwrap();
        assert_eq!(result.records[0].get("Sold Date"), Some(&CellValue::Date(45292.0)));
    }

    #[test]
    fn test_parse_bytes_single_sheet_fallback() {
        let bytes = workbook_bytes(&[sheet(
            "Foo",
            vec![vec![Cell::s("Sold Price")], vec![Cell::n(1.0)]],
        )]);

        let result = parse_workbook_bytes(&bytes, "Existing Comps Data").unwrap();
        assert_eq!(result.sheet_name, "Foo");
        assert!(result.used_fallback);
    }

    #[test]
    fn test_parse_bytes_multiple_sheets_lists_names() {
        let bytes = workbook_bytes(&[
            sheet("Foo", vec![vec![Cell::s("Sold Price")], vec![Cell::n(1.0)]]),
            sheet("Bar", vec![vec![Cell::s("Sold Price")], vec![Cell::n(2.0)]]),
        ]);

        let err = parse_workbook_bytes(&bytes, "Existing Comps Data").unwrap_err();
        match err {
            IngestError::SheetNotFound { found, .. } => assert_eq!(found, vec!["Foo", "Bar"]),
            other => panic!("expected SheetNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_sheet_error() {
        let bytes = workbook_bytes(&[sheet(
            "Existing Comps Data",
            vec![vec![Cell::s("City"), Cell::s("Sold Price")]],
        )]);

        let err = parse_workbook_bytes(&bytes, "Existing Comps Data").unwrap_err();
        assert!(matches!(err, IngestError::EmptySheet(ref s) if s == "Existing Comps Data"));
    }

    #[test]
    fn test_blank_rows_skipped() {
        let bytes = workbook_bytes(&[sheet(
            "Existing Comps Data",
            vec![
                vec![Cell::s("Sold Price")],
                vec![Cell::n(1.0)],
                vec![Cell::Empty],
                vec![Cell::n(2.0)],
            ],
        )]);

        let result = parse_workbook_bytes(&bytes, "Existing Comps Data").unwrap();
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn test_garbage_bytes_read_failure() {
        let err = parse_workbook_bytes(b"not a spreadsheet", "Existing Comps Data").unwrap_err();
        assert!(matches!(err, IngestError::ReadFailure(_)));
    }

    #[test]
    fn test_parse_file_checks_extension() {
        let err = parse_workbook_file("comps.csv", "Existing Comps Data").unwrap_err();
        assert!(matches!(err, IngestError::InvalidFileType(_)));
    }

    #[test]
    fn test_parse_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comps.xlsx");
        let bytes = workbook_bytes(&[sheet(
            "Existing Comps Data",
            vec![vec![Cell::s("Sold Price")], vec![Cell::n(275000.0)]],
        )]);
        std::fs::write(&path, bytes).unwrap();

        let result = parse_workbook_file(&path, "Existing Comps Data").unwrap();
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_cell_to_value() {
        assert_eq!(cell_to_value(&Data::Empty), CellValue::Null);
        assert_eq!(cell_to_value(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_to_value(&Data::String(String::new())), CellValue::Null);
        assert_eq!(cell_to_value(&Data::Bool(false)), CellValue::Bool(false));
        assert_eq!(
            cell_to_value(&Data::DateTimeIso("2024-01-01T00:00:00".into())),
            CellValue::Text("2024-01-01T00:00:00".into())
        );
    }
}
