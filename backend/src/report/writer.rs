//! XLSX serialization of an [`OutputTable`].

use chrono::NaiveDate;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};
use std::path::Path;

use super::layout::{CellContent, CellStyle, OutputTable, FIRST_DATA_COL, FIRST_DATA_ROW};
use super::palette::band_color;
use crate::error::{ReportError, ReportResult};
use crate::models::CellValue;
use crate::transform::quartile::Band;

const DATE_FORMAT: &str = "m/d/yyyy";

/// Reusable formats, one fill per band.
struct ReportFormats {
    band_fill: [Format; 4],
    band_date: [Format; 4],
}

impl ReportFormats {
    fn new() -> Self {
        let fill = |band: Band| Format::new().set_background_color(Color::RGB(band_color(band)));

        Self {
            band_fill: Band::ALL.map(fill),
            band_date: Band::ALL.map(|b| fill(b).set_num_format(DATE_FORMAT)),
        }
    }

    /// Format of a data cell: the band's fill, plus the date format for dates.
    fn row_format(&self, band: Band, value: &CellValue) -> &Format {
        match value {
            CellValue::Date(_) => &self.band_date[band.index()],
            _ => &self.band_fill[band.index()],
        }
    }

    fn for_style(style: &CellStyle) -> Format {
        let mut format = Format::new();
        if style.bold {
            format = format.set_bold();
        }
        if let Some(size) = style.font_size {
            format = format.set_font_size(size);
        }
        if style.centered {
            format = format.set_align(FormatAlign::Center);
        }
        format
    }
}

/// Render the table to `.xlsx` bytes.
pub fn render_xlsx(table: &OutputTable) -> ReportResult<Vec<u8>> {
    let formats = ReportFormats::new();
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    for (col, width) in &table.column_widths {
        worksheet.set_column_width(*col, *width)?;
    }

    for cell in &table.cells {
        let mut format = ReportFormats::for_style(&cell.style);
        match &cell.content {
            CellContent::Formula(f) => {
                worksheet.write_formula_with_format(cell.row, cell.col, f.as_str(), &format)?;
            }
            CellContent::Value(value) => {
                if matches!(value, CellValue::Date(_)) {
                    format = format.set_num_format(DATE_FORMAT);
                }
                write_value(worksheet, cell.row, cell.col, value, &format)?;
            }
        }
    }

    for (rank, row) in table.rows.iter().enumerate() {
        let sheet_row = FIRST_DATA_ROW + rank as u32;
        for (i, value) in row.values.iter().enumerate() {
            let format = formats.row_format(row.band, value);
            write_value(worksheet, sheet_row, FIRST_DATA_COL + i as u16, value, format)?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| ReportError::WriteFailure(format!("failed to create workbook: {}", e)))
}

/// Render the table and save it to `path`.
pub fn write_xlsx(table: &OutputTable, path: &Path) -> ReportResult<()> {
    let bytes = render_xlsx(table)?;
    std::fs::write(path, bytes)
        .map_err(|e| ReportError::WriteFailure(format!("cannot write '{}': {}", path.display(), e)))
}

/// Suggested download name, e.g. `Existing_Comps_Transformed_2025-01-15.xlsx`.
pub fn output_file_name(today: NaiveDate) -> String {
    format!("Existing_Comps_Transformed_{}.xlsx", today.format("%Y-%m-%d"))
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: &Format,
) -> ReportResult<()> {
    match value {
        // Blank, not skipped, so the band fill still shows.
        CellValue::Null => worksheet.write_blank(row, col, format)?,
        CellValue::Number(n) => worksheet.write_number_with_format(row, col, *n, format)?,
        CellValue::Text(s) => worksheet.write_string_with_format(row, col, s, format)?,
        CellValue::Bool(b) => worksheet.write_boolean_with_format(row, col, *b, format)?,
        CellValue::Date(serial) => worksheet.write_number_with_format(row, col, *serial, format)?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::models::SALE_PRICE_COLUMN;
    use crate::report::layout::build_output_table;
    use crate::test_support::priced_records;
    use crate::transform::columns::filter_records;
    use crate::transform::quartile::{sort_by_price_desc, BoundarySet};
    use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
    use std::io::Cursor;

    fn sample_table(prices: &[f64]) -> OutputTable {
        let sorted = sort_by_price_desc(filter_records(&priced_records(prices)));
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let config = ReportConfig::default();
        build_output_table(&sorted, &BoundarySet::new(sorted.len()), &config, today)
    }

    #[test]
    fn test_render_produces_zip_container() {
        let bytes = render_xlsx(&sample_table(&[1.0, 2.0, 3.0])).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    fn read_back(bytes: Vec<u8>) -> (Range<Data>, Range<String>) {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let values = workbook.worksheet_range("Existing Comps").unwrap();
        let formulas = workbook.worksheet_formula("Existing Comps").unwrap();
        (values, formulas)
    }

    #[test]
    fn test_rendered_sheet_reads_back() {
        let table = sample_table(&[100000.0, 500000.0, 300000.0, 400000.0]);
        let (values, formulas) = read_back(render_xlsx(&table).unwrap());

        assert_eq!(values.get_value((1, 2)), Some(&Data::String("Existing Sold Comps".into())));
        assert_eq!(values.get_value((4, 3)), Some(&Data::Float(4.0)));
        assert_eq!(values.get_value((13, 11)), Some(&Data::String(SALE_PRICE_COLUMN.into())));
        assert_eq!(values.get_value((14, 11)), Some(&Data::Float(500000.0)));
        assert_eq!(values.get_value((17, 11)), Some(&Data::Float(100000.0)));

        assert_eq!(formulas.get_value((3, 8)).map(String::as_str), Some("AVERAGE(L$15:L$15)"));
        assert_eq!(formulas.get_value((3, 11)).map(String::as_str), Some("AVERAGE(L$18:L$18)"));
        assert_eq!(formulas.get_value((5, 3)).map(String::as_str), Some("ROUNDUP(D5/4,0)"));
    }

    #[test]
    fn test_empty_band_cells_are_text() {
        let (values, formulas) = read_back(render_xlsx(&sample_table(&[1.0])).unwrap());
        assert_eq!(values.get_value((3, 9)), Some(&Data::String("n/a".into())));
        assert!(formulas.get_value((3, 9)).map_or(true, |f| f.is_empty()));
    }

    #[test]
    fn test_every_data_cell_gets_band_fill() {
        let formats = ReportFormats::new();
        let values = [
            CellValue::Null,
            CellValue::Number(450000.0),
            CellValue::Text("Sandy".into()),
            CellValue::Bool(true),
        ];

        for band in Band::ALL {
            let fill = Format::new().set_background_color(Color::RGB(band_color(band)));
            for value in &values {
                assert_eq!(formats.row_format(band, value), &fill, "{} {:?}", band, value);
            }
            assert_eq!(
                formats.row_format(band, &CellValue::Date(45292.0)),
                &fill.set_num_format(DATE_FORMAT)
            );
        }
    }

    #[test]
    fn test_band_fills_differ() {
        let formats = ReportFormats::new();
        let value = CellValue::Null;
        for pair in Band::ALL.windows(2) {
            assert_ne!(formats.row_format(pair[0], &value), formats.row_format(pair[1], &value));
        }
    }

    #[test]
    fn test_null_cells_written_blank_inside_data_block() {
        // Only the price is set; the other 14 allowlist columns are null.
        let table = sample_table(&[300000.0]);
        let (values, _) = read_back(render_xlsx(&table).unwrap());

        assert_eq!(values.get_value((14, 11)), Some(&Data::Float(300000.0)));
        assert_eq!(values.get_value((14, 2)), Some(&Data::Empty));
        assert_eq!(values.get_value((14, 16)), Some(&Data::Empty));
    }

    #[test]
    fn test_bad_sheet_name_is_write_failure() {
        let mut table = sample_table(&[1.0]);
        table.sheet_name = "bad[name]".to_string();
        let err = render_xlsx(&table).unwrap_err();
        assert!(matches!(err, ReportError::WriteFailure(_)));
    }

    #[test]
    fn test_write_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        write_xlsx(&sample_table(&[5.0, 4.0]), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_output_file_name() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(output_file_name(today), "Existing_Comps_Transformed_2025-01-15.xlsx");
    }
}
