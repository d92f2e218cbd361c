//! Cell layout of the formatted comps sheet.
//!
//! ```text
//!      C                    D      H               I..L
//!  2   <title>
//!  3   <grouping label>                            1st..4th Quartile
//!  4                               Avg Sold Price  =AVERAGE(L$a:L$b) ...
//!  5   Count                N      Avg SF          ...
//!  6   Quartile Size        =ROUNDUP(D5/4,0)
//!  7   Criteria
//!  8   <criteria lines>
//! 11   Sorted by Sold Price
//! 14   <15 column headers, C..Q>
//! 15+  <one banded row per record>
//! ```
//!
//! Positions are 0-based (row, column) internally, as the xlsx writer
//! expects; formulas use 1-based A1 references.

use chrono::NaiveDate;

use crate::config::ReportConfig;
use crate::models::{allowlist_index, CellValue, Record, COLUMN_ALLOWLIST};
use crate::transform::quartile::{Band, BoundarySet};

/// First column of the data block (C).
pub const FIRST_DATA_COL: u16 = 2;

/// Row of the column headers (row 14).
pub const HEADER_ROW: u32 = 13;

/// First record row (row 15).
pub const FIRST_DATA_ROW: u32 = HEADER_ROW + 1;

/// Number of sheet rows above the first record, for 1-based formula ranges.
pub const ROW_OFFSET: u32 = FIRST_DATA_ROW;

/// Column holding the per-band statistic labels (H).
const STAT_LABEL_COL: u16 = 7;

/// Column of the first band's statistic (I); bands 2..4 follow.
const STAT_FIRST_BAND_COL: u16 = 8;

/// Row of the first statistic (row 4).
const STAT_FIRST_ROW: u32 = 3;

/// Rows available for criteria lines (rows 8..10).
pub const MAX_CRITERIA_LINES: usize = 3;

/// Text written in place of an average over an empty band.
pub const EMPTY_BAND_TEXT: &str = "n/a";

/// Widths of columns C..Q, in character units.
const COLUMN_WIDTHS: [f64; 15] = [
    12.0, 15.0, 10.0, 15.0, 12.0, 18.0, 18.0, 15.0, 12.0, 12.0, 15.0, 15.0, 18.0, 12.0, 15.0,
];

/// A per-band average shown in the metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatDefinition {
    pub label: &'static str,
    /// Allowlist column averaged
    pub column: &'static str,
}

/// Statistics in display order, one row each starting at row 4.
pub const STATISTICS: [StatDefinition; 7] = [
    StatDefinition { label: "Avg Sold Price", column: "Sold Price" },
    StatDefinition { label: "Avg SF", column: "Total Square Feet" },
    StatDefinition { label: "Avg Bed", column: "Total Bedrooms" },
    StatDefinition { label: "Avg Year Built", column: "Year Built" },
    StatDefinition { label: "Avg Acres", column: "Acres" },
    StatDefinition { label: "Avg DOM", column: "DOM" },
    StatDefinition { label: "Avg Price/SF", column: "Price Per Square Foot" },
];

impl StatDefinition {
    /// Sheet column letter the statistic averages over.
    pub fn column_letter(&self) -> String {
        let idx = allowlist_index(self.column).unwrap_or(0);
        column_letter(FIRST_DATA_COL + idx as u16)
    }
}

/// What a cell holds.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Value(CellValue),
    /// Formula text including the leading `=`
    Formula(String),
}

impl CellContent {
    fn text(s: impl Into<String>) -> Self {
        CellContent::Value(CellValue::Text(s.into()))
    }
}

/// Presentation of a metadata cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellStyle {
    pub bold: bool,
    pub font_size: Option<f64>,
    pub centered: bool,
}

impl CellStyle {
    pub const PLAIN: CellStyle = CellStyle { bold: false, font_size: None, centered: false };
    pub const BOLD: CellStyle = CellStyle { bold: true, font_size: None, centered: false };
    pub const TITLE: CellStyle = CellStyle { bold: true, font_size: Some(14.0), centered: false };
    pub const HEADING: CellStyle = CellStyle { bold: true, font_size: None, centered: true };
}

/// One positioned cell outside the data block.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputCell {
    pub row: u32,
    pub col: u16,
    pub content: CellContent,
    pub style: CellStyle,
}

impl OutputCell {
    /// A1 reference of the cell.
    pub fn reference(&self) -> String {
        cell_ref(self.row, self.col)
    }
}

/// One record row, tagged with its band for coloring.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub band: Band,
    /// Values in allowlist order
    pub values: Vec<CellValue>,
}

/// The complete plan of the output sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    pub sheet_name: String,
    /// Metadata block and header row
    pub cells: Vec<OutputCell>,
    /// Records, starting at [`FIRST_DATA_ROW`]
    pub rows: Vec<DataRow>,
    /// (column, width) pairs
    pub column_widths: Vec<(u16, f64)>,
    pub boundaries: BoundarySet,
}

impl OutputTable {
    /// Metadata/header cell at A1 reference `a1`.
    pub fn cell(&self, a1: &str) -> Option<&OutputCell> {
        self.cells.iter().find(|c| c.reference() == a1)
    }

    /// 1-based sheet row of the record at `rank`.
    pub fn sheet_row(rank: usize) -> u32 {
        ROW_OFFSET + rank as u32 + 1
    }

    /// Last used 1-based row.
    pub fn last_row(&self) -> u32 {
        ROW_OFFSET + self.rows.len() as u32
    }
}

/// Lay out `sorted` (already filtered and sorted) into the report sheet.
pub fn build_output_table(
    sorted: &[Record],
    boundaries: &BoundarySet,
    config: &ReportConfig,
    today: NaiveDate,
) -> OutputTable {
    let mut cells = Vec::new();
    let mut put = |row: u32, col: u16, content: CellContent, style: CellStyle| {
        cells.push(OutputCell { row, col, content, style });
    };

    put(1, 2, CellContent::text(&config.title), CellStyle::TITLE);
    put(2, 2, CellContent::text(config.grouping_label(today)), CellStyle::BOLD);
    for band in Band::ALL {
        put(
            2,
            STAT_FIRST_BAND_COL + band.index() as u16,
            CellContent::text(band.heading()),
            CellStyle::HEADING,
        );
    }

    put(4, 2, CellContent::text("Count"), CellStyle::PLAIN);
    put(4, 3, CellContent::Value(CellValue::Number(sorted.len() as f64)), CellStyle::PLAIN);
    put(5, 2, CellContent::text("Quartile Size"), CellStyle::PLAIN);
    put(5, 3, CellContent::Formula("=ROUNDUP(D5/4,0)".to_string()), CellStyle::PLAIN);

    put(6, 2, CellContent::text("Criteria"), CellStyle::PLAIN);
    for (i, line) in config.criteria.iter().take(MAX_CRITERIA_LINES).enumerate() {
        put(7 + i as u32, 2, CellContent::text(line), CellStyle::PLAIN);
    }
    put(10, 2, CellContent::text("Sorted by Sold Price"), CellStyle::BOLD);

    for (i, stat) in STATISTICS.iter().enumerate() {
        let row = STAT_FIRST_ROW + i as u32;
        put(row, STAT_LABEL_COL, CellContent::text(stat.label), CellStyle::BOLD);

        let letter = stat.column_letter();
        for band in Band::ALL {
            let content = match band_row_span(boundaries, band) {
                Some(span) => CellContent::Formula(average_formula(&letter, span)),
                None => CellContent::text(EMPTY_BAND_TEXT),
            };
            put(row, STAT_FIRST_BAND_COL + band.index() as u16, content, CellStyle::PLAIN);
        }
    }

    for (i, name) in COLUMN_ALLOWLIST.iter().enumerate() {
        put(HEADER_ROW, FIRST_DATA_COL + i as u16, CellContent::text(*name), CellStyle::BOLD);
    }

    let rows = sorted
        .iter()
        .enumerate()
        .map(|(rank, record)| DataRow {
            band: boundaries.band_for_rank(rank),
            values: COLUMN_ALLOWLIST
                .iter()
                .map(|col| record.get(col).cloned().unwrap_or_default())
                .collect(),
        })
        .collect();

    let column_widths = COLUMN_WIDTHS
        .iter()
        .enumerate()
        .map(|(i, w)| (FIRST_DATA_COL + i as u16, *w))
        .collect();

    OutputTable {
        sheet_name: config.output_sheet.clone(),
        cells,
        rows,
        column_widths,
        boundaries: *boundaries,
    }
}

/// Inclusive 1-based sheet rows owned by `band`, or `None` when empty.
pub fn band_row_span(boundaries: &BoundarySet, band: Band) -> Option<(u32, u32)> {
    let range = boundaries.range(band);
    if range.is_empty() {
        return None;
    }
    Some((OutputTable::sheet_row(range.start), ROW_OFFSET + range.end as u32))
}

/// `=AVERAGE(L$15:L$17)` style formula with row-anchored references.
pub fn average_formula(letter: &str, (first, last): (u32, u32)) -> String {
    format!("=AVERAGE({l}${a}:{l}${b})", l = letter, a = first, b = last)
}

/// Column letter for a 0-based column index (0 = A, 26 = AA).
pub fn column_letter(col: u16) -> String {
    let mut n = col as u32 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A1 reference for a 0-based (row, column).
pub fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", column_letter(col), row + 1)
}
