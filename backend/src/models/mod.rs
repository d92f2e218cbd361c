//! Domain models for the comps transformation pipeline.
//!
//! - [`CellValue`] - Raw value of one spreadsheet cell
//! - [`Record`] - One listing row, keyed by column name in column order
//! - [`COLUMN_ALLOWLIST`] - The columns retained in the formatted output

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

// =============================================================================
// Column Allowlist
// =============================================================================

/// Column holding the sale price every record is ranked by.
pub const SALE_PRICE_COLUMN: &str = "Sold Price";

/// Columns kept from the raw export, in output order (left to right).
pub const COLUMN_ALLOWLIST: [&str; 15] = [
    "Acres",
    "City",
    "DOM",
    "Garage Capacity",
    "List Price",
    "Original List Price",
    "Price Per Square Foot",
    "Sold Concessions",
    "Sold Date",
    SALE_PRICE_COLUMN,
    "Total Bedrooms",
    "Total Bathrooms",
    "Total Square Feet",
    "Year Built",
    "Property Type",
];

/// Position of `name` within [`COLUMN_ALLOWLIST`].
pub fn allowlist_index(name: &str) -> Option<usize> {
    COLUMN_ALLOWLIST.iter().position(|c| *c == name)
}

// =============================================================================
// Cell Value
// =============================================================================

/// Raw value of a cell, as encoded by the source workbook.
///
/// Dates keep their spreadsheet serial number so they can be written back
/// as dates without loss.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty or absent cell.
    #[default]
    Null,
    /// Numeric cell (integers are widened).
    Number(f64),
    /// Any text.
    Text(String),
    /// Boolean cell.
    Bool(bool),
    /// Date/time cell, as a 1900-system serial number.
    Date(f64),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the value, for ranking.
    ///
    /// Numbers are returned as-is. Text is parsed leniently: surrounding
    /// whitespace, `$` and thousands separators are ignored. Everything
    /// else, and any non-finite result, yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => parse_leading_float(s)?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Date(serial) => match serial_to_datetime(*serial) {
                Some(dt) if dt.time() == chrono::NaiveTime::MIN => write!(f, "{}", dt.date()),
                Some(dt) => write!(f, "{}", dt),
                None => write!(f, "{}", serial),
            },
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Date(_) => serializer.collect_str(self),
        }
    }
}

/// Parse the longest numeric prefix of `s`, the way a spreadsheet user
/// would read "$450,000", "450000 (est)" or "1.5e6".
fn parse_leading_float(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    let bytes = cleaned.as_bytes();

    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'+' | b'-' if end == 0 => {}
            b'.' if !seen_dot => seen_dot = true,
            b'0'..=b'9' => seen_digit = true,
            _ => break,
        }
        end += 1;
    }

    // Exponent only counts when at least one digit follows it.
    if seen_digit && matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits = bytes[exp_end..].iter().take_while(|b| b.is_ascii_digit()).count();
        if digits > 0 {
            end = exp_end + digits;
        }
    }

    if !seen_digit {
        return None;
    }
    cleaned[..end].parse::<f64>().ok()
}

/// Convert a 1900-system spreadsheet serial to a date-time.
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

// =============================================================================
// Record
// =============================================================================

/// One listing: column name to raw value, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column` to `value`, keeping the column's original position if
    /// it already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        let column = column.into();
        match self.fields.iter_mut().find(|(k, _)| *k == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Value of `column`, or `None` when the key is absent.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
