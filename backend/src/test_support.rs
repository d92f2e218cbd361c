//! Workbook fixtures for unit tests, built in memory with `rust_xlsxwriter`.

use rust_xlsxwriter::{Format, Workbook};

use crate::models::{CellValue, Record, SALE_PRICE_COLUMN};

#[derive(Debug, Clone)]
pub enum Cell {
    Empty,
    Str(String),
    Num(f64),
    Date(f64),
}

impl Cell {
    pub fn s(v: &str) -> Self {
        Cell::Str(v.to_string())
    }

    pub fn n(v: f64) -> Self {
        Cell::Num(v)
    }

    pub fn d(serial: f64) -> Self {
        Cell::Date(serial)
    }
}

pub struct SheetFixture {
    name: String,
    rows: Vec<Vec<Cell>>,
}

pub fn sheet(name: &str, rows: Vec<Vec<Cell>>) -> SheetFixture {
    SheetFixture {
        name: name.to_string(),
        rows,
    }
}

pub fn workbook_bytes(sheets: &[SheetFixture]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("m/d/yyyy");

    for fixture in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&fixture.name).unwrap();
        for (r, row) in fixture.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match cell {
                    Cell::Empty => {}
                    Cell::Str(s) => {
                        worksheet.write_string(r, c, s).unwrap();
                    }
                    Cell::Num(n) => {
                        worksheet.write_number(r, c, *n).unwrap();
                    }
                    Cell::Date(serial) => {
                        worksheet.write_number_with_format(r, c, *serial, &date_format).unwrap();
                    }
                }
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// A record carrying only a sale price plus an identifying city.
pub fn priced(city: &str, price: CellValue) -> Record {
    vec![
        ("City", CellValue::Text(city.to_string())),
        (SALE_PRICE_COLUMN, price),
        ("MLS #", CellValue::Text(format!("MLS-{}", city))),
    ]
    .into_iter()
    .collect()
}

/// Records with the given numeric prices, named `r0`, `r1`, ...
pub fn priced_records(prices: &[f64]) -> Vec<Record> {
    prices
        .iter()
        .enumerate()
        .map(|(i, p)| priced(&format!("r{}", i), CellValue::Number(*p)))
        .collect()
}
