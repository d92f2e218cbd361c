//! Price ranking and quartile band assignment.
//!
//! Bands are positional: after sorting by sale price (highest first), the
//! record at rank `i` falls in a band determined only by `i` and the record
//! count. Ties at a boundary get no special treatment.

use serde::Serialize;
use std::cmp::Ordering;
use std::ops::Range;

use crate::models::{Record, SALE_PRICE_COLUMN};

/// One of the four quartile bands, highest prices first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Band {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Band {
    pub const ALL: [Band; 4] = [Band::Q1, Band::Q2, Band::Q3, Band::Q4];

    /// 1-based band number.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// 0-based band index.
    pub fn index(self) -> usize {
        match self {
            Band::Q1 => 0,
            Band::Q2 => 1,
            Band::Q3 => 2,
            Band::Q4 => 3,
        }
    }

    /// Column heading used in the report, e.g. "1st Quartile".
    pub fn heading(self) -> &'static str {
        match self {
            Band::Q1 => "1st Quartile",
            Band::Q2 => "2nd Quartile",
            Band::Q3 => "3rd Quartile",
            Band::Q4 => "4th Quartile",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

/// Cutoff ranks for a sorted sequence of `total` records.
///
/// `q_size = ceil(total / 4)` and `qk_end = k * q_size`. The raw ends may
/// exceed `total` for small counts; [`BoundarySet::range`] clamps them, so
/// an overflowing band is simply empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundarySet {
    pub q_size: usize,
    pub q1_end: usize,
    pub q2_end: usize,
    pub q3_end: usize,
    pub total: usize,
}

impl BoundarySet {
    pub fn new(total: usize) -> Self {
        let q_size = total.div_ceil(4);
        Self {
            q_size,
            q1_end: q_size,
            q2_end: 2 * q_size,
            q3_end: 3 * q_size,
            total,
        }
    }

    /// Band of the record at zero-based `rank`.
    pub fn band_for_rank(&self, rank: usize) -> Band {
        if rank < self.q1_end {
            Band::Q1
        } else if rank < self.q2_end {
            Band::Q2
        } else if rank < self.q3_end {
            Band::Q3
        } else {
            Band::Q4
        }
    }

    /// Ranks owned by `band`, clamped to `total`. May be empty.
    pub fn range(&self, band: Band) -> Range<usize> {
        let (start, end) = match band {
            Band::Q1 => (0, self.q1_end),
            Band::Q2 => (self.q1_end, self.q2_end),
            Band::Q3 => (self.q2_end, self.q3_end),
            Band::Q4 => (self.q3_end, self.total),
        };
        start.min(self.total)..end.min(self.total)
    }

    /// Number of records in `band`; band 4 holds `max(0, total - q3_end)`.
    pub fn len(&self, band: Band) -> usize {
        self.range(band).len()
    }

    pub fn sizes(&self) -> [usize; 4] {
        Band::ALL.map(|b| self.len(b))
    }
}

/// Band of zero-based `rank` among `total` sorted records.
pub fn band_for_rank(rank: usize, total: usize) -> Band {
    BoundarySet::new(total).band_for_rank(rank)
}

/// Sale price of `record`; absent or unparsable prices count as `0`.
pub fn parse_price(record: &Record) -> f64 {
    record
        .get(SALE_PRICE_COLUMN)
        .and_then(|v| v.as_number())
        .unwrap_or(0.0)
}

/// Stable sort, highest sale price first. Equal prices keep input order.
pub fn sort_by_price_desc(records: Vec<Record>) -> Vec<Record> {
    let mut keyed: Vec<(f64, Record)> = records
        .into_iter()
        .map(|r| (parse_price(&r), r))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    keyed.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;
    use crate::test_support::{priced, priced_records};

    fn cities(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.get("City").map(|v| v.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_boundaries_sum_to_total() {
        for n in 1..=200 {
            let b = BoundarySet::new(n);
            let (q1, q2, q3, total) = (b.q1_end as i64, b.q2_end as i64, b.q3_end as i64, n as i64);
            assert_eq!(q1 + (q2 - q1) + (q3 - q2) + (total - q3), total);
            assert_eq!(b.sizes().iter().sum::<usize>(), n, "n = {}", n);
            if n % 4 == 0 {
                assert_eq!(b.q1_end, n / 4);
                assert_eq!(b.q2_end - b.q1_end, n / 4);
                assert_eq!(b.q3_end - b.q2_end, n / 4);
                assert_eq!(b.sizes(), [n / 4; 4]);
            }
        }
    }

    #[test]
    fn test_band_sizes_examples() {
        assert_eq!(BoundarySet::new(10).q_size, 3);
        assert_eq!(BoundarySet::new(10).sizes(), [3, 3, 3, 1]);
        assert_eq!(BoundarySet::new(8).sizes(), [2, 2, 2, 2]);
        assert_eq!(BoundarySet::new(1).sizes(), [1, 0, 0, 0]);
        assert_eq!(BoundarySet::new(2).sizes(), [1, 1, 0, 0]);
        assert_eq!(BoundarySet::new(5).sizes(), [2, 2, 1, 0]);
        assert_eq!(BoundarySet::new(9).sizes(), [3, 3, 3, 0]);
    }

    #[test]
    fn test_band_ranges_for_ten() {
        let b = BoundarySet::new(10);
        assert_eq!(b.range(Band::Q1), 0..3);
        assert_eq!(b.range(Band::Q2), 3..6);
        assert_eq!(b.range(Band::Q3), 6..9);
        assert_eq!(b.range(Band::Q4), 9..10);
    }

    #[test]
    fn test_band_for_rank_matches_ranges() {
        for n in 1..=50 {
            let b = BoundarySet::new(n);
            for rank in 0..n {
                let band = band_for_rank(rank, n);
                assert!(b.range(band).contains(&rank), "n = {}, rank = {}", n, rank);
                assert_eq!(band, b.band_for_rank(rank));
            }
        }
    }

    #[test]
    fn test_band_numbering() {
        assert_eq!(Band::Q1.number(), 1);
        assert_eq!(Band::Q4.number(), 4);
        assert_eq!(Band::Q2.heading(), "2nd Quartile");
        assert_eq!(Band::Q3.to_string(), "Q3");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(&priced("a", CellValue::Number(410000.0))), 410000.0);
        assert_eq!(parse_price(&priced("a", CellValue::Text("$389,900".into()))), 389900.0);
        assert_eq!(parse_price(&priced("a", CellValue::Text("TBD".into()))), 0.0);
        assert_eq!(parse_price(&priced("a", CellValue::Null)), 0.0);
        assert_eq!(parse_price(&Record::new()), 0.0);
    }

    #[test]
    fn test_sort_descending() {
        let sorted = sort_by_price_desc(priced_records(&[100.0, 500.0, 300.0, 400.0]));
        let prices: Vec<f64> = sorted.iter().map(parse_price).collect();
        assert_eq!(prices, vec![500.0, 400.0, 300.0, 100.0]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let records = vec![
            priced("first", CellValue::Number(300.0)),
            priced("high", CellValue::Number(900.0)),
            priced("second", CellValue::Number(300.0)),
            priced("blank", CellValue::Null),
            priced("third", CellValue::Text("300".into())),
            priced("junk", CellValue::Text("n/a".into())),
        ];

        let sorted = sort_by_price_desc(records);
        assert_eq!(
            cities(&sorted),
            vec!["high", "first", "second", "third", "blank", "junk"]
        );
    }

    #[test]
    fn test_sort_is_deterministic() {
        let records = priced_records(&[5.0, 1.0, 5.0, 3.0, 1.0, 5.0]);
        let a = sort_by_price_desc(records.clone());
        let b = sort_by_price_desc(records);
        assert_eq!(a, b);
    }
}
