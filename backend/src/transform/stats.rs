//! Summary statistics shown to the caller after a transform.

use serde::Serialize;

use super::quartile::{parse_price, Band, BoundarySet};
use crate::models::Record;
use crate::report::palette::band_color_hex;

/// Per-band figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandSummary {
    /// 1-based band number
    pub band: u8,
    /// Number of records in the band
    pub size: usize,
    /// Mean sale price rounded to the nearest dollar; `None` when empty
    pub average_price: Option<i64>,
    /// Fill color of the band's rows, `RRGGBB`
    pub color: String,
}

impl BandSummary {
    /// Average formatted as currency, or `n/a` for an empty band.
    pub fn average_label(&self) -> String {
        match self.average_price {
            Some(avg) => format_currency(avg as f64),
            None => "n/a".to_string(),
        }
    }
}

/// What the caller displays once the transform succeeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub record_count: usize,
    pub min_price: f64,
    pub max_price: f64,
    /// e.g. `$100,000 - $500,000`
    pub price_range: String,
    pub quartile_size: usize,
    /// e.g. `Q1:3, Q2:3, Q3:3, Q4:1`
    pub quartile_sizes: String,
    pub bands: Vec<BandSummary>,
}

/// Compute the summary for records already sorted by price.
pub fn summarize(sorted: &[Record], boundaries: &BoundarySet) -> StatisticsSummary {
    let prices: Vec<f64> = sorted.iter().map(parse_price).collect();

    let (min_price, max_price) = if prices.is_empty() {
        (0.0, 0.0)
    } else {
        prices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(*p), hi.max(*p)))
    };

    let bands: Vec<BandSummary> = Band::ALL
        .iter()
        .map(|band| {
            let range = boundaries.range(*band);
            BandSummary {
                band: band.number(),
                size: range.len(),
                average_price: rounded_mean(&prices[range]),
                color: band_color_hex(*band),
            }
        })
        .collect();

    let quartile_sizes = bands
        .iter()
        .map(|b| format!("Q{}:{}", b.band, b.size))
        .collect::<Vec<_>>()
        .join(", ");

    StatisticsSummary {
        record_count: sorted.len(),
        min_price,
        max_price,
        price_range: format!("{} - {}", format_currency(min_price), format_currency(max_price)),
        quartile_size: boundaries.q_size,
        quartile_sizes,
        bands,
    }
}

fn rounded_mean(values: &[f64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(mean.round() as i64)
}

/// Whole-dollar currency with thousands separators: `$1,234,567`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}
