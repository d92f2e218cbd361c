//! Quartile transformation.
//!
//! This module turns ingested records into the banded report:
//! - Columns: allowlist filtering with explicit nulls
//! - Quartile: price ranking, boundary computation and band assignment
//! - Stats: price range and per-band averages for the summary
//! - Pipeline: end-to-end orchestration with progress reporting

pub mod columns;
pub mod pipeline;
pub mod quartile;
pub mod stats;

pub use columns::{filter_columns, filter_records};
pub use pipeline::*;
pub use quartile::{band_for_rank, parse_price, sort_by_price_desc, Band, BoundarySet};
pub use stats::{format_currency, summarize, BandSummary, StatisticsSummary};
