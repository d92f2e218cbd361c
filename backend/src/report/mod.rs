//! Formatted report generation.
//!
//! - Layout: the cell-by-cell plan of the output sheet (metadata block,
//!   quartile formulas, header row, banded data rows)
//! - Palette: band to fill color
//! - Writer: serialization of the plan to `.xlsx`

pub mod layout;
pub mod palette;
pub mod writer;

pub use layout::{
    build_output_table, cell_ref, column_letter, CellContent, CellStyle, DataRow, OutputCell,
    OutputTable, StatDefinition, STATISTICS,
};
pub use palette::{band_color, band_color_hex, QUARTILE_PALETTE};
pub use writer::{output_file_name, render_xlsx, write_xlsx};
