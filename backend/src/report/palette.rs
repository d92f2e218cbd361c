//! Quartile fill colors, lightest (highest prices) to darkest.

use crate::transform::quartile::Band;

/// `RRGGBB` fills for bands 1 through 4.
pub const QUARTILE_PALETTE: [u32; 4] = [0xE2EFD9, 0xC5E0B3, 0xA8D08D, 0x548135];

pub fn band_color(band: Band) -> u32 {
    QUARTILE_PALETTE[band.index()]
}

pub fn band_color_hex(band: Band) -> String {
    format!("{:06X}", band_color(band))
}
