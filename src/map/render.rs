//! Render palette index derivation

use super::grid::{Grid, TileGrid};
use crate::types::TileCode;

/// Combined tile bytes in palette order. A cell's render index is its
/// position in this table.
pub const RENDER_TABLE: [u8; 25] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, // single tiles
    0x23, 0x32, 0x47, 0x65, // straight over straight, curve over curve
    0x43, 0x53, 0x63, 0x73, // curve over vertical
    0x42, 0x52, 0x62, 0x72, // curve over horizontal
    0x08, // crossover
    0x67, 0x54, 0x46, 0x75, // remaining curve pairs
];

/// Palette indices for a tile grid.
pub type RenderGrid = Grid<u8>;

/// Palette index of a cell. Combinations without a palette entry render empty.
pub fn render_index(code: TileCode) -> u8 {
    RENDER_TABLE.iter().position(|&byte| byte == code.value()).unwrap_or(0) as u8
}

pub fn render_indexes(grid: &TileGrid) -> RenderGrid {
    grid.map(render_index)
}
