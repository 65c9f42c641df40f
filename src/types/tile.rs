//! Tile values stored in the reconstructed track grid

use serde::{Deserialize, Serialize};

/// A single track tile, encoded in four bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    Empty = 0x0,
    /// Always laid east-west, heading east.
    StartFinish = 0x1,
    StraightHoriz = 0x2,
    StraightVert = 0x3,
    /// North -> East (or West -> South).
    CurveNE = 0x4,
    /// East -> South (or North -> West).
    CurveES = 0x5,
    /// West -> North (or South -> East).
    CurveWN = 0x6,
    /// South -> West (or East -> North).
    CurveSW = 0x7,
    Crossover = 0x8,
}

impl Tile {
    /// Decode a nibble. Values above 8 are not tiles.
    pub fn from_nibble(nibble: u8) -> Option<Tile> {
        Some(match nibble {
            0x0 => Tile::Empty,
            0x1 => Tile::StartFinish,
            0x2 => Tile::StraightHoriz,
            0x3 => Tile::StraightVert,
            0x4 => Tile::CurveNE,
            0x5 => Tile::CurveES,
            0x6 => Tile::CurveWN,
            0x7 => Tile::CurveSW,
            0x8 => Tile::Crossover,
            _ => return None,
        })
    }
}

/// Contents of one grid cell.
///
/// The low nibble holds the tile laid on the first visit. When the track
/// passes over the same cell again at a different elevation the second tile
/// goes into the high nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileCode(pub u8);

impl TileCode {
    pub const EMPTY: TileCode = TileCode(0);

    /// Raw combined byte.
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn low(self) -> Option<Tile> {
        Tile::from_nibble(self.0 & 0x0F)
    }

    pub fn high(self) -> Option<Tile> {
        Tile::from_nibble(self.0 >> 4)
    }

    pub fn is_empty(self) -> bool {
        self.0 & 0x0F == 0
    }

    /// True when either elevation holds a crossover.
    pub fn is_crossover(self) -> bool {
        self.low() == Some(Tile::Crossover) || self.high() == Some(Tile::Crossover)
    }

    /// Lay `tile` into this cell.
    ///
    /// Empty cells take the tile in the low nibble. Occupied cells keep their
    /// low nibble and take the tile in the high nibble, replacing any previous
    /// upper tile. Crossover cells never change.
    pub fn merge(self, tile: Tile) -> TileCode {
        if self.is_crossover() {
            return self;
        }
        if self.is_empty() {
            TileCode(tile as u8)
        } else {
            TileCode(((tile as u8) << 4) | (self.0 & 0x0F))
        }
    }
}

impl From<Tile> for TileCode {
    fn from(tile: Tile) -> Self {
        TileCode(tile as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_into_empty_uses_low_nibble() {
        let code = TileCode::EMPTY.merge(Tile::CurveES);
        assert_eq!(code.value(), 0x05);
        assert_eq!(code.low(), Some(Tile::CurveES));
        assert_eq!(code.high(), Some(Tile::Empty));
    }

    #[test]
    fn merge_into_occupied_stacks_high_nibble() {
        let code = TileCode::from(Tile::StraightHoriz).merge(Tile::StraightVert);
        assert_eq!(code.value(), 0x32);

        // A third pass replaces the upper tile only.
        let code = code.merge(Tile::CurveNE);
        assert_eq!(code.value(), 0x42);
    }

    #[test]
    fn crossover_cells_are_immutable() {
        let code = TileCode::from(Tile::Crossover);
        for tile in [Tile::StraightHoriz, Tile::CurveWN, Tile::Crossover] {
            assert_eq!(code.merge(tile), code);
        }

        let stacked = TileCode::from(Tile::StraightVert).merge(Tile::Crossover);
        assert_eq!(stacked.value(), 0x83);
        assert_eq!(stacked.merge(Tile::StraightHoriz), stacked);
    }

    #[test]
    fn nibble_decoding() {
        for nibble in 0..=8 {
            assert_eq!(Tile::from_nibble(nibble).map(|t| t as u8), Some(nibble));
        }
        assert_eq!(Tile::from_nibble(9), None);
        assert_eq!(Tile::from_nibble(0xF), None);
    }
}
