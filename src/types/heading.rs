//! Cursor heading on the reconstructed track grid

use serde::{Deserialize, Serialize};

/// Direction of travel of the mapping cursor.
///
/// Discriminants match the wire order used by the motion tables
/// (North=0, East=1, South=2, West=3). North is towards row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Heading {
    #[default]
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Heading {
    /// All headings in discriminant order.
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    /// Unit grid step `(dx, dy)` for one piece travelled in this heading.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::North => (0, -1),
            Heading::East => (1, 0),
            Heading::South => (0, 1),
            Heading::West => (-1, 0),
        }
    }

    /// Heading after a quarter turn.
    pub fn turned(self, clockwise: bool) -> Heading {
        let offset = if clockwise { 1 } else { 3 };
        Heading::ALL[(self as usize + offset) % 4]
    }
}
