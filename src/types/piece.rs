//! Track piece classification

use serde::{Deserialize, Serialize};

/// Abstract kind of a physical track piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Unknown,
    /// Start and finish pieces are mapped identically.
    StartFinish,
    Straight,
    Turn,
    Crossover,
}

/// Piece id reported on the start side of the start/finish straight.
pub const START_PIECE_ID: u8 = 33;

/// Piece id reported on the finish side of the start/finish straight.
pub const FINISH_PIECE_ID: u8 = 34;

/// Classify a raw piece identifier reported by the vehicle.
///
/// Jump (43) and landing (46) pieces map as straights. Every identifier not
/// listed maps to [`PieceKind::Unknown`].
pub fn classify(piece_id: u8) -> PieceKind {
    match piece_id {
        10 => PieceKind::Crossover,
        11 | 17 | 18 | 20 | 23 => PieceKind::Turn,
        START_PIECE_ID | FINISH_PIECE_ID => PieceKind::StartFinish,
        36 | 39 | 40 | 43 | 46 => PieceKind::Straight,
        _ => PieceKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_identifiers() {
        assert_eq!(classify(10), PieceKind::Crossover);
        for id in [11, 17, 18, 20, 23] {
            assert_eq!(classify(id), PieceKind::Turn, "piece {id}");
        }
        assert_eq!(classify(33), PieceKind::StartFinish);
        assert_eq!(classify(34), PieceKind::StartFinish);
        for id in [36, 39, 40, 43, 46] {
            assert_eq!(classify(id), PieceKind::Straight, "piece {id}");
        }
    }

    #[test]
    fn everything_else_is_unknown() {
        let known = [10, 11, 17, 18, 20, 23, 33, 34, 36, 39, 40, 43, 46];
        for id in 0..=u8::MAX {
            if !known.contains(&id) {
                assert_eq!(classify(id), PieceKind::Unknown, "piece {id}");
            }
        }
    }
}
