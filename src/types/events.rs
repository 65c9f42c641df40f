//! Localization events consumed by the track mapper

use serde::{Deserialize, Serialize};

/// Smallest transition payload that carries both wheel distances.
pub const MIN_TRANSITION_LEN: usize = 18;

/// Driving-direction byte value reported while moving clockwise.
pub const CLOCKWISE_SENTINEL: u8 = 0x47;

/// The vehicle crossed from one piece into the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Length of the raw notification the event was decoded from.
    pub payload_len: usize,
    pub left_wheel_distance: u8,
    pub right_wheel_distance: u8,
}

impl TransitionEvent {
    /// Undersized payloads are sent occasionally by the vehicle and carry no
    /// usable wheel distances.
    pub fn is_well_formed(&self) -> bool {
        self.payload_len >= MIN_TRANSITION_LEN
    }

    pub fn track_style(&self) -> TrackStyle {
        TrackStyle::from_wheel_distances(self.left_wheel_distance, self.right_wheel_distance)
    }
}

/// Identity of the piece the vehicle is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEvent {
    pub piece_id: u8,
    pub clockwise: bool,
}

impl PositionEvent {
    pub fn new(piece_id: u8, clockwise: bool) -> Self {
        Self { piece_id, clockwise }
    }

    /// Build from the raw driving-direction byte.
    pub fn from_direction_byte(piece_id: u8, direction: u8) -> Self {
        Self { piece_id, clockwise: direction == CLOCKWISE_SENTINEL }
    }
}

/// Shape of the piece just left, guessed from the distance each wheel
/// travelled on it. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackStyle {
    pub shape: TrackShape,
    /// The start/finish straight is shorter than every other piece.
    pub crossed_start_line: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackShape {
    Straight,
    LeftTurn,
    RightTurn,
}

impl TrackStyle {
    pub fn from_wheel_distances(left: u8, right: u8) -> Self {
        let shape = if left.abs_diff(right) < 3 {
            TrackShape::Straight
        } else if left < right {
            TrackShape::LeftTurn
        } else {
            TrackShape::RightTurn
        };

        let start_line = |d: u8| d > 0x19 && d < 0x25;
        Self { shape, crossed_start_line: start_line(left) && start_line(right) }
    }
}

impl std::fmt::Display for TrackStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = match self.shape {
            TrackShape::Straight => "Straight",
            TrackShape::LeftTurn => "Left Turn",
            TrackShape::RightTurn => "Right Turn",
        };
        if self.crossed_start_line {
            write!(f, "{shape} (Crossed Starting Line)")
        } else {
            f.write_str(shape)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_length_gate() {
        let short = TransitionEvent { payload_len: 10, left_wheel_distance: 0, right_wheel_distance: 0 };
        let full = TransitionEvent { payload_len: 19, ..short };
        assert!(!short.is_well_formed());
        assert!(full.is_well_formed());
        assert!(TransitionEvent { payload_len: MIN_TRANSITION_LEN, ..short }.is_well_formed());
    }

    #[test]
    fn track_style_from_wheels() {
        assert_eq!(TrackStyle::from_wheel_distances(0x37, 0x36).shape, TrackShape::Straight);
        assert_eq!(TrackStyle::from_wheel_distances(0x20, 0x40).shape, TrackShape::LeftTurn);
        assert_eq!(TrackStyle::from_wheel_distances(0x40, 0x20).shape, TrackShape::RightTurn);
    }

    #[test]
    fn start_line_is_short_on_both_wheels() {
        assert!(TrackStyle::from_wheel_distances(0x20, 0x21).crossed_start_line);
        assert!(!TrackStyle::from_wheel_distances(0x19, 0x20).crossed_start_line);
        assert!(!TrackStyle::from_wheel_distances(0x20, 0x25).crossed_start_line);
        assert_eq!(
            TrackStyle::from_wheel_distances(0x20, 0x21).to_string(),
            "Straight (Crossed Starting Line)"
        );
    }

    #[test]
    fn clockwise_from_direction_byte() {
        assert!(PositionEvent::from_direction_byte(17, 0x47).clockwise);
        assert!(!PositionEvent::from_direction_byte(17, 0x46).clockwise);
        assert!(!PositionEvent::from_direction_byte(17, 0x00).clockwise);
    }
}
