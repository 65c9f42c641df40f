//! Lane offsets reported on the start/finish piece

/// Offset from road center in mm for each lane of the start/finish piece,
/// left to right. The piece reports two location ids per lane.
const START_LINE_LANES: [f32; 16] = [
    -72.5, -63.4, -54.4, -45.3, -36.3, -27.2, -18.1, -9.0, 0.0, 9.0, 18.1, 27.2, 36.3, 45.3, 54.4,
    63.4,
];

/// Lane offset for a location id reported while on the start/finish piece.
/// Ids beyond the last lane have no offset.
pub fn start_line_lane_offset(location: u8) -> Option<f32> {
    START_LINE_LANES.get(usize::from(location) / 2).copied()
}
