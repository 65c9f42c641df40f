//! Test utilities for building raw vehicle notifications
//!
//! Builders produce byte layouts identical to what the vehicle sends, so
//! tests and benches exercise the real decoder.

#![cfg(any(test, feature = "benchmark"))]

use std::fmt::Write as _;

use crate::protocol::ids;
use crate::types::{CLOCKWISE_SENTINEL, START_PIECE_ID};

/// Pieces of a rectangular test track after the start line, ending with the
/// start line crossing that closes the loop.
pub const LAP: [(u8, bool); 8] = [
    (36, true),
    (17, true),
    (17, true),
    (36, true),
    (36, true),
    (17, true),
    (17, true),
    (START_PIECE_ID, true),
];

/// Render indexes of the completed [`LAP`].
pub const LAP_RENDER: [[u8; 4]; 2] = [[4, 1, 2, 5], [6, 2, 2, 7]];

/// Position update at `location` on `piece_id`, 300 mm/s on road center.
pub fn position_update(location: u8, piece_id: u8, clockwise: bool) -> Vec<u8> {
    let mut bytes = vec![0x10, ids::POSITION_UPDATE, location, piece_id];
    bytes.extend_from_slice(&0.0f32.to_le_bytes());
    bytes.extend_from_slice(&300u16.to_le_bytes());
    bytes.push(if clockwise { CLOCKWISE_SENTINEL } else { 0x46 });
    bytes.extend_from_slice(&[0; 6]);
    bytes
}

/// Full size transition update with the given wheel distances.
pub fn transition(left_wheel_distance: u8, right_wheel_distance: u8) -> Vec<u8> {
    let mut bytes = vec![0u8; 19];
    bytes[0] = 0x12;
    bytes[1] = ids::TRANSITION_UPDATE;
    bytes[16] = left_wheel_distance;
    bytes[17] = right_wheel_distance;
    bytes
}

/// Truncated transition as occasionally sent by the vehicle.
pub fn short_transition() -> Vec<u8> {
    vec![0x09, ids::TRANSITION_UPDATE, 0, 0, 0, 0, 0, 0, 0, 0]
}

pub fn battery(level: u16) -> Vec<u8> {
    let mut bytes = vec![0x03, ids::BATTERY_LEVEL_RESPONSE];
    bytes.extend_from_slice(&level.to_le_bytes());
    bytes
}

pub fn version(version: u16) -> Vec<u8> {
    let mut bytes = vec![0x03, ids::VERSION_RESPONSE];
    bytes.extend_from_slice(&version.to_le_bytes());
    bytes
}

pub fn offset_update(offset: f32) -> Vec<u8> {
    let mut bytes = vec![0x05, ids::OFFSET_FROM_ROAD_CENTER];
    bytes.extend_from_slice(&offset.to_le_bytes());
    bytes
}

pub fn delocalized() -> Vec<u8> {
    vec![0x01, ids::VEHICLE_DELOCALIZED]
}

/// Transition onto `piece_id` followed by the position update naming it.
pub fn paired_piece(piece_id: u8, clockwise: bool) -> Vec<Vec<u8>> {
    let (left, right) = if piece_id == START_PIECE_ID { (0x20, 0x21) } else { (0x36, 0x37) };
    vec![transition(left, right), position_update(0, piece_id, clockwise)]
}

/// A full mapping run over [`LAP`], with the noise a real vehicle produces:
/// status messages, positions before the start line, repeated positions
/// inside a piece and undersized transitions.
pub fn lap_notifications() -> Vec<Vec<u8>> {
    let mut notifications = vec![battery(3900), version(0x266e), position_update(0, 36, true)];
    notifications.extend(paired_piece(36, true));

    notifications.extend(paired_piece(START_PIECE_ID, true));
    notifications.push(position_update(1, START_PIECE_ID, true));

    for (i, &(piece_id, clockwise)) in LAP.iter().enumerate() {
        notifications.extend(paired_piece(piece_id, clockwise));
        notifications.push(position_update(2, piece_id, clockwise));
        if i % 3 == 0 {
            notifications.push(short_transition());
        }
    }
    notifications
}

/// Render notifications in capture file format.
pub fn capture_text(notifications: &[Vec<u8>]) -> String {
    let mut text = String::from("# generated capture\n");
    for bytes in notifications {
        let line: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let _ = writeln!(text, "{}", line.join(" "));
    }
    text
}
