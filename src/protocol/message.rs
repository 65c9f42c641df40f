//! Vehicle to controller message decoding

use serde::Serialize;

use crate::types::{CLOCKWISE_SENTINEL, PositionEvent, TransitionEvent};
use crate::{Result, TrackError};

/// Message identifiers sent by the vehicle.
pub mod ids {
    pub const PING_RESPONSE: u8 = 0x17;
    pub const VERSION_RESPONSE: u8 = 0x19;
    pub const BATTERY_LEVEL_RESPONSE: u8 = 0x1b;
    pub const POSITION_UPDATE: u8 = 0x27;
    pub const TRANSITION_UPDATE: u8 = 0x29;
    pub const INTERSECTION_UPDATE: u8 = 0x2a;
    pub const VEHICLE_DELOCALIZED: u8 = 0x2b;
    pub const OFFSET_FROM_ROAD_CENTER: u8 = 0x2d;
}

/// Battery reading corresponding to a full charge, in millivolts.
pub const FULL_BATTERY_LEVEL: u16 = 4200;

/// Byte offsets of the wheel distances inside a transition update.
const LEFT_WHEEL_OFFSET: usize = 16;
const RIGHT_WHEEL_OFFSET: usize = 17;

/// A decoded vehicle notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum VehicleMessage {
    PingResponse,
    Version(u16),
    BatteryLevel(u16),
    PositionUpdate {
        /// Location id within the piece. On the start/finish piece this
        /// encodes the lane.
        location: u8,
        piece_id: u8,
        /// Offset from road center in mm.
        offset: f32,
        /// Speed in mm/s.
        speed: u16,
        clockwise: bool,
    },
    Transition(TransitionEvent),
    Delocalized,
    OffsetUpdate(f32),
    /// Any message id this decoder does not interpret.
    Unrecognized { id: u8 },
}

impl VehicleMessage {
    /// Decode one raw notification.
    ///
    /// Byte 0 is the message size and byte 1 the message id. Transition
    /// updates never fail: undersized ones decode with zero wheel distances
    /// and the mapper drops them.
    pub fn decode(bytes: &[u8]) -> Result<VehicleMessage> {
        if bytes.len() < 2 {
            return Err(TrackError::parse_error(
                "Vehicle message",
                format!("need at least 2 bytes for size and id, have {}", bytes.len()),
            ));
        }

        let message = match bytes[1] {
            ids::PING_RESPONSE => VehicleMessage::PingResponse,
            ids::VERSION_RESPONSE => VehicleMessage::Version(parse_u16_le(bytes, 2, "Version response")?),
            ids::BATTERY_LEVEL_RESPONSE => {
                VehicleMessage::BatteryLevel(parse_u16_le(bytes, 2, "Battery level response")?)
            }
            ids::POSITION_UPDATE => {
                let context = "Position update";
                VehicleMessage::PositionUpdate {
                    location: parse_u8(bytes, 2, context)?,
                    piece_id: parse_u8(bytes, 3, context)?,
                    offset: parse_f32_le(bytes, 4, context)?,
                    speed: parse_u16_le(bytes, 8, context)?,
                    clockwise: parse_u8(bytes, 10, context)? == CLOCKWISE_SENTINEL,
                }
            }
            ids::TRANSITION_UPDATE => VehicleMessage::Transition(TransitionEvent {
                payload_len: bytes.len(),
                left_wheel_distance: bytes.get(LEFT_WHEEL_OFFSET).copied().unwrap_or(0),
                right_wheel_distance: bytes.get(RIGHT_WHEEL_OFFSET).copied().unwrap_or(0),
            }),
            ids::VEHICLE_DELOCALIZED => VehicleMessage::Delocalized,
            ids::OFFSET_FROM_ROAD_CENTER => {
                VehicleMessage::OffsetUpdate(parse_f32_le(bytes, 2, "Offset from road center")?)
            }
            id => VehicleMessage::Unrecognized { id },
        };

        Ok(message)
    }

    /// The message id this variant was decoded from.
    pub fn id(&self) -> u8 {
        match self {
            VehicleMessage::PingResponse => ids::PING_RESPONSE,
            VehicleMessage::Version(_) => ids::VERSION_RESPONSE,
            VehicleMessage::BatteryLevel(_) => ids::BATTERY_LEVEL_RESPONSE,
            VehicleMessage::PositionUpdate { .. } => ids::POSITION_UPDATE,
            VehicleMessage::Transition(_) => ids::TRANSITION_UPDATE,
            VehicleMessage::Delocalized => ids::VEHICLE_DELOCALIZED,
            VehicleMessage::OffsetUpdate(_) => ids::OFFSET_FROM_ROAD_CENTER,
            VehicleMessage::Unrecognized { id } => *id,
        }
    }

    /// Position event for the mapper, if this is a position update.
    pub fn position_event(&self) -> Option<PositionEvent> {
        match *self {
            VehicleMessage::PositionUpdate { piece_id, clockwise, .. } => {
                Some(PositionEvent::new(piece_id, clockwise))
            }
            _ => None,
        }
    }
}

/// Battery charge in whole percent, truncated. Readings above a full charge
/// report more than 100.
pub fn battery_percent(level: u16) -> u32 {
    u32::from(level) * 100 / u32::from(FULL_BATTERY_LEVEL)
}

fn insufficient(context: &str, what: &str, offset: usize, need: usize, data: &[u8]) -> TrackError {
    TrackError::parse_error(
        context,
        format!(
            "Insufficient data for {} at offset {} (need {} bytes, have {})",
            what,
            offset,
            need,
            data.len().saturating_sub(offset)
        ),
    )
}

fn parse_u8(data: &[u8], offset: usize, context: &str) -> Result<u8> {
    data.get(offset).copied().ok_or_else(|| insufficient(context, "u8", offset, 1, data))
}

fn parse_u16_le(data: &[u8], offset: usize, context: &str) -> Result<u16> {
    if offset + 2 > data.len() {
        return Err(insufficient(context, "u16", offset, 2, data));
    }
    Ok(u16::from_le_bytes([data[offset], data[offset + 1]]))
}

fn parse_f32_le(data: &[u8], offset: usize, context: &str) -> Result<f32> {
    if offset + 4 > data.len() {
        return Err(insufficient(context, "f32", offset, 4, data));
    }
    Ok(f32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]))
}
