//! Vehicle notification protocol.
//!
//! Every notification the vehicle sends starts with a size byte followed by
//! a message id. Multi-byte fields are little-endian. Only the
//! vehicle-to-controller messages needed for mapping and status are decoded;
//! everything else surfaces as [`VehicleMessage::Unrecognized`].
//!
//! ```rust
//! use overdrive::protocol::VehicleMessage;
//!
//! let message = VehicleMessage::decode(&[0x03, 0x1b, 0x68, 0x10])?;
//! assert_eq!(message, VehicleMessage::BatteryLevel(4200));
//! # Ok::<(), overdrive::TrackError>(())
//! ```

mod lane;
mod message;

pub use lane::start_line_lane_offset;
pub use message::{FULL_BATTERY_LEVEL, VehicleMessage, battery_percent, ids};
