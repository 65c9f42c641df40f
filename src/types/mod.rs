//! Core types for vehicle telemetry and track reconstruction.
//!
//! ## Architecture
//!
//! - [`Notification`] is one raw packet from the vehicle, shared zero-copy via Arc
//! - [`TransitionEvent`] and [`PositionEvent`] are the two localization events
//!   the [`TrackMapper`](crate::map::TrackMapper) pairs up
//! - [`classify`] maps raw piece identifiers to a [`PieceKind`]
//! - [`Heading`] is the mapping cursor's direction of travel
//! - [`Tile`] and [`TileCode`] are the per-cell values of the reconstructed grid
//!
//! ## Usage Example
//!
//! ```rust
//! use overdrive::types::{classify, PieceKind, Tile, TileCode};
//!
//! assert_eq!(classify(36), PieceKind::Straight);
//! assert_eq!(classify(99), PieceKind::Unknown);
//!
//! // A straight bridged over by a second straight
//! let cell = TileCode::from(Tile::StraightHoriz).merge(Tile::StraightVert);
//! assert_eq!(cell.value(), 0x32);
//! ```

mod events;
mod heading;
mod notification;
mod piece;
mod tile;
mod update_rate;

pub use events::{
    CLOCKWISE_SENTINEL, MIN_TRANSITION_LEN, PositionEvent, TrackShape, TrackStyle,
    TransitionEvent,
};
pub use heading::Heading;
pub use notification::Notification;
pub use piece::{FINISH_PIECE_ID, PieceKind, START_PIECE_ID, classify};
pub use tile::{Tile, TileCode};
pub use update_rate::UpdateRate;
