//! Track topology reconstruction.
//!
//! The vehicle never reports geometry. It reports a piece identifier and a
//! driving direction each time it crosses onto a new piece, and the
//! [`TrackMapper`] turns that sequence into a grid of [`Tile`](crate::types::Tile)s:
//!
//! - a cursor walks the grid one cell per piece, turning on curves;
//! - the grid grows in any direction the cursor leaves it;
//! - a second tile in an occupied cell is a bridge and is stacked in the
//!   high nibble, except on crossovers which never change;
//! - the second start line crossing closes the loop.
//!
//! [`render_indexes`] converts the raw grid into indices of a 25 entry tile
//! palette for image export.

mod grid;
mod mapper;
mod render;

pub use grid::{Grid, TileGrid};
pub use mapper::{
    Cursor, PairingPhase, PieceOutcome, ReconstructionState, TrackMapper, TrackSnapshot,
    UnknownPiecePolicy,
};
pub use render::{RENDER_TABLE, RenderGrid, render_index, render_indexes};
