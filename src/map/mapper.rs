//! Track topology reconstruction from localization events

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use super::grid::TileGrid;
use super::render::{RenderGrid, render_indexes};
use crate::types::{Heading, PieceKind, PositionEvent, Tile, TransitionEvent, classify};

/// Where the mapping cursor is and which way it faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
    pub heading: Heading,
}

/// Lap progress of a reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReconstructionState {
    /// The start line has been crossed once.
    pub started: bool,
    /// The start line has been crossed again, closing the loop.
    pub done: bool,
}

/// Which localization event the mapper expects next.
///
/// | phase                | transition           | position                         |
/// |----------------------|----------------------|----------------------------------|
/// | `AwaitingTransition` | arm (if well formed) | ignored, motion inside the piece |
/// | `AwaitingPosition`   | stays armed          | disarm and apply the piece       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PairingPhase {
    #[default]
    AwaitingTransition,
    AwaitingPosition,
}

/// What to do with the cursor when a piece id is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPiecePolicy {
    /// Leave grid and cursor untouched. Subsequent pieces stack into the
    /// cell the unknown piece should have occupied.
    #[default]
    Hold,
    /// Step the cursor one cell in the current heading without laying a tile.
    Advance,
}

/// Result of applying one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PieceOutcome {
    /// Telemetry before the first start line crossing.
    BeforeStart,
    /// First start line crossing; the start tile was laid.
    StartLine,
    /// Start line crossed again. Nothing was laid and the cursor did not move.
    LoopClosed,
    /// The map is already complete. Nothing changes until the mapper is reset.
    AfterDone,
    Placed { tile: Tile, x: usize, y: usize },
    UnknownPiece { piece_id: u8, advanced: bool },
}

/// Point-in-time copy of a reconstruction, ready for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub grid: TileGrid,
    pub render: RenderGrid,
    pub cursor: Cursor,
    pub state: ReconstructionState,
    pub pieces_applied: u64,
    pub unknown_pieces: u64,
}

/// Tile to lay and heading to leave with, for a recognized piece.
fn motion(kind: PieceKind, heading: Heading, clockwise: bool) -> Option<(Tile, Heading)> {
    use Heading::{East, North, South, West};

    let tile = match (kind, heading, clockwise) {
        (PieceKind::Straight, North | South, _) => Tile::StraightVert,
        (PieceKind::Straight, East | West, _) => Tile::StraightHoriz,
        (PieceKind::Crossover, _, _) => Tile::Crossover,
        (PieceKind::Turn, North, true) | (PieceKind::Turn, West, false) => Tile::CurveNE,
        (PieceKind::Turn, East, true) | (PieceKind::Turn, North, false) => Tile::CurveES,
        (PieceKind::Turn, South, true) | (PieceKind::Turn, East, false) => Tile::CurveSW,
        (PieceKind::Turn, West, true) | (PieceKind::Turn, South, false) => Tile::CurveWN,
        (PieceKind::Unknown | PieceKind::StartFinish, _, _) => return None,
    };

    let heading = if kind == PieceKind::Turn { heading.turned(clockwise) } else { heading };
    Some((tile, heading))
}

/// Reconstructs the track layout for a single vehicle.
///
/// Feed it every transition and position event in arrival order. The first
/// position event after each transition identifies the piece just entered;
/// mapping starts at the first start line crossing and the map is complete
/// when the start line is crossed again.
///
/// ```rust
/// use overdrive::map::TrackMapper;
/// use overdrive::types::{PositionEvent, TransitionEvent};
///
/// let mut mapper = TrackMapper::new();
/// let crossing = TransitionEvent { payload_len: 18, left_wheel_distance: 0x36, right_wheel_distance: 0x37 };
///
/// for (piece_id, clockwise) in [(33, false), (36, false), (17, true), (33, false)] {
///     mapper.on_transition(&crossing);
///     mapper.on_position(&PositionEvent::new(piece_id, clockwise));
/// }
///
/// assert!(mapper.is_done());
/// assert_eq!(mapper.grid().get(2, 0).map(|c| c.value()), Some(0x05));
/// ```
#[derive(Debug, Clone)]
pub struct TrackMapper {
    grid: TileGrid,
    cursor: Cursor,
    state: ReconstructionState,
    phase: PairingPhase,
    policy: UnknownPiecePolicy,
    pieces_applied: u64,
    unknown_pieces: u64,
}

impl Default for TrackMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackMapper {
    pub fn new() -> Self {
        Self::with_policy(UnknownPiecePolicy::default())
    }

    pub fn with_policy(policy: UnknownPiecePolicy) -> Self {
        Self {
            grid: TileGrid::default(),
            cursor: Cursor::default(),
            state: ReconstructionState::default(),
            phase: PairingPhase::default(),
            policy,
            pieces_applied: 0,
            unknown_pieces: 0,
        }
    }

    /// Discard everything mapped so far. The unknown piece policy is kept.
    pub fn reset(&mut self) {
        debug!("Resetting track map");
        *self = Self::with_policy(self.policy);
    }

    /// Complete mapper holding a previously saved grid.
    pub fn from_grid(grid: TileGrid) -> Self {
        let mut mapper = Self::new();
        mapper.restore(grid);
        mapper
    }

    /// Replace the map with a saved grid and mark it complete. The cursor
    /// rests on the start tile, facing east. The unknown piece policy is kept.
    pub fn restore(&mut self, grid: TileGrid) {
        let width = grid.width();
        let start = grid.cells().iter().position(|cell| cell.low() == Some(Tile::StartFinish));
        let (x, y) = start.map_or((0, 0), |index| (index % width, index / width));
        let pieces: u64 = grid
            .cells()
            .iter()
            .map(|cell| u64::from(!cell.is_empty()) + u64::from(cell.value() >> 4 != 0))
            .sum();

        if start.is_none() {
            warn!(width, height = grid.height(), "Restored track map has no start tile");
        }
        info!(width, height = grid.height(), pieces, "Restored track map");

        *self = Self {
            grid,
            cursor: Cursor { x, y, heading: Heading::East },
            state: ReconstructionState { started: true, done: true },
            pieces_applied: pieces,
            ..Self::with_policy(self.policy)
        };
    }

    /// Declare the map complete without waiting for the start line.
    pub fn mark_done(&mut self) {
        if !self.state.done {
            info!(pieces = self.pieces_applied, "Track map marked complete");
        }
        self.state.started = true;
        self.state.done = true;
    }

    /// Handle a piece boundary crossing. Returns true if the mapper is now
    /// waiting for the position event that identifies the new piece.
    pub fn on_transition(&mut self, event: &TransitionEvent) -> bool {
        if !event.is_well_formed() {
            debug!(payload_len = event.payload_len, "Dropping undersized transition");
            return false;
        }

        debug!(
            left = event.left_wheel_distance,
            right = event.right_wheel_distance,
            style = %event.track_style(),
            "Track transition"
        );
        self.phase = PairingPhase::AwaitingPosition;
        true
    }

    /// Handle a position update. Only the first one after a transition is
    /// applied; the rest describe motion inside an already mapped piece.
    pub fn on_position(&mut self, event: &PositionEvent) -> Option<PieceOutcome> {
        if self.phase != PairingPhase::AwaitingPosition {
            trace!(piece_id = event.piece_id, "Position inside current piece");
            return None;
        }

        self.phase = PairingPhase::AwaitingTransition;
        Some(self.apply_piece(event.piece_id, event.clockwise))
    }

    /// Lay the piece with the given id at the cursor and advance.
    ///
    /// Once the map is done every piece is ignored until [`reset`](Self::reset).
    pub fn apply_piece(&mut self, piece_id: u8, clockwise: bool) -> PieceOutcome {
        if self.state.done {
            trace!(piece_id, "Track map complete, ignoring piece");
            return PieceOutcome::AfterDone;
        }

        let kind = classify(piece_id);

        if kind == PieceKind::StartFinish {
            if self.state.started {
                info!(pieces = self.pieces_applied, "Loop closed, track map complete");
                self.state.done = true;
                return PieceOutcome::LoopClosed;
            }

            info!("Start line found, mapping track");
            self.state.started = true;
            self.lay(Tile::StartFinish);
            self.cursor.heading = Heading::East;
            self.advance();
            self.pieces_applied += 1;
            return PieceOutcome::StartLine;
        }

        if !self.state.started {
            return PieceOutcome::BeforeStart;
        }

        let Some((tile, heading)) = motion(kind, self.cursor.heading, clockwise) else {
            self.unknown_pieces += 1;
            let advanced = self.policy == UnknownPiecePolicy::Advance;
            warn!(piece_id, policy = ?self.policy, "Unknown track piece");
            if advanced {
                self.advance();
            }
            return PieceOutcome::UnknownPiece { piece_id, advanced };
        };

        let Cursor { x, y, .. } = self.cursor;
        self.lay(tile);
        self.cursor.heading = heading;
        self.advance();
        self.pieces_applied += 1;

        debug!(piece_id, ?tile, x, y, heading = ?heading, "Placed track piece");
        PieceOutcome::Placed { tile, x, y }
    }

    fn lay(&mut self, tile: Tile) {
        let Cursor { x, y, .. } = self.cursor;
        if let Some(cell) = self.grid.get(x, y) {
            self.grid.set(x, y, cell.merge(tile));
        }
    }

    /// Step one cell in the current heading and grow the grid to keep the
    /// cursor inside it.
    fn advance(&mut self) {
        let (dx, dy) = self.cursor.heading.delta();
        let x = self.cursor.x as isize + dx as isize;
        let y = self.cursor.y as isize + dy as isize;

        let (width, height) = (self.grid.width(), self.grid.height());
        let (x, y) = self.grid.ensure_contains(x, y);
        if (width, height) != (self.grid.width(), self.grid.height()) {
            trace!(width = self.grid.width(), height = self.grid.height(), "Grew track grid");
        }

        self.cursor.x = x;
        self.cursor.y = y;
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn render_indexes(&self) -> RenderGrid {
        render_indexes(&self.grid)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn state(&self) -> ReconstructionState {
        self.state
    }

    pub fn phase(&self) -> PairingPhase {
        self.phase
    }

    pub fn policy(&self) -> UnknownPiecePolicy {
        self.policy
    }

    pub fn is_started(&self) -> bool {
        self.state.started
    }

    pub fn is_done(&self) -> bool {
        self.state.done
    }

    /// Pieces laid so far, including the start line.
    pub fn pieces_applied(&self) -> u64 {
        self.pieces_applied
    }

    pub fn unknown_pieces(&self) -> u64 {
        self.unknown_pieces
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            grid: self.grid.clone(),
            render: self.render_indexes(),
            cursor: self.cursor,
            state: self.state,
            pieces_applied: self.pieces_applied,
            unknown_pieces: self.unknown_pieces,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileCode;

    const START: u8 = 33;
    const STRAIGHT: u8 = 36;
    const TURN: u8 = 17;
    const CROSSOVER: u8 = 10;

    fn crossing() -> TransitionEvent {
        TransitionEvent { payload_len: 18, left_wheel_distance: 0x36, right_wheel_distance: 0x37 }
    }

    fn drive(mapper: &mut TrackMapper, piece_id: u8, clockwise: bool) -> Option<PieceOutcome> {
        mapper.on_transition(&crossing());
        mapper.on_position(&PositionEvent::new(piece_id, clockwise))
    }

    fn cell(mapper: &TrackMapper, x: usize, y: usize) -> u8 {
        mapper.grid().get(x, y).map(TileCode::value).expect("cell in bounds")
    }

    #[test]
    fn start_straight_turn_start() {
        let mut mapper = TrackMapper::new();

        assert_eq!(drive(&mut mapper, START, false), Some(PieceOutcome::StartLine));
        assert_eq!(cell(&mapper, 0, 0), 0x01);
        assert_eq!(mapper.cursor(), Cursor { x: 1, y: 0, heading: Heading::East });

        drive(&mut mapper, STRAIGHT, false);
        assert_eq!(cell(&mapper, 1, 0), 0x02);
        assert_eq!((mapper.cursor().x, mapper.cursor().y), (2, 0));

        drive(&mut mapper, TURN, true);
        assert_eq!(cell(&mapper, 2, 0), 0x05);
        assert_eq!(mapper.cursor(), Cursor { x: 2, y: 1, heading: Heading::South });

        let before = mapper.snapshot();
        assert_eq!(drive(&mut mapper, START, false), Some(PieceOutcome::LoopClosed));
        assert!(mapper.is_done());
        assert_eq!(mapper.grid(), &before.grid);
        assert_eq!(mapper.cursor(), before.cursor);
        assert!(mapper.grid().height() >= 2);
        assert!(mapper.grid().width() >= 3);
    }

    #[test]
    fn malformed_transition_does_not_arm() {
        let mut mapper = TrackMapper::new();
        drive(&mut mapper, START, false);
        let before = mapper.snapshot();

        let short = TransitionEvent { payload_len: 10, ..crossing() };
        assert!(!mapper.on_transition(&short));
        assert_eq!(mapper.on_position(&PositionEvent::new(TURN, true)), None);

        assert_eq!(mapper.snapshot(), before);
    }

    #[test]
    fn unknown_piece_holds_position() {
        let mut mapper = TrackMapper::new();
        drive(&mut mapper, START, false);
        let before = mapper.snapshot();

        let outcome = drive(&mut mapper, 99, false);
        assert_eq!(outcome, Some(PieceOutcome::UnknownPiece { piece_id: 99, advanced: false }));
        assert_eq!(mapper.grid(), &before.grid);
        assert_eq!(mapper.cursor(), before.cursor);
        assert_eq!(mapper.unknown_pieces(), 1);
    }

    #[test]
    fn unknown_piece_can_advance() {
        let mut mapper = TrackMapper::with_policy(UnknownPiecePolicy::Advance);
        drive(&mut mapper, START, false);

        let outcome = drive(&mut mapper, 99, false);
        assert_eq!(outcome, Some(PieceOutcome::UnknownPiece { piece_id: 99, advanced: true }));
        assert_eq!(cell(&mapper, 1, 0), 0x00);
        assert_eq!(mapper.cursor(), Cursor { x: 2, y: 0, heading: Heading::East });
    }

    #[test]
    fn telemetry_before_start_is_ignored() {
        let mut mapper = TrackMapper::new();
        assert_eq!(drive(&mut mapper, STRAIGHT, false), Some(PieceOutcome::BeforeStart));
        assert_eq!(drive(&mut mapper, TURN, true), Some(PieceOutcome::BeforeStart));
        assert_eq!(mapper.snapshot(), TrackMapper::new().snapshot());
    }

    #[test]
    fn only_first_position_after_transition_is_applied() {
        let mut mapper = TrackMapper::new();
        drive(&mut mapper, START, false);

        mapper.on_transition(&crossing());
        assert_eq!(mapper.phase(), PairingPhase::AwaitingPosition);
        assert!(mapper.on_position(&PositionEvent::new(STRAIGHT, false)).is_some());
        assert_eq!(mapper.phase(), PairingPhase::AwaitingTransition);

        for _ in 0..5 {
            assert_eq!(mapper.on_position(&PositionEvent::new(STRAIGHT, false)), None);
        }
        assert_eq!(mapper.pieces_applied(), 2);
    }

    #[test]
    fn heading_north_grows_grid_upwards() {
        let mut mapper = TrackMapper::new();
        drive(&mut mapper, START, false);
        // East -> North
        drive(&mut mapper, TURN, false);
        assert_eq!(mapper.cursor().heading, Heading::North);

        // Cursor moved above row 0: contents shift down one row
        assert_eq!(mapper.grid().height(), 2);
        assert_eq!(mapper.cursor(), Cursor { x: 1, y: 0, heading: Heading::North });
        assert_eq!(cell(&mapper, 0, 1), 0x01);
        assert_eq!(cell(&mapper, 1, 1), 0x07);
    }

    #[test]
    fn west_of_origin_grows_grid_left() {
        let mut mapper = TrackMapper::new();
        drive(&mut mapper, START, false);
        drive(&mut mapper, TURN, false); // North
        drive(&mut mapper, TURN, false); // West
        drive(&mut mapper, STRAIGHT, false);

        let cursor = mapper.cursor();
        assert_eq!(cursor.heading, Heading::West);
        assert_eq!((cursor.x, cursor.y), (0, 0));
        assert_eq!(mapper.grid().width(), 3);
        // start tile shifted one column right
        assert_eq!(cell(&mapper, 1, 1), 0x01);
    }

    #[test]
    fn crossover_keeps_heading_and_is_immutable() {
        let mut mapper = TrackMapper::new();
        drive(&mut mapper, START, false);
        drive(&mut mapper, CROSSOVER, false);
        assert_eq!(cell(&mapper, 1, 0), 0x08);
        assert_eq!(mapper.cursor(), Cursor { x: 2, y: 0, heading: Heading::East });

        // Loop round and come back down through the crossover
        drive(&mut mapper, TURN, false); // North, grid shifts down a row
        drive(&mut mapper, TURN, false); // West
        drive(&mut mapper, TURN, false); // South, onto the crossover cell
        assert_eq!(mapper.cursor(), Cursor { x: 1, y: 1, heading: Heading::South });
        drive(&mut mapper, CROSSOVER, false);

        assert_eq!(cell(&mapper, 1, 1), 0x08);
        assert_eq!(mapper.cursor(), Cursor { x: 1, y: 2, heading: Heading::South });
    }

    #[test]
    fn crossover_cell_survives_later_pieces() {
        let mut mapper = TrackMapper::new();
        drive(&mut mapper, START, false);
        drive(&mut mapper, CROSSOVER, false);
        drive(&mut mapper, TURN, false); // North
        drive(&mut mapper, TURN, false); // West
        drive(&mut mapper, TURN, false); // South
        drive(&mut mapper, STRAIGHT, false); // lands on crossover cell
        assert_eq!(mapper.grid().cells().iter().filter(|c| c.value() == 0x08).count(), 1);
    }

    #[test]
    fn bridge_stacks_second_tile() {
        // Figure of eight style: pass over the first straight vertically
        let mut mapper = TrackMapper::new();
        drive(&mut mapper, START, false);
        drive(&mut mapper, STRAIGHT, false); // (1,0) horizontal
        drive(&mut mapper, TURN, false); // (2,0) -> North
        drive(&mut mapper, TURN, false); // -> West
        drive(&mut mapper, TURN, false); // -> South, back onto the first straight
        let over = mapper.cursor();
        drive(&mut mapper, STRAIGHT, false);

        let bridged = mapper.grid().get(over.x, over.y).expect("in bounds");
        assert_eq!(bridged.value(), 0x32);
        assert_eq!(mapper.render_indexes().get(over.x, over.y), Some(9));
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut mapper = TrackMapper::with_policy(UnknownPiecePolicy::Advance);
        drive(&mut mapper, START, false);
        drive(&mut mapper, STRAIGHT, false);
        mapper.on_transition(&crossing());

        mapper.reset();
        assert_eq!(mapper.snapshot(), TrackMapper::new().snapshot());
        assert_eq!(mapper.phase(), PairingPhase::AwaitingTransition);
        assert_eq!(mapper.policy(), UnknownPiecePolicy::Advance);
    }

    fn closed_lap() -> TrackMapper {
        let mut mapper = TrackMapper::new();
        drive(&mut mapper, START, true);
        for &(piece_id, clockwise) in &crate::test_utils::LAP {
            drive(&mut mapper, piece_id, clockwise);
        }
        assert!(mapper.is_done());
        mapper
    }

    #[test]
    fn second_lap_leaves_the_map_untouched() {
        let mut mapper = closed_lap();
        let done = mapper.snapshot();
        assert_eq!(done.render.to_rows(), crate::test_utils::LAP_RENDER.map(|row| row.to_vec()).to_vec());

        for &(piece_id, clockwise) in &crate::test_utils::LAP {
            assert_eq!(drive(&mut mapper, piece_id, clockwise), Some(PieceOutcome::AfterDone));
        }
        assert_eq!(drive(&mut mapper, CROSSOVER, true), Some(PieceOutcome::AfterDone));
        assert_eq!(drive(&mut mapper, 99, true), Some(PieceOutcome::AfterDone));

        assert_eq!(mapper.grid(), &done.grid);
        assert_eq!(mapper.cursor(), done.cursor);
        assert_eq!(mapper.render_indexes(), done.render);
        assert_eq!(mapper.snapshot(), done);
    }

    #[test]
    fn reset_maps_again_after_done() {
        let mut mapper = closed_lap();
        mapper.reset();
        assert_eq!(drive(&mut mapper, START, true), Some(PieceOutcome::StartLine));
        assert_eq!(
            drive(&mut mapper, STRAIGHT, true),
            Some(PieceOutcome::Placed { tile: Tile::StraightHoriz, x: 1, y: 0 })
        );
    }

    #[test]
    fn restored_grid_is_complete() {
        let done = closed_lap().snapshot();

        let mut mapper = TrackMapper::with_policy(UnknownPiecePolicy::Advance);
        mapper.restore(done.grid.clone());
        assert!(mapper.is_started() && mapper.is_done());
        assert_eq!(mapper.policy(), UnknownPiecePolicy::Advance);
        assert_eq!(mapper.render_indexes(), done.render);
        assert_eq!(mapper.pieces_applied(), done.pieces_applied);
        assert_eq!(mapper.cursor(), done.cursor);

        // Pieces are ignored until the map is reset
        let restored = mapper.snapshot();
        assert_eq!(drive(&mut mapper, STRAIGHT, true), Some(PieceOutcome::AfterDone));
        assert_eq!(mapper.snapshot(), restored);
    }

    #[test]
    fn restored_grid_without_start_tile_rests_at_origin() {
        let grid = TileGrid::from_rows(vec![vec![TileCode(0x02), TileCode(0x32)]]).expect("rectangular");
        let mapper = TrackMapper::from_grid(grid);
        assert_eq!((mapper.cursor().x, mapper.cursor().y), (0, 0));
        assert_eq!(mapper.pieces_applied(), 3);
        assert!(mapper.is_done());
    }

    #[test]
    fn mark_done_freezes_a_partial_map() {
        let mut mapper = TrackMapper::new();
        drive(&mut mapper, START, false);
        drive(&mut mapper, STRAIGHT, false);
        mapper.mark_done();
        assert!(mapper.is_done());

        let partial = mapper.snapshot();
        assert_eq!(drive(&mut mapper, TURN, true), Some(PieceOutcome::AfterDone));
        assert_eq!(drive(&mut mapper, START, false), Some(PieceOutcome::AfterDone));
        assert_eq!(mapper.snapshot(), partial);
        assert_eq!(partial.pieces_applied, 2);
    }
}
