use crate::core::{CascadeReport, Match3Engine};
use crate::types::{Coord, EngineState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureError {
    Resolving,
    Busy,
    NoMovesLeft,
    InvalidStart,
    /// Step `index` of the path is not a playable neighbour of the one before.
    NotAdjacent { index: usize },
    NoNetMove,
    Destroyed,
}

impl GestureError {
    pub fn code(self) -> &'static str {
        match self {
            GestureError::Resolving => "resolving",
            GestureError::Busy => "busy",
            GestureError::NoMovesLeft => "no_moves_left",
            GestureError::InvalidStart => "invalid_start",
            GestureError::NotAdjacent { .. } => "not_adjacent",
            GestureError::NoNetMove => "no_net_move",
            GestureError::Destroyed => "destroyed",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            GestureError::Resolving => "cascades are still resolving",
            GestureError::Busy => "a drag is already in progress",
            GestureError::NoMovesLeft => "move budget exhausted",
            GestureError::InvalidStart => "gesture must start on a gem inside the board",
            GestureError::NotAdjacent { .. } => {
                "each step must move onto an 8-adjacent gem that is not a fixed slot"
            }
            GestureError::NoNetMove => "gesture ended where it started",
            GestureError::Destroyed => "engine has been destroyed",
        }
    }
}

impl std::fmt::Display for GestureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GestureError::NotAdjacent { index } => {
                write!(f, "{} (step {})", self.message(), index)
            }
            _ => f.write_str(self.message()),
        }
    }
}

impl std::error::Error for GestureError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureOutcome {
    /// Cells left in the trail after backtracks, start included
    pub trail_len: usize,
    pub remaining_moves: u32,
}

fn check_ready(engine: &Match3Engine) -> Result<(), GestureError> {
    if engine.is_destroyed() {
        return Err(GestureError::Destroyed);
    }
    match engine.state() {
        EngineState::Resolving => Err(GestureError::Resolving),
        EngineState::Dragging => Err(GestureError::Busy),
        EngineState::Idle => Ok(()),
    }
}

/// Validate the whole path against the current board without mutating it.
fn validate_path(engine: &Match3Engine, path: &[Coord]) -> Result<(), GestureError> {
    let board = engine.board();
    let movable = |at: Coord| board.at(at).map_or(false, |c| c.is_movable());

    let Some(&start) = path.first() else {
        return Err(GestureError::InvalidStart);
    };
    if !movable(start) {
        return Err(GestureError::InvalidStart);
    }
    for (i, pair) in path.windows(2).enumerate() {
        if !pair[0].is_adjacent(pair[1]) || !movable(pair[1]) {
            return Err(GestureError::NotAdjacent { index: i + 1 });
        }
    }
    Ok(())
}

/// Drag along `path` (start cell first) and release.
///
/// A rejected gesture leaves the board and move budget untouched. The
/// cascades it may have set up are not resolved; see [`play_gesture`].
pub fn apply_gesture(
    engine: &mut Match3Engine,
    path: &[Coord],
) -> Result<GestureOutcome, GestureError> {
    check_ready(engine)?;
    if engine.remaining_moves() == 0 {
        return Err(GestureError::NoMovesLeft);
    }
    validate_path(engine, path)?;

    let start = path[0];
    if !engine.begin_drag(start.row, start.col) {
        return Err(GestureError::InvalidStart);
    }
    for (i, step) in path.iter().enumerate().skip(1) {
        if !engine.step_drag(step.row, step.col) {
            // Unreachable after validation; close the chain so the engine
            // is not left mid-drag.
            engine.end_drag();
            return Err(GestureError::NotAdjacent { index: i });
        }
    }
    let trail_len = engine.drag_trail().len();
    if !engine.end_drag().moved {
        return Err(GestureError::NoNetMove);
    }

    tracing::debug!(steps = path.len() - 1, trail_len, "gesture applied");
    Ok(GestureOutcome {
        trail_len,
        remaining_moves: engine.remaining_moves(),
    })
}

/// Drain all pending cascades.
pub fn resolve_all(engine: &mut Match3Engine) -> Result<CascadeReport, GestureError> {
    if engine.is_destroyed() {
        return Err(GestureError::Destroyed);
    }
    if engine.state() == EngineState::Dragging {
        return Err(GestureError::Busy);
    }
    Ok(engine.resolve_cascades())
}

/// Apply a gesture, then resolve everything it set off.
pub fn play_gesture(
    engine: &mut Match3Engine,
    path: &[Coord],
) -> Result<(GestureOutcome, CascadeReport), GestureError> {
    let outcome = apply_gesture(engine, path)?;
    let report = resolve_all(engine)?;
    Ok((outcome, report))
}
