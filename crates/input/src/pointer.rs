//! Pointer-to-cell mapping and drag path interpolation.

use arrayvec::ArrayVec;

use crate::types::Coord;

/// Upper bound on commands produced by one pointer event.
///
/// Boards are at most `i8::MAX` cells per side, so a single jump never
/// crosses more cells than this.
pub const MAX_COMMANDS: usize = 128;

/// Maps pixel positions (origin at the board's top-left corner) to cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMapper {
    pub cell_size: f32,
    pub rows: u8,
    pub cols: u8,
}

impl PointerMapper {
    pub fn new(cell_size: f32, rows: u8, cols: u8) -> Self {
        Self {
            cell_size,
            rows,
            cols,
        }
    }

    /// Cell under (x, y), or `None` outside the board.
    pub fn cell_at(&self, x: f32, y: f32) -> Option<Coord> {
        if !(self.cell_size > 0.0) || !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        let col = (x / self.cell_size).floor();
        let row = (y / self.cell_size).floor();
        if row >= self.rows as f32 || col >= self.cols as f32 {
            return None;
        }
        Some(Coord::new(row as i8, col as i8))
    }

    /// Pixel centre of a cell
    pub fn center_of(&self, at: Coord) -> (f32, f32) {
        (
            (at.col as f32 + 0.5) * self.cell_size,
            (at.row as f32 + 0.5) * self.cell_size,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up,
}

/// Engine-facing drag command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragCommand {
    Begin(Coord),
    Step(Coord),
    End,
}

/// Turns pointer events into drag commands.
#[derive(Debug, Clone)]
pub struct DragPath {
    mapper: PointerMapper,
    last: Option<Coord>,
}

impl DragPath {
    pub fn new(mapper: PointerMapper) -> Self {
        Self { mapper, last: None }
    }

    pub fn mapper(&self) -> &PointerMapper {
        &self.mapper
    }

    pub fn is_pressed(&self) -> bool {
        self.last.is_some()
    }

    /// Last cell the pointer was resolved to while pressed
    pub fn current(&self) -> Option<Coord> {
        self.last
    }

    pub fn handle(&mut self, event: PointerEvent) -> ArrayVec<DragCommand, MAX_COMMANDS> {
        let mut out = ArrayVec::new();
        match event {
            PointerEvent::Down { x, y } => {
                if let Some(at) = self.mapper.cell_at(x, y) {
                    if self.last.is_some() {
                        out.push(DragCommand::End);
                    }
                    self.last = Some(at);
                    out.push(DragCommand::Begin(at));
                }
            }
            PointerEvent::Move { x, y } => {
                let (Some(from), Some(to)) = (self.last, self.mapper.cell_at(x, y)) else {
                    return out;
                };
                for at in line_walk(from, to) {
                    if out.try_push(DragCommand::Step(at)).is_err() {
                        break;
                    }
                    self.last = Some(at);
                }
            }
            PointerEvent::Up => {
                if self.last.take().is_some() {
                    out.push(DragCommand::End);
                }
            }
        }
        out
    }
}

/// Cells crossed going from `from` to `to`, excluding `from`. Consecutive
/// cells are always 8-adjacent; diagonal moves are taken as diagonals.
pub fn line_walk(from: Coord, to: Coord) -> ArrayVec<Coord, MAX_COMMANDS> {
    let mut out = ArrayVec::new();
    let dr = to.row as i32 - from.row as i32;
    let dc = to.col as i32 - from.col as i32;
    let steps = dr.abs().max(dc.abs());
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        let row = from.row as f32 + dr as f32 * t;
        let col = from.col as f32 + dc as f32 * t;
        let at = Coord::new(row.round() as i8, col.round() as i8);
        if out.try_push(at).is_err() {
            break;
        }
    }
    out
}
