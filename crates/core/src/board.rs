//! Board module - manages the gem grid
//!
//! The board is a `rows x cols` grid stored as a flat row-major vector of
//! [`Cell`]s. Coordinates are `(row, col)` with row 0 at the top; gravity
//! pulls toward the highest row index.
//!
//! Fixed slots are placed once at construction and can never be overwritten:
//! [`Board::set`] and [`Board::swap`] refuse to touch them, so the number of
//! non-fixed cells is constant for the board's lifetime.

use crate::rng::GemSource;
use crate::types::{Cell, Coord, SlotKind, MIN_MATCH_LEN};

/// Re-draw budget per cell when generating a match-free board
const GENERATE_RETRIES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: u8,
    cols: u8,
    /// Flat array of cells, row-major order (row * cols + col)
    cells: Vec<Cell>,
}

impl Board {
    /// Create a board with every cell empty
    pub fn new(rows: u8, cols: u8) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows as usize * cols as usize],
        }
    }

    /// Build from integer cell codes in row-major order.
    ///
    /// Returns `None` if the length does not match or a code is unknown.
    pub fn from_codes(rows: u8, cols: u8, codes: &[i32]) -> Option<Self> {
        if codes.len() != rows as usize * cols as usize {
            return None;
        }
        let cells = codes
            .iter()
            .map(|&code| Cell::from_code(code))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { rows, cols, cells })
    }

    /// Build from rows of integer codes (all rows must share one length).
    pub fn from_rows(rows: &[&[i32]]) -> Option<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let flat: Vec<i32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::from_codes(
            u8::try_from(rows.len()).ok()?,
            u8::try_from(cols).ok()?,
            &flat,
        )
    }

    /// Fill a fresh board from `gems`, re-drawing any cell that would
    /// complete a run of three so the starting position is stable.
    pub fn generate(
        rows: u8,
        cols: u8,
        gem_kinds: u8,
        fixed_slots: &[(Coord, SlotKind)],
        gems: &mut dyn GemSource,
    ) -> Self {
        let mut board = Self::new(rows, cols);
        for &(at, slot) in fixed_slots {
            if let Some(idx) = board.index(at.row, at.col) {
                board.cells[idx] = Cell::Fixed(slot);
            }
        }

        for row in 0..rows as i8 {
            for col in 0..cols as i8 {
                if board.is_fixed_slot(row, col) {
                    continue;
                }
                let mut gem = gems.next_gem(gem_kinds);
                for _ in 0..GENERATE_RETRIES {
                    if !board.completes_run(row, col, gem) {
                        break;
                    }
                    gem = gems.next_gem(gem_kinds);
                }
                if board.completes_run(row, col, gem) {
                    // Deterministic fallback: first kind that breaks both runs.
                    if let Some(free) = (0..gem_kinds).find(|&g| !board.completes_run(row, col, g)) {
                        gem = free;
                    }
                }
                board.set(row, col, Cell::Gem(gem));
            }
        }
        board
    }

    /// Whether `gem` at (row, col) would extend the two cells to its left or
    /// above into a run. Only looks backward, matching generation order.
    fn completes_run(&self, row: i8, col: i8, gem: u8) -> bool {
        let back = (MIN_MATCH_LEN - 1) as i8;
        let left = (1..=back).all(|d| self.effective_gem(row, col - d) == Some(gem));
        let up = (1..=back).all(|d| self.effective_gem(row - d, col) == Some(gem));
        left || up
    }

    /// Calculate flat index from (row, col) coordinates
    #[inline(always)]
    fn index(&self, row: i8, col: i8) -> Option<usize> {
        if row < 0 || col < 0 || row as u8 >= self.rows || col as u8 >= self.cols {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn contains(&self, at: Coord) -> bool {
        self.index(at.row, at.col).is_some()
    }

    /// Get cell at (row, col); `None` if out of bounds
    pub fn get(&self, row: i8, col: i8) -> Option<Cell> {
        self.index(row, col).map(|idx| self.cells[idx])
    }

    pub fn at(&self, at: Coord) -> Option<Cell> {
        self.get(at.row, at.col)
    }

    /// Set cell at (row, col).
    ///
    /// Returns false if out of bounds, if the target is a fixed slot, or if
    /// `cell` is itself a fixed slot.
    pub fn set(&mut self, row: i8, col: i8, cell: Cell) -> bool {
        if cell.is_fixed() {
            return false;
        }
        match self.index(row, col) {
            Some(idx) if !self.cells[idx].is_fixed() => {
                self.cells[idx] = cell;
                true
            }
            _ => false,
        }
    }

    pub fn set_at(&mut self, at: Coord, cell: Cell) -> bool {
        self.set(at.row, at.col, cell)
    }

    /// Swap two non-fixed cells. Returns false (no mutation) otherwise.
    pub fn swap(&mut self, a: Coord, b: Coord) -> bool {
        let (Some(ia), Some(ib)) = (self.index(a.row, a.col), self.index(b.row, b.col)) else {
            return false;
        };
        if self.cells[ia].is_fixed() || self.cells[ib].is_fixed() {
            return false;
        }
        self.cells.swap(ia, ib);
        true
    }

    pub fn is_fixed_slot(&self, row: i8, col: i8) -> bool {
        matches!(self.get(row, col), Some(Cell::Fixed(_)))
    }

    /// Plain gem or special origin; `None` for fixed slots, empties and
    /// out-of-bounds coordinates.
    pub fn effective_gem(&self, row: i8, col: i8) -> Option<u8> {
        self.get(row, col).and_then(|cell| cell.effective_gem())
    }

    pub fn is_special(&self, row: i8, col: i8) -> bool {
        matches!(self.get(row, col), Some(Cell::Special { .. }))
    }

    /// All coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        let cols = self.cols as i8;
        (0..self.rows as i8).flat_map(move |row| (0..cols).map(move |col| Coord::new(row, col)))
    }

    /// Non-fixed coordinates in row-major order
    pub fn playable_coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.coords()
            .filter(move |at| !self.is_fixed_slot(at.row, at.col))
    }

    pub fn non_fixed_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_fixed()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Empty).count()
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Integer codes in row-major order
    pub fn codes(&self) -> Vec<i32> {
        let mut out = Vec::with_capacity(self.cells.len());
        self.write_codes(&mut out);
        out
    }

    /// Write integer codes into `out`, reusing its allocation
    pub fn write_codes(&self, out: &mut Vec<i32>) {
        out.clear();
        out.extend(self.cells.iter().map(|c| c.to_code()));
    }

    /// Codes as rows (for testing/display)
    pub fn code_rows(&self) -> Vec<Vec<i32>> {
        self.cells
            .chunks(self.cols.max(1) as usize)
            .map(|row| row.iter().map(|c| c.to_code()).collect())
            .collect()
    }
}
