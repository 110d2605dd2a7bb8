//! Drag tracker - the swap chain of one continuous gesture
//!
//! The gem picked up at the start of a drag travels with the pointer. Every
//! accepted step swaps it with the neighbour it moves onto, so the board is
//! consistent at all times and the trail head always holds the gem in hand.
//!
//! Backtracking onto the cell just before the head undoes the last swap and
//! pops the trail. Returning to any older cell is an ordinary step.

use crate::board::Board;
use crate::types::{Cell, Coord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Rejected,
    Advanced,
    Backtracked,
}

impl StepResult {
    pub fn accepted(self) -> bool {
        !matches!(self, StepResult::Rejected)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DragTracker {
    trail: Vec<Coord>,
    hand: Option<Cell>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.hand.is_some()
    }

    pub fn trail(&self) -> &[Coord] {
        &self.trail
    }

    pub fn head(&self) -> Option<Coord> {
        self.trail.last().copied()
    }

    pub fn hand(&self) -> Option<Cell> {
        self.hand
    }

    /// Pick up the gem at `at`. Fixed slots, empty cells and coordinates off
    /// the board are ignored.
    pub fn begin(&mut self, board: &Board, at: Coord) -> bool {
        match board.at(at) {
            Some(cell) if cell.is_movable() => {
                self.trail.clear();
                self.trail.push(at);
                self.hand = Some(cell);
                true
            }
            _ => false,
        }
    }

    pub fn step(&mut self, board: &mut Board, at: Coord) -> StepResult {
        let Some(head) = self.head() else {
            return StepResult::Rejected;
        };
        if self.hand.is_none() || !head.is_adjacent(at) {
            return StepResult::Rejected;
        }
        if !board.at(at).map_or(false, |c| c.is_movable()) {
            return StepResult::Rejected;
        }

        let backtrack = self.trail.len() >= 2 && self.trail[self.trail.len() - 2] == at;
        if !board.swap(head, at) {
            return StepResult::Rejected;
        }

        if backtrack {
            self.trail.pop();
            tracing::trace!(row = at.row, col = at.col, "drag step undone");
            StepResult::Backtracked
        } else {
            self.trail.push(at);
            tracing::trace!(row = at.row, col = at.col, len = self.trail.len(), "drag step");
            StepResult::Advanced
        }
    }

    /// Drop the gem in hand onto the trail head and close the chain.
    ///
    /// Returns `None` if no drag was active, otherwise whether the gesture
    /// left the trail longer than its start cell.
    pub fn end(&mut self, board: &mut Board) -> Option<bool> {
        let hand = self.hand.take()?;
        let head = self.head()?;
        debug_assert_eq!(board.at(head), Some(hand), "trail head lost the gem in hand");
        board.set_at(head, hand);
        let moved = self.trail.len() > 1;
        self.trail.clear();
        Some(moved)
    }
}
