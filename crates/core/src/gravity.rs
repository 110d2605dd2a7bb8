//! Gravity: compact surviving gems downward and refill from the top.
//!
//! Fixed slots neither move nor receive gems; gems fall straight past them.
//! Uses the same two-pointer compaction as a row-clear, per column: a read
//! pointer walks up collecting survivors, a write pointer re-lays them from
//! the bottom-most playable row.

use crate::board::Board;
use crate::rng::GemSource;
use crate::types::{Cell, Coord};

/// A surviving cell that changed rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub from: Coord,
    pub to: Coord,
    pub cell: Cell,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GravityReport {
    pub falls: Vec<Fall>,
    /// Freshly drawn gems, bottom-most first per column
    pub spawned: Vec<(Coord, u8)>,
}

impl GravityReport {
    pub fn is_empty(&self) -> bool {
        self.falls.is_empty() && self.spawned.is_empty()
    }

    pub fn extend(&mut self, other: GravityReport) {
        self.falls.extend(other.falls);
        self.spawned.extend(other.spawned);
    }
}

/// Settle every column listed in `columns`.
pub fn apply_gravity(
    board: &mut Board,
    columns: impl IntoIterator<Item = i8>,
    gems: &mut dyn GemSource,
    gem_kinds: u8,
) -> GravityReport {
    let mut report = GravityReport::default();
    for col in columns {
        settle_column(board, col, gems, gem_kinds, &mut report);
    }
    report
}

fn settle_column(
    board: &mut Board,
    col: i8,
    gems: &mut dyn GemSource,
    gem_kinds: u8,
    report: &mut GravityReport,
) {
    if col < 0 || col as u8 >= board.cols() {
        return;
    }

    // Playable rows, bottom to top.
    let slots: Vec<i8> = (0..board.rows() as i8)
        .rev()
        .filter(|&row| !board.is_fixed_slot(row, col))
        .collect();

    let survivors: Vec<(i8, Cell)> = slots
        .iter()
        .filter_map(|&row| match board.get(row, col) {
            Some(Cell::Empty) | None => None,
            Some(cell) => Some((row, cell)),
        })
        .collect();

    if survivors.len() == slots.len() {
        return;
    }

    for (write, &(from_row, cell)) in slots.iter().zip(&survivors) {
        if *write != from_row {
            board.set(*write, col, cell);
            report.falls.push(Fall {
                from: Coord::new(from_row, col),
                to: Coord::new(*write, col),
                cell,
            });
        }
    }

    for &row in &slots[survivors.len()..] {
        let gem = gems.next_gem(gem_kinds);
        board.set(row, col, Cell::Gem(gem));
        report.spawned.push((Coord::new(row, col), gem));
    }

    debug_assert!(
        slots
            .iter()
            .all(|&row| board.get(row, col).map_or(false, |c| c.is_movable())),
        "column {} still holds an empty cell after gravity",
        col
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedGems;
    use crate::types::{SlotKind, EMPTY_CODE as E};

    #[test]
    fn test_single_column_compacts_and_refills() {
        let mut board = Board::from_rows(&[&[0], &[1], &[2], &[E], &[E]]).unwrap();
        let mut gems = ScriptedGems::new([3, 4]);
        let report = apply_gravity(&mut board, [0], &mut gems, 5);

        assert_eq!(board.codes(), vec![4, 3, 0, 1, 2]);
        assert_eq!(report.falls.len(), 3);
        assert_eq!(
            report.spawned,
            vec![(Coord::new(1, 0), 3), (Coord::new(0, 0), 4)]
        );
    }

    #[test]
    fn test_fixed_slot_is_skipped() {
        let mut board = Board::from_rows(&[&[0], &[1], &[-4], &[E], &[2]]).unwrap();
        let mut gems = ScriptedGems::new([3]);
        let report = apply_gravity(&mut board, [0], &mut gems, 5);

        assert_eq!(board.get(2, 0), Some(Cell::Fixed(SlotKind::Hero)));
        // Gem 1 falls past the slot into row 3; gem 0 drops to row 1.
        assert_eq!(board.codes(), vec![3, 0, -4, 1, 2]);
        assert_eq!(report.spawned, vec![(Coord::new(0, 0), 3)]);
        assert!(report.falls.contains(&Fall {
            from: Coord::new(1, 0),
            to: Coord::new(3, 0),
            cell: Cell::Gem(1),
        }));
    }

    #[test]
    fn test_full_column_is_untouched() {
        let mut board = Board::from_rows(&[&[0, E], &[1, 2]]).unwrap();
        let mut gems = ScriptedGems::new([4]);
        let report = apply_gravity(&mut board, [0, 1], &mut gems, 5);
        assert_eq!(board.code_rows(), vec![vec![0, 4], vec![1, 2]]);
        assert!(report.falls.is_empty());
        assert_eq!(report.spawned, vec![(Coord::new(0, 1), 4)]);
    }

    #[test]
    fn test_out_of_range_column_ignored() {
        let mut board = Board::from_rows(&[&[0]]).unwrap();
        let mut gems = ScriptedGems::new([]);
        let report = apply_gravity(&mut board, [-1, 3], &mut gems, 5);
        assert!(report.is_empty());
    }
}
