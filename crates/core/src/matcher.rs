//! Match detection.
//!
//! Rows and columns are scanned independently for runs of at least
//! [`MIN_MATCH_LEN`] cells sharing an effective gem. Fixed slots and empty
//! cells break a run. A cell can appear in both a row group and a column
//! group; the result is a list so those overlaps stay visible.

use std::collections::BTreeSet;

use crate::board::Board;
use crate::types::{Coord, Orientation, MIN_MATCH_LEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroup {
    pub orientation: Orientation,
    pub gem: u8,
    /// Cells in scan order (left to right, or top to bottom)
    pub cells: Vec<Coord>,
}

impl MatchGroup {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Middle cell of the run; anchor for a spawned special tile
    pub fn middle(&self) -> Option<Coord> {
        self.cells.get(self.cells.len() / 2).copied()
    }

    pub fn contains(&self, at: Coord) -> bool {
        self.cells.contains(&at)
    }
}

/// Find every horizontal and vertical run. Rows come first, then columns.
pub fn find_matches(board: &Board) -> Vec<MatchGroup> {
    let mut groups = Vec::new();
    let (rows, cols) = (board.rows() as i8, board.cols() as i8);

    for row in 0..rows {
        scan_line(board, Orientation::Row, cols, |i| Coord::new(row, i), &mut groups);
    }
    for col in 0..cols {
        scan_line(board, Orientation::Column, rows, |i| Coord::new(i, col), &mut groups);
    }
    groups
}

fn scan_line(
    board: &Board,
    orientation: Orientation,
    len: i8,
    coord: impl Fn(i8) -> Coord,
    out: &mut Vec<MatchGroup>,
) {
    let gem_at = |i: i8| {
        let at = coord(i);
        board.effective_gem(at.row, at.col)
    };

    let mut cursor = 0i8;
    while cursor < len {
        let Some(gem) = gem_at(cursor) else {
            cursor += 1;
            continue;
        };
        let mut end = cursor + 1;
        while end < len && gem_at(end) == Some(gem) {
            end += 1;
        }
        if (end - cursor) as usize >= MIN_MATCH_LEN {
            out.push(MatchGroup {
                orientation,
                gem,
                cells: (cursor..end).map(&coord).collect(),
            });
        }
        cursor = end;
    }
}

/// Union of all group cells
pub fn matched_cells(groups: &[MatchGroup]) -> BTreeSet<Coord> {
    groups.iter().flat_map(|g| g.cells.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{encode_special, SpecialKind};

    #[test]
    fn test_row_run_detected() {
        let board = Board::from_rows(&[&[0, 1, 1, 1, 2], &[2, 0, 2, 0, 1]]).unwrap();
        let groups = find_matches(&board);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].orientation, Orientation::Row);
        assert_eq!(groups[0].gem, 1);
        assert_eq!(
            groups[0].cells,
            vec![Coord::new(0, 1), Coord::new(0, 2), Coord::new(0, 3)]
        );
    }

    #[test]
    fn test_fixed_slot_breaks_run() {
        let board = Board::from_rows(&[&[1, 1, -2, 1, 1]]).unwrap();
        assert!(find_matches(&board).is_empty());
    }

    #[test]
    fn test_special_matches_on_origin() {
        let special = encode_special(3, SpecialKind::Area);
        let board = Board::from_rows(&[&[3], &[special], &[3], &[0]]).unwrap();
        let groups = find_matches(&board);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].orientation, Orientation::Column);
        assert_eq!(groups[0].gem, 3);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn test_overlapping_row_and_column_kept_separately() {
        let board = Board::from_rows(&[
            &[0, 2, 1],
            &[2, 2, 2],
            &[1, 2, 0],
        ])
        .unwrap();
        let groups = find_matches(&board);
        assert_eq!(groups.len(), 2);
        let shared: Vec<_> = groups[0]
            .cells
            .iter()
            .filter(|c| groups[1].contains(**c))
            .collect();
        assert_eq!(shared, vec![&Coord::new(1, 1)]);
        assert_eq!(matched_cells(&groups).len(), 5);
    }

    #[test]
    fn test_long_run_is_one_group() {
        let board = Board::from_rows(&[&[4, 4, 4, 4, 4, 0]]).unwrap();
        let groups = find_matches(&board);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 5);
        assert_eq!(groups[0].middle(), Some(Coord::new(0, 2)));
    }
}
