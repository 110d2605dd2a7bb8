//! Special tiles: spawn selection and detonation areas.

use crate::board::Board;
use crate::matcher::MatchGroup;
use crate::rng::CellSampler;
use crate::tier::{TierInfo, TierTable};
use crate::types::{Cell, Coord, SpecialKind};

/// A special tile chosen to spawn this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialSpawn {
    pub at: Coord,
    pub gem: u8,
    pub kind: SpecialKind,
    pub tier: u8,
}

impl SpecialSpawn {
    pub fn cell(&self) -> Cell {
        Cell::Special {
            origin: self.gem,
            kind: self.kind,
        }
    }
}

/// Pick at most one special tile for the pass: the highest-tier group whose
/// tier creates one (first such group on ties), anchored at its middle cell.
pub fn choose_spawn(groups: &[MatchGroup], tiers: &[TierInfo]) -> Option<SpecialSpawn> {
    let mut best: Option<SpecialSpawn> = None;
    for (group, info) in groups.iter().zip(tiers) {
        let Some(kind) = info.creates_special() else {
            continue;
        };
        if best.map_or(false, |b| b.tier >= info.tier) {
            continue;
        }
        if let Some(at) = group.middle() {
            best = Some(SpecialSpawn {
                at,
                gem: group.gem,
                kind,
                tier: info.tier,
            });
        }
    }
    best
}

/// Look up the tier of every group, in order.
pub fn lookup_tiers(groups: &[MatchGroup], table: &dyn TierTable) -> Vec<TierInfo> {
    groups.iter().map(|g| table.lookup(g.len())).collect()
}

/// Extra cells destroyed by the special tile at `at`.
///
/// Returns an empty list if `at` is not a special tile. Fixed slots are never
/// included.
pub fn detonate(
    board: &Board,
    at: Coord,
    sampler: &mut dyn CellSampler,
    lightning_targets: usize,
) -> Vec<Coord> {
    let Some(Cell::Special { origin, kind }) = board.at(at) else {
        return Vec::new();
    };

    match kind {
        SpecialKind::RowLine => row_line(board, at.row),
        SpecialKind::ColumnLine => column_line(board, at.col),
        SpecialKind::Area => block(board, at, 1),
        SpecialKind::Mega => block(board, at, 2),
        SpecialKind::Cross => {
            let mut cells = row_line(board, at.row);
            cells.extend(column_line(board, at.col).into_iter().filter(|c| *c != at));
            cells
        }
        SpecialKind::Lightning => {
            let candidates: Vec<Coord> = board.playable_coords().filter(|c| *c != at).collect();
            sampler.sample(&candidates, lightning_targets)
        }
        SpecialKind::Rainbow => board
            .coords()
            .filter(|c| board.effective_gem(c.row, c.col) == Some(origin))
            .collect(),
    }
}

fn row_line(board: &Board, row: i8) -> Vec<Coord> {
    (0..board.cols() as i8)
        .map(|col| Coord::new(row, col))
        .filter(|c| !board.is_fixed_slot(c.row, c.col))
        .collect()
}

fn column_line(board: &Board, col: i8) -> Vec<Coord> {
    (0..board.rows() as i8)
        .map(|row| Coord::new(row, col))
        .filter(|c| !board.is_fixed_slot(c.row, c.col))
        .collect()
}

/// Square of side `2 * radius + 1` centred on `at`, clipped to the board
fn block(board: &Board, at: Coord, radius: i8) -> Vec<Coord> {
    let mut cells = Vec::new();
    for row in at.row - radius..=at.row + radius {
        for col in at.col - radius..=at.col + radius {
            let c = Coord::new(row, col);
            if board.contains(c) && !board.is_fixed_slot(row, col) {
                cells.push(c);
            }
        }
    }
    cells
}

/// Randomly pick `percent`% of the non-fixed cells that are not excluded.
pub fn purify(
    board: &Board,
    percent: u8,
    excluded: impl Fn(Coord) -> bool,
    sampler: &mut dyn CellSampler,
) -> Vec<Coord> {
    let candidates: Vec<Coord> = board.playable_coords().filter(|c| !excluded(*c)).collect();
    let count = candidates.len() * percent.min(100) as usize / 100;
    sampler.sample(&candidates, count)
}
