//! Scoring module - per-pass cascade scoring
//!
//! A pass scores `cells * base_per_cell + tier_bonus + cross_bonus + combo_bonus`:
//! - `cells` counts distinct matched cells, so a cell shared by a row and a
//!   column group is paid once.
//! - Tier bonus is `(score_multiplier - 1) * len * base_per_cell` per group.
//! - Cross bonus is a flat amount per (row group, column group) pair of the
//!   same gem that share a cell.
//! - Combo bonus is `combo_base * (cascade_index - 1)`; the first pass of a
//!   move earns none.

use crate::config::ScoringConfig;
use crate::matcher::MatchGroup;
use crate::tier::TierInfo;
use crate::types::Orientation;

/// Score calculation result for one cascade pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreBreakdown {
    /// Distinct matched cells paid at the base rate
    pub cells: u32,
    pub base: u32,
    pub tier_bonus: u32,
    pub cross_bonus: u32,
    pub combo_bonus: u32,
    pub total: u32,
}

/// Calculate combo bonus.
///
/// `cascade_index` is 1-based: the pass triggered directly by the move is 1.
pub fn calculate_combo_bonus(cascade_index: u32, combo_base: u32) -> u32 {
    combo_base.saturating_mul(cascade_index.saturating_sub(1))
}

/// Count (row group, column group) pairs of one gem that intersect.
pub fn count_crossings(groups: &[MatchGroup]) -> u32 {
    let mut crossings = 0;
    for row in groups.iter().filter(|g| g.orientation == Orientation::Row) {
        for col in groups.iter().filter(|g| g.orientation == Orientation::Column) {
            if row.gem == col.gem && row.cells.iter().any(|c| col.contains(*c)) {
                crossings += 1;
            }
        }
    }
    crossings
}

/// Tier bonus over all groups; `tiers[i]` belongs to `groups[i]`.
pub fn calculate_tier_bonus(groups: &[MatchGroup], tiers: &[TierInfo], base_per_cell: u32) -> u32 {
    groups
        .iter()
        .zip(tiers)
        .map(|(group, info)| {
            info.score_multiplier
                .saturating_sub(1)
                .saturating_mul(group.len() as u32)
                .saturating_mul(base_per_cell)
        })
        .fold(0u32, u32::saturating_add)
}

/// Calculate the complete score for one pass.
pub fn score_pass(
    groups: &[MatchGroup],
    tiers: &[TierInfo],
    distinct_cells: usize,
    cascade_index: u32,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    let cells = distinct_cells as u32;
    let base = cells.saturating_mul(config.base_per_cell);
    let tier_bonus = calculate_tier_bonus(groups, tiers, config.base_per_cell);
    let cross_bonus = count_crossings(groups).saturating_mul(config.cross_bonus);
    let combo_bonus = calculate_combo_bonus(cascade_index, config.combo_base);

    ScoreBreakdown {
        cells,
        base,
        tier_bonus,
        cross_bonus,
        combo_bonus,
        total: base
            .saturating_add(tier_bonus)
            .saturating_add(cross_bonus)
            .saturating_add(combo_bonus),
    }
}
