//! Tier policy.
//!
//! The engine never hard-codes which match lengths earn what; it asks a
//! [`TierTable`] supplied at construction. [`LengthTierTable`] is the stock
//! threshold table and can be loaded from configuration.

use crate::types::SpecialKind;

/// Ability attached to a tier (tier >= 2 in practice)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ability {
    /// Spawn a special tile of this kind at the group's middle cell
    pub creates_special: Option<SpecialKind>,
    /// Clear this percentage of the remaining board at random
    pub purify_percent: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierInfo {
    pub tier: u8,
    pub score_multiplier: u32,
    pub ability: Option<Ability>,
}

impl TierInfo {
    pub const fn plain(tier: u8, score_multiplier: u32) -> Self {
        Self {
            tier,
            score_multiplier,
            ability: None,
        }
    }

    pub fn creates_special(&self) -> Option<SpecialKind> {
        self.ability.and_then(|a| a.creates_special)
    }

    pub fn purify_percent(&self) -> Option<u8> {
        self.ability.and_then(|a| a.purify_percent)
    }
}

/// Maps a match length to its tier. Must be pure.
pub trait TierTable {
    fn lookup(&self, match_len: usize) -> TierInfo;
}

impl<F> TierTable for F
where
    F: Fn(usize) -> TierInfo,
{
    fn lookup(&self, match_len: usize) -> TierInfo {
        self(match_len)
    }
}

/// Threshold table: the last row whose `min_len <= len` wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthTierTable {
    rows: Vec<(usize, TierInfo)>,
}

impl LengthTierTable {
    /// Rows are sorted by `min_len`; duplicates keep the last entry.
    pub fn new(mut rows: Vec<(usize, TierInfo)>) -> Self {
        rows.sort_by_key(|&(min_len, _)| min_len);
        rows.dedup_by(|later, earlier| {
            if later.0 == earlier.0 {
                *earlier = *later;
                true
            } else {
                false
            }
        });
        Self { rows }
    }

    pub fn rows(&self) -> &[(usize, TierInfo)] {
        &self.rows
    }
}

impl Default for LengthTierTable {
    fn default() -> Self {
        let special = |kind| {
            Some(Ability {
                creates_special: Some(kind),
                purify_percent: None,
            })
        };
        Self::new(vec![
            (3, TierInfo::plain(1, 1)),
            (
                4,
                TierInfo {
                    tier: 2,
                    score_multiplier: 2,
                    ability: special(SpecialKind::RowLine),
                },
            ),
            (
                5,
                TierInfo {
                    tier: 3,
                    score_multiplier: 3,
                    ability: special(SpecialKind::Area),
                },
            ),
            (
                6,
                TierInfo {
                    tier: 4,
                    score_multiplier: 4,
                    ability: special(SpecialKind::Rainbow),
                },
            ),
            (
                7,
                TierInfo {
                    tier: 5,
                    score_multiplier: 5,
                    ability: Some(Ability {
                        creates_special: Some(SpecialKind::Mega),
                        purify_percent: Some(20),
                    }),
                },
            ),
        ])
    }
}

impl TierTable for LengthTierTable {
    fn lookup(&self, match_len: usize) -> TierInfo {
        self.rows
            .iter()
            .rev()
            .find(|&&(min_len, _)| min_len <= match_len)
            .map(|&(_, info)| info)
            .unwrap_or(TierInfo::plain(1, 1))
    }
}
