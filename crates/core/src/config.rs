//! Engine configuration.
//!
//! Everything the simulation needs that is not the tier policy itself: board
//! shape, fixed slot layout, budgets, scoring constants and pacing.

use std::fmt;

use crate::types::{
    Coord, SlotKind, BASE_PER_CELL, CHAIN_PAUSE_MS, COMBO_BASE, CROSS_BONUS, DEFAULT_CLEAR_TARGET,
    DEFAULT_COLS, DEFAULT_GEM_KINDS, DEFAULT_MOVE_BUDGET, DEFAULT_ROWS, DRAG_TIME_LIMIT_MS,
    LIGHTNING_TARGETS, MAX_GEM_KINDS, MIN_GEM_KINDS, PAUSE_PER_TIER_MS, SCORE_PAUSE_MS,
    SETTLE_PAUSE_MS,
};

/// Score constants used by [`crate::scoring::score_pass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringConfig {
    pub base_per_cell: u32,
    pub cross_bonus: u32,
    pub combo_base: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_per_cell: BASE_PER_CELL,
            cross_bonus: CROSS_BONUS,
            combo_base: COMBO_BASE,
        }
    }
}

/// Pause lengths attached to cascade phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    pub score_pause_ms: u32,
    pub pause_per_tier_ms: u32,
    pub chain_pause_ms: u32,
    pub settle_pause_ms: u32,
}

impl PacingConfig {
    /// No pauses at all (headless runs, tests).
    pub fn instant() -> Self {
        Self {
            score_pause_ms: 0,
            pause_per_tier_ms: 0,
            chain_pause_ms: 0,
            settle_pause_ms: 0,
        }
    }

    /// Pause after scoring; higher tiers hold longer.
    pub fn score_pause(&self, tier: u8) -> u32 {
        let extra = tier.saturating_sub(1) as u32;
        self.score_pause_ms
            .saturating_add(self.pause_per_tier_ms.saturating_mul(extra))
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            score_pause_ms: SCORE_PAUSE_MS,
            pause_per_tier_ms: PAUSE_PER_TIER_MS,
            chain_pause_ms: CHAIN_PAUSE_MS,
            settle_pause_ms: SETTLE_PAUSE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub rows: u8,
    pub cols: u8,
    /// Number of gem kinds (G); gems are `0..gem_kinds`.
    pub gem_kinds: u8,
    pub move_budget: u32,
    /// Stage is cleared once this many match groups have resolved.
    pub clear_target: u32,
    pub fixed_slots: Vec<(Coord, SlotKind)>,
    pub scoring: ScoringConfig,
    pub pacing: PacingConfig,
    /// 0 disables the drag time budget.
    pub drag_time_limit_ms: u32,
    pub lightning_targets: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            gem_kinds: DEFAULT_GEM_KINDS,
            move_budget: DEFAULT_MOVE_BUDGET,
            clear_target: DEFAULT_CLEAR_TARGET,
            fixed_slots: Vec::new(),
            scoring: ScoringConfig::default(),
            pacing: PacingConfig::default(),
            drag_time_limit_ms: DRAG_TIME_LIMIT_MS,
            lightning_targets: LIGHTNING_TARGETS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        if self.rows > i8::MAX as u8 || self.cols > i8::MAX as u8 {
            return Err(ConfigError::BoardTooLarge {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.gem_kinds < MIN_GEM_KINDS || self.gem_kinds > MAX_GEM_KINDS {
            return Err(ConfigError::GemKinds(self.gem_kinds));
        }
        for (i, &(at, _)) in self.fixed_slots.iter().enumerate() {
            if at.row < 0
                || at.col < 0
                || at.row as u8 >= self.rows
                || at.col as u8 >= self.cols
            {
                return Err(ConfigError::SlotOutOfBounds(at));
            }
            if self.fixed_slots[..i].iter().any(|&(other, _)| other == at) {
                return Err(ConfigError::DuplicateSlot(at));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    EmptyBoard,
    BoardTooLarge { rows: u8, cols: u8 },
    GemKinds(u8),
    SlotOutOfBounds(Coord),
    DuplicateSlot(Coord),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyBoard => write!(f, "board must have at least one row and column"),
            ConfigError::BoardTooLarge { rows, cols } => {
                write!(f, "board {}x{} exceeds {} cells per side", rows, cols, i8::MAX)
            }
            ConfigError::GemKinds(n) => {
                write!(
                    f,
                    "gem_kinds must be in {}..={}, got {}",
                    MIN_GEM_KINDS, MAX_GEM_KINDS, n
                )
            }
            ConfigError::SlotOutOfBounds(at) => {
                write!(f, "fixed slot ({}, {}) is outside the board", at.row, at.col)
            }
            ConfigError::DuplicateSlot(at) => {
                write!(f, "fixed slot ({}, {}) is listed twice", at.row, at.col)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
