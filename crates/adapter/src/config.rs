//! Game configuration file.
//!
//! A JSON document holding everything needed to build an engine: board
//! shape, fixed slots, budgets, scoring, pacing, the gem distribution and
//! the tier table. Every field is optional and falls back to the engine
//! defaults.

use std::path::Path;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::core::{
    Ability, EngineConfig, LengthTierTable, Match3Engine, PacingConfig, ScoringConfig, SimpleRng,
    TierInfo, UniformGems, WeightedGems,
};
use crate::types::{Coord, SlotKind, SpecialKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfigFile {
    pub rows: u8,
    pub cols: u8,
    pub gem_kinds: u8,
    pub move_budget: u32,
    pub clear_target: u32,
    /// Seeds both the gem source and the cell sampler
    pub seed: u32,
    pub fixed_slots: Vec<FixedSlotEntry>,
    pub scoring: ScoringSection,
    pub pacing: PacingSection,
    pub drag_time_limit_ms: u32,
    pub lightning_targets: usize,
    /// Per-gem weights; uniform distribution when absent
    pub gem_weights: Option<Vec<u32>>,
    /// Empty means the stock length table
    pub tiers: Vec<TierEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedSlotEntry {
    pub row: i8,
    pub col: i8,
    /// `chest`, `dice`, `equipment`, `hero` or `pet`
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringSection {
    pub base_per_cell: u32,
    pub cross_bonus: u32,
    pub combo_base: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PacingSection {
    pub score_pause_ms: u32,
    pub pause_per_tier_ms: u32,
    pub chain_pause_ms: u32,
    pub settle_pause_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierEntry {
    pub min_len: usize,
    pub tier: u8,
    pub score_multiplier: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creates_special: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purify_percent: Option<u8>,
}

impl Default for ScoringSection {
    fn default() -> Self {
        ScoringConfig::default().into()
    }
}

impl From<ScoringConfig> for ScoringSection {
    fn from(value: ScoringConfig) -> Self {
        Self {
            base_per_cell: value.base_per_cell,
            cross_bonus: value.cross_bonus,
            combo_base: value.combo_base,
        }
    }
}

impl From<ScoringSection> for ScoringConfig {
    fn from(value: ScoringSection) -> Self {
        Self {
            base_per_cell: value.base_per_cell,
            cross_bonus: value.cross_bonus,
            combo_base: value.combo_base,
        }
    }
}

impl Default for PacingSection {
    fn default() -> Self {
        PacingConfig::default().into()
    }
}

impl From<PacingConfig> for PacingSection {
    fn from(value: PacingConfig) -> Self {
        Self {
            score_pause_ms: value.score_pause_ms,
            pause_per_tier_ms: value.pause_per_tier_ms,
            chain_pause_ms: value.chain_pause_ms,
            settle_pause_ms: value.settle_pause_ms,
        }
    }
}

impl From<PacingSection> for PacingConfig {
    fn from(value: PacingSection) -> Self {
        Self {
            score_pause_ms: value.score_pause_ms,
            pause_per_tier_ms: value.pause_per_tier_ms,
            chain_pause_ms: value.chain_pause_ms,
            settle_pause_ms: value.settle_pause_ms,
        }
    }
}

impl From<&EngineConfig> for GameConfigFile {
    fn from(value: &EngineConfig) -> Self {
        Self {
            rows: value.rows,
            cols: value.cols,
            gem_kinds: value.gem_kinds,
            move_budget: value.move_budget,
            clear_target: value.clear_target,
            seed: 1,
            fixed_slots: value
                .fixed_slots
                .iter()
                .map(|(at, kind)| FixedSlotEntry {
                    row: at.row,
                    col: at.col,
                    kind: kind.as_str().to_string(),
                })
                .collect(),
            scoring: value.scoring.into(),
            pacing: value.pacing.into(),
            drag_time_limit_ms: value.drag_time_limit_ms,
            lightning_targets: value.lightning_targets,
            gem_weights: None,
            tiers: Vec::new(),
        }
    }
}

impl Default for GameConfigFile {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl GameConfigFile {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading game config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing game config {}", path.display()))
    }

    pub fn parse(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validated engine configuration.
    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let fixed_slots = self
            .fixed_slots
            .iter()
            .map(|slot| {
                SlotKind::from_str(&slot.kind)
                    .map(|kind| (Coord::new(slot.row, slot.col), kind))
                    .ok_or_else(|| anyhow!("unknown fixed slot kind {:?}", slot.kind))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let config = EngineConfig {
            rows: self.rows,
            cols: self.cols,
            gem_kinds: self.gem_kinds,
            move_budget: self.move_budget,
            clear_target: self.clear_target,
            fixed_slots,
            scoring: self.scoring.into(),
            pacing: self.pacing.into(),
            drag_time_limit_ms: self.drag_time_limit_ms,
            lightning_targets: self.lightning_targets,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn tier_table(&self) -> anyhow::Result<LengthTierTable> {
        if self.tiers.is_empty() {
            return Ok(LengthTierTable::default());
        }
        let mut rows = Vec::with_capacity(self.tiers.len());
        for entry in &self.tiers {
            let creates_special = match entry.creates_special.as_deref() {
                Some(name) => Some(
                    SpecialKind::from_str(name)
                        .ok_or_else(|| anyhow!("unknown special kind {:?}", name))?,
                ),
                None => None,
            };
            if entry.purify_percent.map_or(false, |p| p > 100) {
                return Err(anyhow!(
                    "purify_percent must be at most 100 (tier {})",
                    entry.tier
                ));
            }
            let ability = (creates_special.is_some() || entry.purify_percent.is_some()).then_some(
                Ability {
                    creates_special,
                    purify_percent: entry.purify_percent,
                },
            );
            rows.push((
                entry.min_len,
                TierInfo {
                    tier: entry.tier,
                    score_multiplier: entry.score_multiplier,
                    ability,
                },
            ));
        }
        Ok(LengthTierTable::new(rows))
    }

    pub fn build_engine(&self) -> anyhow::Result<Match3Engine> {
        let config = self.engine_config()?;
        let tiers = self.tier_table()?;
        let sampler = SimpleRng::new(self.seed.rotate_left(16) ^ 0x9e37_79b9);
        let engine = match &self.gem_weights {
            Some(weights) => Match3Engine::new(
                config,
                tiers,
                WeightedGems::new(self.seed, weights.clone()),
                sampler,
            )?,
            None => Match3Engine::new(config, tiers, UniformGems::new(self.seed), sampler)?,
        };
        tracing::debug!(
            rows = self.rows,
            cols = self.cols,
            gem_kinds = self.gem_kinds,
            weighted = self.gem_weights.is_some(),
            "engine built from config"
        );
        Ok(engine)
    }
}
