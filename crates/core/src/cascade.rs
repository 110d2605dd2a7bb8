//! Cascade orchestrator.
//!
//! One pass runs detect, score, chain-trigger, clear and gravity. Passes repeat
//! until the board holds no match. Instead of sleeping between phases the
//! orchestrator is a state machine: each [`Cascade::step`] performs the work up
//! to the next pacing point and returns a [`CascadePhase`] carrying the pause
//! the presentation layer should hold before calling again. Callers without
//! animation simply drain it.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::board::Board;
use crate::config::EngineConfig;
use crate::gravity::{apply_gravity, GravityReport};
use crate::matcher::{find_matches, matched_cells, MatchGroup};
use crate::rng::{CellSampler, GemSource};
use crate::scoring::{score_pass, ScoreBreakdown};
use crate::special::{choose_spawn, detonate, lookup_tiers, purify, SpecialSpawn};
use crate::tier::{TierInfo, TierTable};
use crate::types::{Cell, Coord};

/// Upper bound on passes per resolve; a refill source that keeps producing
/// matches forever would otherwise never return.
pub const MAX_CASCADE_PASSES: u32 = 256;

/// Everything a pass needs besides its own progress.
pub struct CascadeContext<'a> {
    pub board: &'a mut Board,
    pub tiers: &'a dyn TierTable,
    pub gems: &'a mut dyn GemSource,
    pub sampler: &'a mut dyn CellSampler,
    pub config: &'a EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseKind {
    /// Matches found and scored; nothing on the board has changed yet.
    Scored {
        groups: Vec<MatchGroup>,
        max_tier: u8,
        score: ScoreBreakdown,
        spawn: Option<SpecialSpawn>,
    },
    /// Chain-trigger and purify resolved.
    Triggered {
        /// Special tiles that detonated, in trigger order
        detonated: Vec<Coord>,
        /// Cells added to the clear set by detonations
        extra: Vec<Coord>,
        purified: Vec<Coord>,
    },
    /// Cells cleared and columns settled.
    Settled {
        cleared: Vec<Coord>,
        spawn: Option<SpecialSpawn>,
        gravity: GravityReport,
    },
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Scored { .. } => "scored",
            PhaseKind::Triggered { .. } => "triggered",
            PhaseKind::Settled { .. } => "settled",
        }
    }
}

/// A pacing point. Hold `pause_ms` before advancing again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePhase {
    /// 1-based pass index within this resolve
    pub pass: u32,
    pub pause_ms: u32,
    pub kind: PhaseKind,
}

/// Per-pass summary kept in the final report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub pass: u32,
    pub groups: u32,
    pub max_tier: u8,
    pub score: ScoreBreakdown,
    pub spawned: Option<SpecialSpawn>,
    pub detonated: Vec<Coord>,
    pub cleared: Vec<Coord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Number of passes that found at least one match
    pub cascades: u32,
    /// Match groups resolved (the unit of the clear target)
    pub match_groups: u32,
    pub cells_cleared: u32,
    pub score: u32,
    pub passes: Vec<PassReport>,
    /// Stopped at [`MAX_CASCADE_PASSES`] with matches still on the board
    pub cut_short: bool,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        self.cascades == 0
    }

    pub fn spawned(&self) -> impl Iterator<Item = &SpecialSpawn> {
        self.passes.iter().filter_map(|p| p.spawned.as_ref())
    }
}

#[derive(Debug, Clone)]
struct PendingPass {
    index: u32,
    tiers: Vec<TierInfo>,
    matched: BTreeSet<Coord>,
    spawn: Option<SpecialSpawn>,
    detonated: Vec<Coord>,
}

#[derive(Debug, Clone)]
enum Stage {
    Detect,
    Trigger(PendingPass),
    Clear(PendingPass),
    Done,
}

/// Resolution state machine for one move.
#[derive(Debug, Clone)]
pub struct Cascade {
    stage: Stage,
    report: CascadeReport,
}

impl Default for Cascade {
    fn default() -> Self {
        Self::new()
    }
}

impl Cascade {
    pub fn new() -> Self {
        Self {
            stage: Stage::Detect,
            report: CascadeReport::default(),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Done)
    }

    pub fn report(&self) -> &CascadeReport {
        &self.report
    }

    pub fn into_report(self) -> CascadeReport {
        self.report
    }

    /// Run to the next pacing point. `None` once the board is stable.
    pub fn step(&mut self, ctx: &mut CascadeContext<'_>) -> Option<CascadePhase> {
        match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Detect => self.detect(ctx),
            Stage::Trigger(pass) => Some(self.trigger(ctx, pass)),
            Stage::Clear(pass) => Some(self.clear(ctx, pass)),
            Stage::Done => None,
        }
    }

    /// Drain every remaining phase without pausing.
    pub fn run(mut self, ctx: &mut CascadeContext<'_>) -> CascadeReport {
        while self.step(ctx).is_some() {}
        self.report
    }

    fn detect(&mut self, ctx: &mut CascadeContext<'_>) -> Option<CascadePhase> {
        let groups = find_matches(ctx.board);
        if groups.is_empty() {
            return None;
        }
        if self.report.cascades >= MAX_CASCADE_PASSES {
            tracing::warn!(
                passes = self.report.cascades,
                groups = groups.len(),
                "cascade pass limit reached; leaving board as is"
            );
            self.report.cut_short = true;
            return None;
        }

        let index = self.report.cascades + 1;
        let tiers = lookup_tiers(&groups, ctx.tiers);
        let mut matched = matched_cells(&groups);
        let score = score_pass(
            &groups,
            &tiers,
            matched.len(),
            index,
            &ctx.config.scoring,
        );
        let max_tier = tiers.iter().map(|t| t.tier).max().unwrap_or(1);
        let spawn = choose_spawn(&groups, &tiers);
        if let Some(spawn) = spawn {
            matched.remove(&spawn.at);
        }

        self.report.cascades = index;
        self.report.match_groups += groups.len() as u32;
        self.report.score = self.report.score.saturating_add(score.total);
        self.report.passes.push(PassReport {
            pass: index,
            groups: groups.len() as u32,
            max_tier,
            score,
            spawned: spawn,
            detonated: Vec::new(),
            cleared: Vec::new(),
        });

        tracing::debug!(
            pass = index,
            groups = groups.len(),
            cells = matched.len(),
            max_tier,
            score = score.total,
            "cascade pass scored"
        );

        self.stage = Stage::Trigger(PendingPass {
            index,
            tiers,
            matched,
            spawn,
            detonated: Vec::new(),
        });

        Some(CascadePhase {
            pass: index,
            pause_ms: ctx.config.pacing.score_pause(max_tier),
            kind: PhaseKind::Scored {
                groups,
                max_tier,
                score,
                spawn,
            },
        })
    }

    fn trigger(&mut self, ctx: &mut CascadeContext<'_>, mut pass: PendingPass) -> CascadePhase {
        let anchor = pass.spawn.map(|s| s.at);
        let mut triggered: HashSet<Coord> = HashSet::new();
        let mut queue: VecDeque<Coord> = VecDeque::new();
        let mut extra = Vec::new();

        for &at in &pass.matched {
            if ctx.board.is_special(at.row, at.col) && triggered.insert(at) {
                queue.push_back(at);
            }
        }

        while let Some(at) = queue.pop_front() {
            pass.detonated.push(at);
            for hit in detonate(ctx.board, at, ctx.sampler, ctx.config.lightning_targets) {
                if Some(hit) == anchor {
                    continue;
                }
                if pass.matched.insert(hit) {
                    extra.push(hit);
                }
                if ctx.board.is_special(hit.row, hit.col) && triggered.insert(hit) {
                    queue.push_back(hit);
                }
            }
        }

        let purify_percent = pass.tiers.iter().filter_map(|t| t.purify_percent()).max();
        let purified = match purify_percent {
            Some(percent) if percent > 0 => {
                let matched = &pass.matched;
                let cells = purify(
                    ctx.board,
                    percent,
                    |c| matched.contains(&c) || Some(c) == anchor,
                    ctx.sampler,
                );
                pass.matched.extend(cells.iter().copied());
                cells
            }
            _ => Vec::new(),
        };

        if !pass.detonated.is_empty() || !purified.is_empty() {
            tracing::debug!(
                pass = pass.index,
                detonated = pass.detonated.len(),
                extra = extra.len(),
                purified = purified.len(),
                "chain trigger resolved"
            );
        }

        let pause_ms = if pass.detonated.is_empty() && purified.is_empty() {
            0
        } else {
            ctx.config.pacing.chain_pause_ms
        };
        let phase = CascadePhase {
            pass: pass.index,
            pause_ms,
            kind: PhaseKind::Triggered {
                detonated: pass.detonated.clone(),
                extra,
                purified,
            },
        };
        self.stage = Stage::Clear(pass);
        phase
    }

    fn clear(&mut self, ctx: &mut CascadeContext<'_>, pass: PendingPass) -> CascadePhase {
        let mut columns = BTreeSet::new();
        for &at in &pass.matched {
            if ctx.board.set_at(at, Cell::Empty) {
                columns.insert(at.col);
            }
        }
        if let Some(spawn) = pass.spawn {
            ctx.board.set_at(spawn.at, spawn.cell());
        }

        let gravity = apply_gravity(
            ctx.board,
            columns.iter().copied(),
            ctx.gems,
            ctx.config.gem_kinds,
        );
        debug_assert_eq!(ctx.board.empty_count(), 0, "empty cell survived a pass");

        let cleared: Vec<Coord> = pass.matched.into_iter().collect();
        self.report.cells_cleared += cleared.len() as u32;
        if let Some(summary) = self.report.passes.last_mut() {
            summary.detonated = pass.detonated;
            summary.cleared = cleared.clone();
        }

        tracing::debug!(
            pass = pass.index,
            cleared = cleared.len(),
            fell = gravity.falls.len(),
            spawned = gravity.spawned.len(),
            "cascade pass settled"
        );

        self.stage = Stage::Detect;
        CascadePhase {
            pass: pass.index,
            pause_ms: ctx.config.pacing.settle_pause_ms,
            kind: PhaseKind::Settled {
                cleared,
                spawn: pass.spawn,
                gravity,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PacingConfig;
    use crate::rng::{ScriptedGems, SimpleRng};
    use crate::tier::LengthTierTable;
    use crate::types::SpecialKind;

    fn config(gem_kinds: u8) -> EngineConfig {
        EngineConfig {
            gem_kinds,
            pacing: PacingConfig::default(),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_stable_board_yields_nothing() {
        let mut board = Board::from_rows(&[&[0, 1, 0], &[1, 0, 1], &[0, 1, 0]]).unwrap();
        let before = board.clone();
        let cfg = config(3);
        let tiers = LengthTierTable::default();
        let mut gems = ScriptedGems::default();
        let mut rng = SimpleRng::new(1);
        let mut ctx = CascadeContext {
            board: &mut board,
            tiers: &tiers,
            gems: &mut gems,
            sampler: &mut rng,
            config: &cfg,
        };
        let mut cascade = Cascade::new();
        assert_eq!(cascade.step(&mut ctx), None);
        assert!(cascade.is_done());
        assert!(cascade.report().is_empty());
        assert_eq!(board, before);
    }

    #[test]
    fn test_phases_come_in_order_with_pauses() {
        let mut board = Board::from_rows(&[
            &[1, 2, 1],
            &[2, 1, 2],
            &[0, 0, 0],
        ])
        .unwrap();
        let cfg = config(3);
        let tiers = LengthTierTable::default();
        // Refill breaks every run: columns become [x, 1, 2] / [x, 2, 1] ...
        let mut gems = ScriptedGems::new([0, 1, 0]);
        let mut rng = SimpleRng::new(1);
        let mut ctx = CascadeContext {
            board: &mut board,
            tiers: &tiers,
            gems: &mut gems,
            sampler: &mut rng,
            config: &cfg,
        };
        let mut cascade = Cascade::new();

        let scored = cascade.step(&mut ctx).unwrap();
        assert_eq!(scored.kind.as_str(), "scored");
        assert_eq!(scored.pause_ms, cfg.pacing.score_pause_ms);

        let triggered = cascade.step(&mut ctx).unwrap();
        assert_eq!(triggered.kind.as_str(), "triggered");
        assert_eq!(triggered.pause_ms, 0);

        let settled = cascade.step(&mut ctx).unwrap();
        assert_eq!(settled.kind.as_str(), "settled");
        assert_eq!(settled.pause_ms, cfg.pacing.settle_pause_ms);
        match &settled.kind {
            PhaseKind::Settled { cleared, gravity, .. } => {
                assert_eq!(cleared.len(), 3);
                assert_eq!(gravity.spawned.len(), 3);
                assert_eq!(gravity.falls.len(), 6);
            }
            other => panic!("unexpected phase {:?}", other),
        }

        assert_eq!(cascade.step(&mut ctx), None);
        let report = cascade.into_report();
        assert_eq!(report.cascades, 1);
        assert_eq!(report.match_groups, 1);
        assert_eq!(report.cells_cleared, 3);
        assert_eq!(report.score, 30);
        assert_eq!(board.code_rows(), vec![vec![0, 1, 0], vec![1, 2, 1], vec![2, 1, 2]]);
    }

    #[test]
    fn test_anchor_keeps_new_special() {
        let mut board = Board::from_rows(&[
            &[0, 1, 0, 1, 0],
            &[1, 0, 1, 0, 1],
            &[2, 2, 2, 2, 2],
        ])
        .unwrap();
        let cfg = EngineConfig {
            pacing: PacingConfig::instant(),
            ..config(3)
        };
        let tiers = LengthTierTable::default();
        let mut gems = ScriptedGems::new([1, 0, 1, 0]);
        let mut rng = SimpleRng::new(1);
        let mut ctx = CascadeContext {
            board: &mut board,
            tiers: &tiers,
            gems: &mut gems,
            sampler: &mut rng,
            config: &cfg,
        };
        let mut cascade = Cascade::new();
        let _scored = cascade.step(&mut ctx);
        let _triggered = cascade.step(&mut ctx);
        let settled = cascade.step(&mut ctx).unwrap();
        let PhaseKind::Settled { cleared, spawn, .. } = settled.kind else {
            panic!("expected settled phase");
        };
        let spawn = spawn.unwrap();
        assert_eq!(spawn.at, Coord::new(2, 2));
        assert_eq!(spawn.kind, SpecialKind::Area);
        assert!(!cleared.contains(&spawn.at));
        assert_eq!(cleared.len(), 4);
        assert_eq!(
            board.get(2, 2),
            Some(Cell::Special {
                origin: 2,
                kind: SpecialKind::Area
            })
        );
    }
}
