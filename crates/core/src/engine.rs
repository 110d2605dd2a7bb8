//! Engine module - one playable board and its rules
//!
//! Ties the board, drag tracker and cascade orchestrator together behind the
//! `Idle -> Dragging -> Idle` and `Idle -> Resolving -> Idle` state machine.
//! The two board writers (a drag and a resolve) can never overlap because
//! each refuses to start unless the engine is `Idle`.

use crate::board::Board;
use crate::cascade::{Cascade, CascadeContext, CascadePhase, CascadeReport, PhaseKind};
use crate::config::{ConfigError, EngineConfig};
use crate::drag::DragTracker;
use crate::rng::{CellSampler, GemSource, SimpleRng, UniformGems};
use crate::snapshot::{board_hash, EngineSnapshot};
use crate::tier::{LengthTierTable, TierTable};
use crate::types::{Cell, Coord, EngineState, SlotKind};

/// Result of closing a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragOutcome {
    /// At least one swap survived the gesture; one move was spent.
    pub moved: bool,
}

/// One unit of progress from [`Match3Engine::advance_resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveStep {
    /// Hold for `phase.pause_ms`, then advance again.
    Phase(CascadePhase),
    /// The board is stable again; the engine is back to `Idle`.
    Done(CascadeReport),
    /// The engine was destroyed; nothing further was mutated.
    Aborted,
}

pub struct Match3Engine {
    config: EngineConfig,
    board: Board,
    tiers: Box<dyn TierTable + Send>,
    gems: Box<dyn GemSource + Send>,
    sampler: Box<dyn CellSampler + Send>,
    state: EngineState,
    drag: DragTracker,
    drag_elapsed_ms: u32,
    cascade: Option<Cascade>,
    remaining_moves: u32,
    total_match_count: u32,
    cascade_total: u32,
    score: u32,
    destroyed: bool,
}

impl std::fmt::Debug for Match3Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match3Engine")
            .field("board", &self.board)
            .field("state", &self.state)
            .field("remaining_moves", &self.remaining_moves)
            .field("total_match_count", &self.total_match_count)
            .field("score", &self.score)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl Match3Engine {
    /// Create an engine with a freshly generated, match-free board.
    pub fn new(
        config: EngineConfig,
        tiers: impl TierTable + Send + 'static,
        mut gems: impl GemSource + Send + 'static,
        sampler: impl CellSampler + Send + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let board = Board::generate(
            config.rows,
            config.cols,
            config.gem_kinds,
            &config.fixed_slots,
            &mut gems,
        );
        Ok(Self::assemble(
            config,
            board,
            Box::new(tiers),
            Box::new(gems),
            Box::new(sampler),
        ))
    }

    /// Create an engine around a prepared board.
    ///
    /// The board's shape and fixed slots replace those in `config`.
    pub fn with_board(
        mut config: EngineConfig,
        board: Board,
        tiers: impl TierTable + Send + 'static,
        gems: impl GemSource + Send + 'static,
        sampler: impl CellSampler + Send + 'static,
    ) -> Result<Self, ConfigError> {
        config.rows = board.rows();
        config.cols = board.cols();
        config.fixed_slots = fixed_slots_of(&board);
        config.validate()?;
        Ok(Self::assemble(
            config,
            board,
            Box::new(tiers),
            Box::new(gems),
            Box::new(sampler),
        ))
    }

    /// Default tier table with uniform gems, both seeded from `seed`.
    pub fn seeded(config: EngineConfig, seed: u32) -> Result<Self, ConfigError> {
        Self::new(
            config,
            LengthTierTable::default(),
            UniformGems::new(seed),
            SimpleRng::new(seed.rotate_left(16) ^ 0x9e37_79b9),
        )
    }

    fn assemble(
        config: EngineConfig,
        board: Board,
        tiers: Box<dyn TierTable + Send>,
        gems: Box<dyn GemSource + Send>,
        sampler: Box<dyn CellSampler + Send>,
    ) -> Self {
        Self {
            remaining_moves: config.move_budget,
            config,
            board,
            tiers,
            gems,
            sampler,
            state: EngineState::Idle,
            drag: DragTracker::new(),
            drag_elapsed_ms: 0,
            cascade: None,
            total_match_count: 0,
            cascade_total: 0,
            score: 0,
            destroyed: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn remaining_moves(&self) -> u32 {
        self.remaining_moves
    }

    /// Match groups resolved since the stage started
    pub fn total_match_count(&self) -> u32 {
        self.total_match_count
    }

    pub fn cascade_total(&self) -> u32 {
        self.cascade_total
    }

    /// The stage is cleared by match-group count, not score or cells.
    pub fn is_clear_target_reached(&self) -> bool {
        self.total_match_count >= self.config.clear_target
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn drag_trail(&self) -> &[Coord] {
        self.drag.trail()
    }

    /// Pick up the gem at (row, col).
    ///
    /// Silently ignored on fixed slots, off-board coordinates, while not
    /// `Idle`, with no moves left, or after [`destroy`](Self::destroy).
    pub fn begin_drag(&mut self, row: i8, col: i8) -> bool {
        if self.destroyed || self.state != EngineState::Idle || self.remaining_moves == 0 {
            return false;
        }
        if !self.drag.begin(&self.board, Coord::new(row, col)) {
            return false;
        }
        self.state = EngineState::Dragging;
        self.drag_elapsed_ms = 0;
        tracing::trace!(row, col, "drag started");
        true
    }

    /// Move the gem in hand onto an 8-adjacent cell.
    pub fn step_drag(&mut self, row: i8, col: i8) -> bool {
        if self.destroyed || self.state != EngineState::Dragging {
            return false;
        }
        self.drag
            .step(&mut self.board, Coord::new(row, col))
            .accepted()
    }

    /// Release the gem. Spends one move if the gesture changed anything.
    pub fn end_drag(&mut self) -> DragOutcome {
        if self.destroyed || self.state != EngineState::Dragging {
            return DragOutcome::default();
        }
        let moved = self.drag.end(&mut self.board).unwrap_or(false);
        self.state = EngineState::Idle;
        self.drag_elapsed_ms = 0;
        if moved {
            self.remaining_moves = self.remaining_moves.saturating_sub(1);
        }
        tracing::debug!(moved, remaining_moves = self.remaining_moves, "drag ended");
        DragOutcome { moved }
    }

    /// Advance the drag clock. A drag open past the time limit is released
    /// exactly as if the pointer had been lifted.
    pub fn tick(&mut self, elapsed_ms: u32) -> Option<DragOutcome> {
        if self.state != EngineState::Dragging || self.config.drag_time_limit_ms == 0 {
            return None;
        }
        self.drag_elapsed_ms = self.drag_elapsed_ms.saturating_add(elapsed_ms);
        if self.drag_elapsed_ms < self.config.drag_time_limit_ms {
            return None;
        }
        tracing::debug!(elapsed_ms = self.drag_elapsed_ms, "drag time budget elapsed");
        Some(self.end_drag())
    }

    /// Time left before an open drag is force-ended.
    pub fn drag_time_left_ms(&self) -> Option<u32> {
        if self.state != EngineState::Dragging || self.config.drag_time_limit_ms == 0 {
            return None;
        }
        Some(
            self.config
                .drag_time_limit_ms
                .saturating_sub(self.drag_elapsed_ms),
        )
    }

    /// Enter `Resolving`. Returns false unless the engine was `Idle`.
    pub fn begin_resolve(&mut self) -> bool {
        if self.destroyed || self.state != EngineState::Idle {
            return false;
        }
        self.state = EngineState::Resolving;
        self.cascade = Some(Cascade::new());
        true
    }

    /// Run the cascade up to its next pacing point.
    pub fn advance_resolve(&mut self) -> ResolveStep {
        if self.destroyed {
            self.cascade = None;
            return ResolveStep::Aborted;
        }
        let Some(cascade) = self.cascade.as_mut() else {
            return ResolveStep::Done(CascadeReport::default());
        };

        let mut ctx = CascadeContext {
            board: &mut self.board,
            tiers: self.tiers.as_ref(),
            gems: self.gems.as_mut(),
            sampler: self.sampler.as_mut(),
            config: &self.config,
        };

        match cascade.step(&mut ctx) {
            Some(phase) => {
                if let PhaseKind::Scored { groups, score, .. } = &phase.kind {
                    self.cascade_total += 1;
                    self.total_match_count += groups.len() as u32;
                    self.score = self.score.saturating_add(score.total);
                }
                ResolveStep::Phase(phase)
            }
            None => {
                let report = self
                    .cascade
                    .take()
                    .map(Cascade::into_report)
                    .unwrap_or_default();
                self.state = EngineState::Idle;
                if !report.is_empty() {
                    tracing::debug!(
                        cascades = report.cascades,
                        groups = report.match_groups,
                        score = report.score,
                        "board settled"
                    );
                }
                ResolveStep::Done(report)
            }
        }
    }

    /// Drain every cascade without pausing.
    ///
    /// On an already stable board this mutates nothing and reports zero
    /// cascades. Ignored while a drag is open.
    pub fn resolve_cascades(&mut self) -> CascadeReport {
        if self.state == EngineState::Idle && !self.begin_resolve() {
            return CascadeReport::default();
        }
        if self.state != EngineState::Resolving {
            return CascadeReport::default();
        }
        loop {
            match self.advance_resolve() {
                ResolveStep::Phase(_) => continue,
                ResolveStep::Done(report) => return report,
                ResolveStep::Aborted => return CascadeReport::default(),
            }
        }
    }

    /// Regenerate the board and reset counters. Not allowed mid-resolve.
    pub fn restart(&mut self) -> bool {
        if self.destroyed || self.state == EngineState::Resolving {
            return false;
        }
        self.board = Board::generate(
            self.config.rows,
            self.config.cols,
            self.config.gem_kinds,
            &self.config.fixed_slots,
            self.gems.as_mut(),
        );
        self.drag = DragTracker::new();
        self.drag_elapsed_ms = 0;
        self.state = EngineState::Idle;
        self.remaining_moves = self.config.move_budget;
        self.total_match_count = 0;
        self.cascade_total = 0;
        self.score = 0;
        tracing::info!("engine restarted");
        true
    }

    /// Tear down. Every later call is a no-op and an in-flight resolve is
    /// abandoned at its next resumption.
    pub fn destroy(&mut self) {
        if !self.destroyed {
            tracing::debug!(state = self.state.as_str(), "engine destroyed");
        }
        self.destroyed = true;
    }

    pub fn snapshot_into(&self, out: &mut EngineSnapshot) {
        out.rows = self.board.rows();
        out.cols = self.board.cols();
        self.board.write_codes(&mut out.codes);
        out.board_hash = board_hash(&out.codes);
        out.state = self.state;
        out.score = self.score;
        out.remaining_moves = self.remaining_moves;
        out.total_match_count = self.total_match_count;
        out.cascade_total = self.cascade_total;
        out.clear_target = self.config.clear_target;
        out.clear_target_reached = self.is_clear_target_reached();
        out.trail.clear();
        out.trail.extend_from_slice(self.drag.trail());
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let mut s = EngineSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}

fn fixed_slots_of(board: &Board) -> Vec<(Coord, SlotKind)> {
    board
        .coords()
        .filter_map(|at| match board.at(at) {
            Some(Cell::Fixed(slot)) => Some((at, slot)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PacingConfig;
    use crate::rng::ScriptedGems;

    fn engine(rows: &[&[i32]], gems: ScriptedGems) -> Match3Engine {
        let config = EngineConfig {
            gem_kinds: 3,
            move_budget: 2,
            clear_target: 2,
            pacing: PacingConfig::instant(),
            drag_time_limit_ms: 1000,
            ..EngineConfig::default()
        };
        Match3Engine::with_board(
            config,
            Board::from_rows(rows).unwrap(),
            LengthTierTable::default(),
            gems,
            SimpleRng::new(7),
        )
        .unwrap()
    }

    const STABLE: [&[i32]; 3] = [&[0, 1, 0], &[1, -2, 1], &[0, 1, 2]];

    #[test]
    fn test_seeded_engine_starts_idle_and_stable() {
        let mut engine = Match3Engine::seeded(EngineConfig::default(), 42).unwrap();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.remaining_moves(), EngineConfig::default().move_budget);
        let before = engine.board().clone();
        assert!(engine.resolve_cascades().is_empty());
        assert_eq!(engine.board(), &before);
    }

    #[test]
    fn test_with_board_picks_up_fixed_slots() {
        let engine = engine(&STABLE, ScriptedGems::default());
        assert_eq!(
            engine.config().fixed_slots,
            vec![(Coord::new(1, 1), SlotKind::Dice)]
        );
        assert_eq!((engine.config().rows, engine.config().cols), (3, 3));
    }

    #[test]
    fn test_begin_drag_on_fixed_slot_is_noop() {
        let mut engine = engine(&STABLE, ScriptedGems::default());
        let before = engine.snapshot();
        assert!(!engine.begin_drag(1, 1));
        assert!(!engine.begin_drag(-1, 0));
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_drag_spends_one_move_and_blocks_when_exhausted() {
        let mut engine = engine(&STABLE, ScriptedGems::default());
        assert!(engine.begin_drag(0, 0));
        assert_eq!(engine.state(), EngineState::Dragging);
        assert!(!engine.begin_drag(0, 2));
        assert!(engine.step_drag(0, 1));
        assert!(engine.step_drag(0, 2));
        assert_eq!(engine.end_drag(), DragOutcome { moved: true });
        assert_eq!(engine.remaining_moves(), 1);
        assert_eq!(engine.board().code_rows()[0], vec![1, 0, 0]);

        // A drag that goes nowhere costs nothing.
        assert!(engine.begin_drag(2, 2));
        assert_eq!(engine.end_drag(), DragOutcome { moved: false });
        assert_eq!(engine.remaining_moves(), 1);

        assert!(engine.begin_drag(2, 0));
        assert!(engine.step_drag(2, 1));
        assert!(engine.end_drag().moved);
        assert_eq!(engine.remaining_moves(), 0);
        assert!(!engine.begin_drag(0, 0));
    }

    #[test]
    fn test_tick_force_ends_drag() {
        let mut engine = engine(&STABLE, ScriptedGems::default());
        assert_eq!(engine.tick(5000), None);
        engine.begin_drag(0, 0);
        engine.step_drag(1, 0);
        assert_eq!(engine.tick(600), None);
        assert_eq!(engine.drag_time_left_ms(), Some(400));
        assert_eq!(engine.tick(400), Some(DragOutcome { moved: true }));
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.remaining_moves(), 1);
    }

    #[test]
    fn test_resolve_updates_counters() {
        let mut engine = engine(
            &[&[1, 2, 1], &[2, 1, 2], &[0, 0, 0]],
            ScriptedGems::new([0, 1, 0]),
        );
        let report = engine.resolve_cascades();
        assert_eq!(report.cascades, 1);
        assert_eq!(engine.total_match_count(), 1);
        assert_eq!(engine.cascade_total(), 1);
        assert_eq!(engine.score(), report.score);
        assert!(!engine.is_clear_target_reached());
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_stepwise_resolve_rejects_drags() {
        let mut engine = engine(
            &[&[1, 2, 1], &[2, 1, 2], &[0, 0, 0]],
            ScriptedGems::new([0, 1, 0]),
        );
        assert!(engine.begin_resolve());
        assert!(!engine.begin_resolve());
        let ResolveStep::Phase(first) = engine.advance_resolve() else {
            panic!("expected a phase");
        };
        assert_eq!(first.kind.as_str(), "scored");
        assert_eq!(engine.state(), EngineState::Resolving);
        assert!(!engine.begin_drag(0, 0));

        let mut phases = 1;
        let report = loop {
            match engine.advance_resolve() {
                ResolveStep::Phase(_) => phases += 1,
                ResolveStep::Done(report) => break report,
                ResolveStep::Aborted => panic!("not destroyed"),
            }
        };
        assert_eq!(phases, 3);
        assert_eq!(report.cascades, 1);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_destroy_aborts_in_flight_resolve() {
        let mut engine = engine(
            &[&[1, 2, 1], &[2, 1, 2], &[0, 0, 0]],
            ScriptedGems::new([0, 1, 0]),
        );
        engine.begin_resolve();
        assert!(matches!(engine.advance_resolve(), ResolveStep::Phase(_)));
        let frozen = engine.board().clone();

        engine.destroy();
        assert_eq!(engine.advance_resolve(), ResolveStep::Aborted);
        assert_eq!(engine.advance_resolve(), ResolveStep::Aborted);
        assert_eq!(engine.board(), &frozen);
        assert!(!engine.begin_drag(0, 0));
        assert!(!engine.restart());
    }

    #[test]
    fn test_snapshot_reflects_drag() {
        let mut engine = engine(&STABLE, ScriptedGems::default());
        engine.begin_drag(2, 2);
        engine.step_drag(2, 1);
        let snap = engine.snapshot();
        assert_eq!(snap.state, EngineState::Dragging);
        assert_eq!(snap.trail, vec![Coord::new(2, 2), Coord::new(2, 1)]);
        assert_eq!(snap.code(2, 1), Some(2));
        assert_eq!(snap.board_hash, board_hash(&snap.codes));
        assert_eq!(snap.code(1, 1), Some(-2));
    }
}
