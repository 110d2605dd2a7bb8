//! Cascade tests - full resolve passes through the public engine API

use gem_cascade::core::cascade::MAX_CASCADE_PASSES;
use gem_cascade::core::{
    find_matches, Ability, Board, Cascade, CascadeContext, EngineConfig, GemSource,
    LengthTierTable, Match3Engine, PacingConfig, PhaseKind, ResolveStep, ScriptedGems, SimpleRng,
    SpecialSpawn, TierInfo,
};
use gem_cascade::types::{encode_special, Cell, Coord, EngineState, SlotKind, SpecialKind};

fn config(pacing: PacingConfig) -> EngineConfig {
    EngineConfig {
        gem_kinds: 3,
        move_budget: 5,
        pacing,
        ..EngineConfig::default()
    }
}

fn engine(rows: &[&[i32]], refill: &[u8], pacing: PacingConfig) -> Match3Engine {
    Match3Engine::with_board(
        config(pacing),
        Board::from_rows(rows).unwrap(),
        LengthTierTable::default(),
        ScriptedGems::new(refill.iter().copied()),
        SimpleRng::new(11),
    )
    .unwrap()
}

#[test]
fn test_resolve_on_stable_board_is_a_no_op() {
    let rows: [&[i32]; 3] = [&[0, 1, 0], &[1, -2, 1], &[0, 1, 2]];
    let mut e = engine(&rows, &[], PacingConfig::instant());
    let before = e.snapshot();

    let report = e.resolve_cascades();
    assert_eq!(report.cascades, 0);
    assert!(report.is_empty());
    assert_eq!(e.snapshot(), before);

    // Twice in a row is still nothing.
    assert!(e.resolve_cascades().is_empty());
    assert_eq!(e.state(), EngineState::Idle);
}

#[test]
fn test_vertical_match_falls_and_refills() {
    let rows: [&[i32]; 4] = [&[1, 2, 1], &[0, 1, 2], &[0, -1, 1], &[0, 2, 2]];
    let mut e = engine(&rows, &[2, 1, 2], PacingConfig::instant());

    let report = e.resolve_cascades();
    assert_eq!(report.cascades, 1);
    assert_eq!(report.match_groups, 1);
    assert_eq!(report.cells_cleared, 3);
    assert_eq!(report.score, 30);
    assert_eq!(
        e.board().code_rows(),
        vec![
            vec![2, 2, 1],
            vec![1, 1, 2],
            vec![2, -1, 1],
            vec![1, 2, 2],
        ]
    );
    assert_eq!(e.board().get(2, 1), Some(Cell::Fixed(SlotKind::Chest)));
    assert_eq!(e.total_match_count(), 1);
    assert_eq!(e.cascade_total(), 1);
    assert_eq!(e.score(), 30);
}

#[test]
fn test_four_in_a_row_leaves_a_special_behind() {
    let rows: [&[i32]; 3] = [&[0, 1, 1, 0], &[1, 0, 0, 1], &[2, 2, 2, 2]];
    let pacing = PacingConfig::default();
    let mut e = engine(&rows, &[2, 0, 2], pacing);

    assert!(e.begin_resolve());
    let ResolveStep::Phase(scored) = e.advance_resolve() else {
        panic!("expected scored phase");
    };
    let PhaseKind::Scored {
        groups,
        max_tier,
        spawn,
        ..
    } = &scored.kind
    else {
        panic!("expected scored phase, got {:?}", scored.kind);
    };
    assert_eq!(groups.len(), 1);
    assert_eq!(*max_tier, 2);
    assert_eq!(scored.pause_ms, pacing.score_pause_ms + pacing.pause_per_tier_ms);
    let spawn = spawn.unwrap();
    assert_eq!(spawn.at, Coord::new(2, 2));
    assert_eq!(spawn.kind, SpecialKind::RowLine);

    // Nothing moves on the board until the settle phase.
    assert_eq!(e.board().get(2, 0), Some(Cell::Gem(2)));
    assert_eq!(e.state(), EngineState::Resolving);

    let ResolveStep::Phase(triggered) = e.advance_resolve() else {
        panic!("expected triggered phase");
    };
    assert_eq!(triggered.pause_ms, 0);

    let ResolveStep::Phase(settled) = e.advance_resolve() else {
        panic!("expected settled phase");
    };
    assert_eq!(settled.pause_ms, pacing.settle_pause_ms);

    let ResolveStep::Done(report) = e.advance_resolve() else {
        panic!("expected the board to settle");
    };
    assert_eq!(report.cascades, 1);
    assert_eq!(report.spawned().count(), 1);
    assert_eq!(e.state(), EngineState::Idle);

    let special = encode_special(2, SpecialKind::RowLine);
    assert_eq!(
        e.board().code_rows(),
        vec![vec![2, 0, 1, 2], vec![0, 1, 0, 0], vec![1, 0, special, 1]]
    );
}

#[test]
fn test_mutually_covering_specials_detonate_once_each() {
    let row_a = encode_special(0, SpecialKind::RowLine);
    let row_b = encode_special(1, SpecialKind::RowLine);
    let rows: [&[i32]; 4] = [
        &[row_a, 0, 0, row_b],
        &[1, 2, 1, 2],
        &[2, 1, 2, 1],
        &[1, 2, 1, 2],
    ];
    let mut e = engine(&rows, &[0, 1, 0, 1], PacingConfig::default());

    assert!(e.begin_resolve());
    let mut detonated = Vec::new();
    let mut triggered_pause = None;
    let report = loop {
        match e.advance_resolve() {
            ResolveStep::Phase(phase) => {
                if let PhaseKind::Triggered {
                    detonated: d,
                    extra,
                    ..
                } = &phase.kind
                {
                    detonated.extend(d.iter().copied());
                    assert_eq!(extra, &vec![Coord::new(0, 3)]);
                    triggered_pause = Some(phase.pause_ms);
                }
            }
            ResolveStep::Done(report) => break report,
            ResolveStep::Aborted => panic!("engine was not destroyed"),
        }
    };

    assert_eq!(detonated, vec![Coord::new(0, 0), Coord::new(0, 3)]);
    assert_eq!(triggered_pause, Some(PacingConfig::default().chain_pause_ms));
    assert_eq!(report.cascades, 1);
    assert_eq!(report.cells_cleared, 4);
    assert_eq!(
        e.board().code_rows(),
        vec![
            vec![0, 1, 0, 1],
            vec![1, 2, 1, 2],
            vec![2, 1, 2, 1],
            vec![1, 2, 1, 2],
        ]
    );
}

#[test]
fn test_purify_clears_a_share_of_the_rest() {
    let mut board = Board::from_rows(&[&[1, 2, 1], &[2, 1, 2], &[0, 0, 0]]).unwrap();
    let cfg = config(PacingConfig::default());
    let tiers = |_len: usize| TierInfo {
        tier: 2,
        score_multiplier: 1,
        ability: Some(Ability {
            creates_special: None,
            purify_percent: Some(50),
        }),
    };
    let mut gems = ScriptedGems::default();
    let mut rng = SimpleRng::new(5);
    let mut ctx = CascadeContext {
        board: &mut board,
        tiers: &tiers,
        gems: &mut gems,
        sampler: &mut rng,
        config: &cfg,
    };

    let mut cascade = Cascade::new();
    let _scored = cascade.step(&mut ctx).unwrap();
    let triggered = cascade.step(&mut ctx).unwrap();
    let PhaseKind::Triggered { purified, .. } = &triggered.kind else {
        panic!("expected triggered phase");
    };
    // Six candidates outside the match, half of them go.
    assert_eq!(purified.len(), 3);
    assert!(purified.iter().all(|c| c.row < 2));
    assert_eq!(triggered.pause_ms, cfg.pacing.chain_pause_ms);

    let settled = cascade.step(&mut ctx).unwrap();
    let PhaseKind::Settled { cleared, .. } = &settled.kind else {
        panic!("expected settled phase");
    };
    assert_eq!(cleared.len(), 6);
    assert_eq!(board.empty_count(), 0);
}

#[test]
fn test_drag_then_resolve_end_to_end() {
    let rows: [&[i32]; 4] = [&[0, 1, 0, 2], &[1, 0, 2, 1], &[2, 2, 1, 0], &[0, 1, -5, 2]];
    let mut e = engine(&rows, &[2, 0, 1], PacingConfig::instant());

    assert!(e.begin_drag(2, 2));
    assert!(e.step_drag(1, 2));
    assert!(e.end_drag().moved);
    assert_eq!(e.remaining_moves(), 4);

    let report = e.resolve_cascades();
    assert_eq!(report.cascades, 1);
    assert_eq!(report.score, 30);
    assert_eq!(
        e.board().code_rows(),
        vec![
            vec![2, 0, 1, 2],
            vec![0, 1, 0, 1],
            vec![1, 0, 1, 0],
            vec![0, 1, -5, 2],
        ]
    );
    assert!(!e.is_clear_target_reached());
}

#[test]
fn test_destroy_mid_resolve_aborts() {
    let rows: [&[i32]; 3] = [&[1, 2, 1], &[2, 1, 2], &[0, 0, 0]];
    let mut e = engine(&rows, &[0, 1, 0], PacingConfig::default());
    assert!(e.begin_resolve());
    assert!(matches!(e.advance_resolve(), ResolveStep::Phase(_)));
    let before = e.board().clone();

    e.destroy();
    assert_eq!(e.advance_resolve(), ResolveStep::Aborted);
    assert_eq!(e.board(), &before);
    assert!(!e.begin_drag(0, 0));
}

#[test]
fn test_six_by_six_swaps_with_and_without_a_match() {
    let rows: [&[i32]; 6] = [
        &[0, 0, 1, 2, 1, 2],
        &[1, 2, 2, 0, 0, 1],
        &[2, 1, 0, 1, 2, 0],
        &[0, 2, 1, 2, 0, 1],
        &[1, 0, 2, 0, 1, 2],
        &[2, 1, 0, 1, 2, 0],
    ];
    let mut e = engine(&rows, &[0, 0, 1], PacingConfig::instant());
    assert!(find_matches(e.board()).is_empty());

    // Swapping (0, 1) and (0, 2) lines nothing up.
    assert!(e.begin_drag(0, 1));
    assert!(e.step_drag(0, 2));
    assert!(e.end_drag().moved);
    assert_eq!(e.board().code_rows()[0], vec![0, 1, 0, 2, 1, 2]);
    let report = e.resolve_cascades();
    assert_eq!(report.cascades, 0);
    assert_eq!(e.score(), 0);

    // Dropping the 0 at (2, 2) into row 1 makes 0, 0, 0 across columns 2..=4.
    assert!(e.begin_drag(1, 2));
    assert!(e.step_drag(2, 2));
    assert!(e.end_drag().moved);
    assert_eq!(e.board().code_rows()[1], vec![1, 2, 0, 0, 0, 1]);

    let report = e.resolve_cascades();
    assert_eq!(report.cascades, 1);
    assert_eq!(report.match_groups, 1);
    assert_eq!(report.score, 30);
    assert!(!report.cut_short);
    let mut cleared = report.passes[0].cleared.clone();
    cleared.sort();
    assert_eq!(
        cleared,
        vec![Coord::new(1, 2), Coord::new(1, 3), Coord::new(1, 4)]
    );
    assert_eq!(
        e.board().code_rows(),
        vec![
            vec![0, 1, 0, 0, 1, 2],
            vec![1, 2, 0, 2, 1, 1],
            vec![2, 1, 2, 1, 2, 0],
            vec![0, 2, 1, 2, 0, 1],
            vec![1, 0, 2, 0, 1, 2],
            vec![2, 1, 0, 1, 2, 0],
        ]
    );
    assert_eq!(e.remaining_moves(), 3);
}

#[test]
fn test_five_in_a_row_row_line_survives_its_own_pass() {
    let rows: [&[i32]; 3] = [&[1, 2, 1, 2, 1], &[2, 1, 2, 1, 2], &[0, 0, 0, 0, 0]];
    let tiers = |len: usize| {
        if len >= 5 {
            TierInfo {
                tier: 2,
                score_multiplier: 1,
                ability: Some(Ability {
                    creates_special: Some(SpecialKind::RowLine),
                    purify_percent: None,
                }),
            }
        } else {
            TierInfo::plain(1, 1)
        }
    };
    let mut e = Match3Engine::with_board(
        config(PacingConfig::instant()),
        Board::from_rows(&rows).unwrap(),
        tiers,
        ScriptedGems::new([0, 2, 0, 2]),
        SimpleRng::new(3),
    )
    .unwrap();

    let report = e.resolve_cascades();
    assert_eq!(report.cascades, 1);
    let pass = &report.passes[0];
    assert_eq!(
        pass.spawned,
        Some(SpecialSpawn {
            at: Coord::new(2, 2),
            gem: 0,
            kind: SpecialKind::RowLine,
            tier: 2,
        })
    );
    assert!(pass.detonated.is_empty());
    assert_eq!(pass.cleared.len(), 4);
    assert!(!pass.cleared.contains(&Coord::new(2, 2)));

    let special = encode_special(0, SpecialKind::RowLine);
    assert_eq!(
        e.board().code_rows(),
        vec![
            vec![0, 2, 1, 0, 2],
            vec![1, 2, 1, 2, 1],
            vec![2, 1, special, 1, 2],
        ]
    );
}

/// Refills every cell with the same gem, so a full row never settles.
struct SameGem(u8);

impl GemSource for SameGem {
    fn next_gem(&mut self, _gem_kinds: u8) -> u8 {
        self.0
    }
}

#[test]
fn test_endless_refill_is_cut_short_at_the_pass_limit() {
    let rows: [&[i32]; 1] = [&[0, 0, 0]];
    let mut e = Match3Engine::with_board(
        config(PacingConfig::instant()),
        Board::from_rows(&rows).unwrap(),
        LengthTierTable::default(),
        SameGem(0),
        SimpleRng::new(1),
    )
    .unwrap();

    let report = e.resolve_cascades();
    assert!(report.cut_short);
    assert_eq!(report.cascades, MAX_CASCADE_PASSES);
    assert_eq!(e.state(), EngineState::Idle);
    assert!(!find_matches(e.board()).is_empty());

    // A board that settles on its own is never flagged.
    let rows: [&[i32]; 2] = [&[0, 1, 0], &[1, 0, 1]];
    let mut e = engine(&rows, &[], PacingConfig::instant());
    assert!(!e.resolve_cascades().cut_short);
}
