//! Core game logic - pure, deterministic, and testable
//!
//! This crate contains the match-3 rules: the board, match detection, special
//! tiles, cascades and gravity. It has **no dependencies** on rendering,
//! networking or I/O; the only side channel is `tracing` diagnostics.
//!
//! # Module Structure
//!
//! - [`board`]: the grid of [`Cell`](types::Cell)s with fixed-slot protection
//! - [`matcher`]: horizontal and vertical run detection
//! - [`tier`]: pluggable match-length policy ([`TierTable`])
//! - [`special`]: special tile spawn choice, detonation areas, purify
//! - [`gravity`]: per-column compaction and refill
//! - [`scoring`]: per-pass score breakdown
//! - [`cascade`]: the detect/score/trigger/clear/gravity loop as a state machine
//! - [`drag`]: the swap chain of one drag gesture
//! - [`engine`]: [`Match3Engine`], which owns all of the above
//! - [`rng`]: LCG, gem sources and cell sampling
//!
//! # Example
//!
//! ```
//! use gem_cascade_core::{EngineConfig, Match3Engine};
//!
//! let mut engine = Match3Engine::seeded(EngineConfig::default(), 12345).unwrap();
//!
//! // Drag the top-left gem one cell to the right.
//! if engine.begin_drag(0, 0) {
//!     engine.step_drag(0, 1);
//!     if engine.end_drag().moved {
//!         let report = engine.resolve_cascades();
//!         assert_eq!(engine.total_match_count(), report.match_groups);
//!     }
//! }
//! assert_eq!(engine.board().empty_count(), 0);
//! ```
//!
//! # Pacing
//!
//! [`Match3Engine::advance_resolve`] stops at three points per cascade pass
//! (scored, triggered, settled) and reports how long a presentation layer
//! should pause. Headless callers use [`Match3Engine::resolve_cascades`].

pub mod board;
pub mod cascade;
pub mod config;
pub mod drag;
pub mod engine;
pub mod gravity;
pub mod matcher;
pub mod rng;
pub mod scoring;
pub mod snapshot;
pub mod special;
pub mod tier;

pub use gem_cascade_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use cascade::{Cascade, CascadeContext, CascadePhase, CascadeReport, PassReport, PhaseKind};
pub use config::{ConfigError, EngineConfig, PacingConfig, ScoringConfig};
pub use drag::{DragTracker, StepResult};
pub use engine::{DragOutcome, Match3Engine, ResolveStep};
pub use gravity::{apply_gravity, Fall, GravityReport};
pub use matcher::{find_matches, matched_cells, MatchGroup};
pub use rng::{CellSampler, GemSource, ScriptedGems, SimpleRng, UniformGems, WeightedGems};
pub use scoring::{score_pass, ScoreBreakdown};
pub use snapshot::{board_hash, EngineSnapshot};
pub use special::{detonate, SpecialSpawn};
pub use tier::{Ability, LengthTierTable, TierInfo, TierTable};
