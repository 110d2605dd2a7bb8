//! Composite commands on top of the core engine.
//!
//! The core exposes pointer-level calls (`begin_drag`, `step_drag`,
//! `end_drag`). Remote controllers and tests usually hold a whole drag path
//! up front; this crate applies it as one command with a typed error.

pub mod gesture;

pub use gem_cascade_core as core;
pub use gem_cascade_types as types;

pub use gesture::{apply_gesture, play_gesture, resolve_all, GestureError, GestureOutcome};
