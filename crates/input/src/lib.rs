//! Pointer input module (engine-facing).
//!
//! This module is independent of any UI framework. It maps raw pointer
//! positions in board pixel space onto cells and turns a continuous drag into
//! the chain of 8-adjacent cell crossings the engine's `step_drag` expects,
//! so a fast pointer that skips cells between samples still produces a
//! valid swap chain.

pub mod pointer;

pub use gem_cascade_types as types;

pub use pointer::{DragCommand, DragPath, PointerEvent, PointerMapper, MAX_COMMANDS};
