//! Gem Cascade (workspace facade crate).
//!
//! Re-exports the member crates under stable names so callers depend on one
//! package: `gem_cascade::{core, engine, input, adapter, types}`.

pub use gem_cascade_adapter as adapter;
pub use gem_cascade_core as core;
pub use gem_cascade_engine as engine;
pub use gem_cascade_input as input;
pub use gem_cascade_types as types;

pub mod serve;
