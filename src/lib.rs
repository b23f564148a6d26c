//! Wave function collapse pattern generation for pixel and tile grids
//!
//! The engine keeps one superposition of values per grid cell and alternates
//! weighted random observation with arc-consistency propagation until the
//! grid is solved or a cell runs out of values. Models translate sample
//! images or tile catalogs into the compatibility data the engine consumes.

#![forbid(unsafe_code)]

/// Input/output operations and error handling
pub mod io;
/// Sampling utilities for weighted random selection
pub mod math;
/// Model builders: overlapping samples and tile catalogs
pub mod model;
/// The generic constraint solver: wave, propagation, heuristics, run loop
pub mod solver;
/// Grid topology and direction tables
pub mod spatial;

pub use io::error::{GenerationError, Result};
