//! The generic constraint-solving engine
//!
//! The engine is parameterized purely by data (a weight table, a
//! per-direction compatibility table, a boundary radius) and knows nothing
//! about pixels or tiles. Model builders in [`crate::model`] produce that
//! data; rendering reads the engine's snapshots.

/// Cell selection policies
pub mod heuristic;
/// Compatibility table and arc-consistency propagation
pub mod propagation;
/// The observe/propagate loop and outcome state machine
pub mod runner;
/// Per-cell superpositions and incremental statistics
pub mod wave;

pub use heuristic::Heuristic;
pub use propagation::Propagator;
pub use runner::{CellView, ModelData, RunOutcome, Solver, SolverOptions};
pub use wave::{Wave, WeightTable};
