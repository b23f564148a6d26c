//! Mathematical utilities for the solver

/// Weighted random selection from cumulative sums
pub mod sampling;
