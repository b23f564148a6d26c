//! Spatial addressing for the output grid
//!
//! Cells are identified by a linear index in raster order. The topology owns
//! the periodic/non-periodic boundary rules and neighbor arithmetic used by
//! propagation and observation.

/// Grid topology, direction tables, and boundary predicate
pub mod topology;

pub use topology::GridTopology;
