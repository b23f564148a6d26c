//! Model builders that feed the generic engine
//!
//! A model turns its canonical input (a sample image or a tile catalog)
//! into the data the solver consumes: weights, compatibility table, and
//! boundary radius, plus the reverse mapping back to renderable pixels. The
//! engine itself never learns which kind of model drives it.

use image::RgbaImage;

use crate::io::error::Result;
use crate::solver::{RunOutcome, Solver};

/// The overlapping-sample model
pub mod overlapping;
/// The tile-catalog model
pub mod tiled;

pub use overlapping::{OverlappingModel, OverlappingOptions};
pub use tiled::{TiledModel, TiledOptions};

/// Capability shared by the two model kinds: solve and render
pub trait GridModel {
    /// The solver this model drives
    fn solver(&self) -> &Solver;

    /// Mutable access to the solver
    fn solver_mut(&mut self) -> &mut Solver;

    /// Render the current wave: final output after a solve, a weighted
    /// blend of survivors otherwise
    ///
    /// # Errors
    ///
    /// Returns an error when the model lacks the assets rendering needs.
    fn render(&self) -> Result<RgbaImage>;

    /// Solve one seeded attempt
    fn run(&mut self, seed: u64, limit: Option<usize>) -> RunOutcome {
        self.solver_mut().run(seed, limit)
    }
}
