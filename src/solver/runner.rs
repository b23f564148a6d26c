//! The solver loop: observe, propagate, and classify the outcome

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::io::error::{GenerationError, Result};
use crate::math::sampling::weighted_choice;
use crate::solver::heuristic::{Heuristic, next_unobserved_cell};
use crate::solver::propagation::{Propagator, propagate};
use crate::solver::wave::{Wave, WeightTable};
use crate::spatial::GridTopology;
use crate::spatial::topology::DIRECTION_COUNT;

/// Terminal classification of one attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every eligible cell collapsed to a single value
    Solved,
    /// Some cell's domain emptied; the attempt is unsalvageable
    Contradiction,
    /// The iteration budget ran out first; the caller decides what that means
    Incomplete,
}

/// Immutable data a model builder feeds the engine
///
/// The engine is parameterized purely by this data; the two model kinds
/// differ only in how they produce it.
#[derive(Clone, Debug)]
pub struct ModelData {
    /// Positive relative frequency per value
    pub weights: Vec<f64>,
    /// Per-direction compatibility lists, mutual across opposite directions
    pub allowed: [Vec<Vec<usize>>; DIRECTION_COUNT],
    /// Pattern size N driving the non-periodic boundary margin (1 for tiles)
    pub boundary_radius: usize,
    /// Optional value pinned along the bottom row and banned everywhere else
    pub ground: Option<usize>,
}

/// Output grid shape and solving policy
#[derive(Clone, Copy, Debug)]
pub struct SolverOptions {
    /// Output width in cells
    pub width: usize,
    /// Output height in cells
    pub height: usize,
    /// Whether the output wraps at its edges
    pub periodic: bool,
    /// Cell selection policy
    pub heuristic: Heuristic,
}

/// One cell of a renderable snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellView {
    /// The cell collapsed to a single value
    Resolved(usize),
    /// Surviving values, to be blended by their weights
    Superposed(Vec<usize>),
}

/// Generic constraint solver over a grid of value superpositions
///
/// Owns one wave and is driven by immutable model data. `run` is re-entrant:
/// each call resets the wave and consumes nothing but the seed, so attempts
/// with fresh seeds can be replayed on the same solver (or on clones sharing
/// copies of the same tables) after a contradiction.
#[derive(Clone, Debug)]
pub struct Solver {
    topology: GridTopology,
    propagator: Propagator,
    weights: WeightTable,
    heuristic: Heuristic,
    ground: Option<usize>,
    wave: Wave,
    cursor: usize,
    observed: Option<Vec<usize>>,
    outcome: Option<RunOutcome>,
    distribution: Vec<f64>,
}

impl Solver {
    /// Assemble a solver from model data and grid options
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the grid is empty, the weight
    /// table is malformed, the compatibility tables are inconsistent, or the
    /// ground value is out of range.
    pub fn new(data: ModelData, options: SolverOptions) -> Result<Self> {
        if options.width == 0 || options.height == 0 {
            return Err(GenerationError::InvalidParameter {
                parameter: "dimensions",
                value: format!("{}x{}", options.width, options.height),
                reason: "output grid must have at least one cell".to_string(),
            });
        }

        let weights = WeightTable::new(data.weights)?;
        let propagator = Propagator::new(data.allowed)?;
        if propagator.value_count() != weights.len() {
            return Err(GenerationError::Configuration {
                reason: format!(
                    "compatibility table covers {} values but {} weights were supplied",
                    propagator.value_count(),
                    weights.len()
                ),
            });
        }
        if let Some(ground) = data.ground {
            if ground >= weights.len() {
                return Err(GenerationError::InvalidParameter {
                    parameter: "ground",
                    value: ground.to_string(),
                    reason: format!("only {} values exist", weights.len()),
                });
            }
        }

        let topology = GridTopology::new(
            options.width,
            options.height,
            options.periodic,
            data.boundary_radius.max(1),
        );
        let wave = Wave::new(topology.cell_count(), weights.len());
        let distribution = Vec::with_capacity(weights.len());

        Ok(Self {
            topology,
            propagator,
            weights,
            heuristic: options.heuristic,
            ground: data.ground,
            wave,
            cursor: 0,
            observed: None,
            outcome: None,
            distribution,
        })
    }

    /// Solve one attempt, deterministic in `seed`
    ///
    /// `limit` caps the number of observation/propagation rounds; `None`
    /// runs until a terminal state. Exhausting the budget yields
    /// [`RunOutcome::Incomplete`] with the wave left partially collapsed for
    /// snapshot rendering.
    pub fn run(&mut self, seed: u64, limit: Option<usize>) -> RunOutcome {
        self.wave.reset(&self.propagator, &self.weights);
        self.cursor = 0;
        self.observed = None;
        self.outcome = None;

        let mut rng = StdRng::seed_from_u64(seed);

        if !self.apply_ground() {
            return self.finish(RunOutcome::Contradiction);
        }

        let mut rounds = 0usize;
        loop {
            if limit.is_some_and(|budget| rounds >= budget) {
                return self.finish(RunOutcome::Incomplete);
            }

            let Some(cell) = next_unobserved_cell(
                &self.wave,
                &self.topology,
                self.heuristic,
                &mut self.cursor,
                &mut rng,
            ) else {
                self.materialize();
                return self.finish(RunOutcome::Solved);
            };

            self.observe(cell, &mut rng);
            if !propagate(
                &mut self.wave,
                &self.topology,
                &self.propagator,
                &self.weights,
            ) {
                return self.finish(RunOutcome::Contradiction);
            }

            rounds += 1;
        }
    }

    /// Collapse one cell to a weighted random surviving value
    ///
    /// Every other surviving value is banned, queueing the propagation wave
    /// the caller drains next.
    fn observe(&mut self, cell: usize, rng: &mut StdRng) {
        self.distribution.clear();
        for value in 0..self.weights.len() {
            self.distribution.push(if self.wave.is_possible(cell, value) {
                self.weights.weight(value)
            } else {
                0.0
            });
        }

        let chosen = weighted_choice(&self.distribution, rng.random::<f64>())
            .or_else(|| self.wave.first_possible(cell));
        let Some(chosen) = chosen else {
            return;
        };

        for value in 0..self.weights.len() {
            if value != chosen && self.wave.is_possible(cell, value) {
                self.wave.ban(cell, value, &self.weights);
            }
        }
    }

    /// Pin the ground value along the bottom row and ban it elsewhere
    ///
    /// Returns whether the wave survived the pre-propagation.
    fn apply_ground(&mut self) -> bool {
        let Some(ground) = self.ground else {
            return true;
        };

        let (width, height) = (self.topology.width(), self.topology.height());
        for x in 0..width {
            let bottom = self.topology.index(x, height - 1);
            for value in 0..self.weights.len() {
                if value != ground {
                    self.wave.ban(bottom, value, &self.weights);
                }
            }
            for y in 0..height.saturating_sub(1) {
                self.wave.ban(self.topology.index(x, y), ground, &self.weights);
            }
        }

        propagate(
            &mut self.wave,
            &self.topology,
            &self.propagator,
            &self.weights,
        )
    }

    fn materialize(&mut self) {
        let grid = (0..self.wave.cell_count())
            .map(|cell| self.wave.first_possible(cell).unwrap_or(0))
            .collect();
        self.observed = Some(grid);
    }

    const fn finish(&mut self, outcome: RunOutcome) -> RunOutcome {
        self.outcome = Some(outcome);
        outcome
    }

    /// Materialized grid in raster order, present only after a solve
    pub fn observed(&self) -> Option<&[usize]> {
        self.observed.as_deref()
    }

    /// Outcome of the most recent attempt
    pub const fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    /// Per-cell view of the wave, usable in any state
    ///
    /// Determined cells report their single value; everything else lists the
    /// survivors for weighted-blend rendering.
    pub fn snapshot(&self) -> Vec<CellView> {
        (0..self.wave.cell_count())
            .map(|cell| {
                let survivors = self.wave.possible_values(cell);
                match (survivors.len(), survivors.first().copied()) {
                    (1, Some(value)) => CellView::Resolved(value),
                    _ => CellView::Superposed(survivors),
                }
            })
            .collect()
    }

    /// Grid topology in use
    pub const fn topology(&self) -> &GridTopology {
        &self.topology
    }

    /// Compatibility table in use
    pub const fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// Weight of one value
    pub fn weight(&self, value: usize) -> f64 {
        self.weights.weight(value)
    }

    /// Number of values per cell
    pub const fn value_count(&self) -> usize {
        self.weights.len()
    }

    /// Whether a value still survives at a cell
    pub fn is_possible(&self, cell: usize, value: usize) -> bool {
        self.wave.is_possible(cell, value)
    }

    /// Count of surviving values at a cell
    pub fn remaining(&self, cell: usize) -> usize {
        self.wave.remaining(cell)
    }

    /// Cached entropy of a cell
    pub fn entropy(&self, cell: usize) -> f64 {
        self.wave.entropy(cell)
    }

    /// Sum of surviving weights at a cell
    pub fn weight_sum(&self, cell: usize) -> f64 {
        self.wave.weight_sum(cell)
    }

    /// Current support count for a (cell, value, direction), for invariants
    pub fn support_count(&self, cell: usize, value: usize, direction: usize) -> i32 {
        self.wave.support_count(cell, value, direction)
    }
}
