//! Per-cell value superpositions with incrementally maintained statistics

use bitvec::prelude::BitVec;
use bitvec::slice::BitSlice;
use ndarray::Array3;

use crate::io::error::{GenerationError, Result};
use crate::solver::propagation::Propagator;
use crate::spatial::topology::DIRECTION_COUNT;

/// Value weights with the derived quantities entropy maintenance needs
///
/// Weights are the relative frequencies supplied by a model builder; they
/// drive both the entropy heuristic and weighted observation. The table is
/// immutable for the lifetime of a model and shared by every attempt.
#[derive(Clone, Debug)]
pub struct WeightTable {
    weights: Vec<f64>,
    weight_log_weights: Vec<f64>,
    sum_weights: f64,
    sum_weight_log_weights: f64,
    starting_entropy: f64,
}

impl WeightTable {
    /// Build the table, precomputing `w·ln(w)` terms and the full-wave entropy
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the table is empty or any weight
    /// is not strictly positive.
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(GenerationError::Configuration {
                reason: "weight table is empty".to_string(),
            });
        }
        if let Some(position) = weights.iter().position(|&w| !(w > 0.0)) {
            return Err(GenerationError::Configuration {
                reason: format!("value {position} has non-positive weight"),
            });
        }

        let weight_log_weights: Vec<f64> = weights.iter().map(|&w| w * w.ln()).collect();
        let sum_weights: f64 = weights.iter().sum();
        let sum_weight_log_weights: f64 = weight_log_weights.iter().sum();
        let starting_entropy = sum_weights.ln() - sum_weight_log_weights / sum_weights;

        Ok(Self {
            weights,
            weight_log_weights,
            sum_weights,
            sum_weight_log_weights,
            starting_entropy,
        })
    }

    /// Number of values
    pub const fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the table holds no values
    pub const fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weight of one value
    pub fn weight(&self, value: usize) -> f64 {
        self.weights.get(value).copied().unwrap_or(0.0)
    }

    /// Precomputed `w·ln(w)` of one value
    pub fn weight_log_weight(&self, value: usize) -> f64 {
        self.weight_log_weights.get(value).copied().unwrap_or(0.0)
    }

    /// Sum of all weights
    pub const fn total_weight(&self) -> f64 {
        self.sum_weights
    }

    /// Sum of all `w·ln(w)` terms
    pub const fn total_weight_log_weight(&self) -> f64 {
        self.sum_weight_log_weights
    }

    /// Entropy of a cell in full superposition
    pub const fn starting_entropy(&self) -> f64 {
        self.starting_entropy
    }

    /// All weights in value order
    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }
}

/// The wave: every cell's surviving-value set plus solver bookkeeping
///
/// Membership lives in one flat bit vector indexed `cell · T + value`.
/// Alongside it the store keeps the AC-4 support counters (one per cell,
/// value, and direction) and per-cell aggregates: remaining count, weight
/// sum, weight-log sum, and the cached entropy those two imply. Aggregates
/// are touched exactly once per ban and never recomputed from the domain
/// except at reset.
#[derive(Clone, Debug)]
pub struct Wave {
    domains: BitVec,
    support: Array3<i32>,
    remaining: Vec<usize>,
    weight_sums: Vec<f64>,
    weight_log_sums: Vec<f64>,
    entropies: Vec<f64>,
    worklist: Vec<(usize, usize)>,
    contradiction: bool,
    cell_count: usize,
    value_count: usize,
}

impl Wave {
    /// Allocate a wave; call [`Wave::reset`] before use
    pub fn new(cell_count: usize, value_count: usize) -> Self {
        Self {
            domains: BitVec::repeat(false, cell_count * value_count),
            support: Array3::zeros((cell_count, value_count, DIRECTION_COUNT)),
            remaining: vec![0; cell_count],
            weight_sums: vec![0.0; cell_count],
            weight_log_sums: vec![0.0; cell_count],
            entropies: vec![0.0; cell_count],
            worklist: Vec::new(),
            contradiction: false,
            cell_count,
            value_count,
        }
    }

    /// Restore every cell to full superposition
    ///
    /// Support counters are reseeded from the propagator's opposite-direction
    /// list lengths; aggregates come from the weight table's cached sums.
    pub fn reset(&mut self, propagator: &Propagator, weights: &WeightTable) {
        self.domains.fill(true);
        for ((_, value, direction), count) in self.support.indexed_iter_mut() {
            *count = propagator.support_count(direction, value) as i32;
        }
        self.remaining.fill(self.value_count);
        self.weight_sums.fill(weights.total_weight());
        self.weight_log_sums.fill(weights.total_weight_log_weight());
        self.entropies.fill(weights.starting_entropy());
        self.worklist.clear();
        self.contradiction = false;
    }

    /// Number of cells
    pub const fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Number of values per cell
    pub const fn value_count(&self) -> usize {
        self.value_count
    }

    /// Whether a value still survives at a cell
    pub fn is_possible(&self, cell: usize, value: usize) -> bool {
        self.domains
            .get(cell * self.value_count + value)
            .is_some_and(|bit| *bit)
    }

    /// Count of surviving values at a cell
    pub fn remaining(&self, cell: usize) -> usize {
        self.remaining.get(cell).copied().unwrap_or(0)
    }

    /// Cached entropy of a cell
    pub fn entropy(&self, cell: usize) -> f64 {
        self.entropies.get(cell).copied().unwrap_or(0.0)
    }

    /// Sum of surviving weights at a cell
    pub fn weight_sum(&self, cell: usize) -> f64 {
        self.weight_sums.get(cell).copied().unwrap_or(0.0)
    }

    /// Lowest surviving value at a cell
    pub fn first_possible(&self, cell: usize) -> Option<usize> {
        self.domain(cell).and_then(BitSlice::first_one)
    }

    /// Surviving values at a cell in ascending order
    pub fn possible_values(&self, cell: usize) -> Vec<usize> {
        self.domain(cell)
            .map(|bits| bits.iter_ones().collect())
            .unwrap_or_default()
    }

    fn domain(&self, cell: usize) -> Option<&BitSlice> {
        let start = cell * self.value_count;
        self.domains.get(start..start + self.value_count)
    }

    /// Permanently remove a value from a cell's domain
    ///
    /// Idempotent: a value already absent is left untouched. Otherwise the
    /// four aggregates are updated once, the support counters for the pair
    /// are cleared so later withdrawals cannot re-fire, and the pair is
    /// queued for propagation. Emptying a domain raises the contradiction
    /// flag; the entropy update guards the weight sum reaching zero.
    pub fn ban(&mut self, cell: usize, value: usize, weights: &WeightTable) {
        let slot = cell * self.value_count + value;
        if !self.domains.get(slot).is_some_and(|bit| *bit) {
            return;
        }
        self.domains.set(slot, false);

        for direction in 0..DIRECTION_COUNT {
            if let Some(count) = self.support.get_mut((cell, value, direction)) {
                *count = 0;
            }
        }
        self.worklist.push((cell, value));

        if let Some(count) = self.remaining.get_mut(cell) {
            *count -= 1;
            if *count == 0 {
                self.contradiction = true;
            }
        }
        if let Some(sum) = self.weight_sums.get_mut(cell) {
            *sum -= weights.weight(value);
        }
        if let Some(log_sum) = self.weight_log_sums.get_mut(cell) {
            *log_sum -= weights.weight_log_weight(value);
        }

        let sum = self.weight_sum(cell);
        let log_sum = self.weight_log_sums.get(cell).copied().unwrap_or(0.0);
        if let Some(entropy) = self.entropies.get_mut(cell) {
            *entropy = if sum > 0.0 { sum.ln() - log_sum / sum } else { 0.0 };
        }
    }

    /// Withdraw one unit of support from a (cell, value, direction) counter
    ///
    /// Returns true exactly when the counter transitions to zero, which is
    /// the moment the value loses its last compatible neighbor in that
    /// direction. Counters of banned values were cleared at ban time and go
    /// negative here without ever re-triggering.
    pub fn withdraw_support(&mut self, cell: usize, value: usize, direction: usize) -> bool {
        self.support
            .get_mut((cell, value, direction))
            .is_some_and(|count| {
                *count -= 1;
                *count == 0
            })
    }

    /// Current support count, exposed for consistency checks
    pub fn support_count(&self, cell: usize, value: usize, direction: usize) -> i32 {
        self.support
            .get((cell, value, direction))
            .copied()
            .unwrap_or(0)
    }

    /// Pop the most recently queued ban
    pub fn pop_pending(&mut self) -> Option<(usize, usize)> {
        self.worklist.pop()
    }

    /// Whether any cell's domain has emptied this attempt
    pub const fn in_contradiction(&self) -> bool {
        self.contradiction
    }
}
