//! Directional compatibility table and arc-consistency propagation

use crate::io::error::{GenerationError, Result};
use crate::solver::wave::{Wave, WeightTable};
use crate::spatial::GridTopology;
use crate::spatial::topology::{DIRECTION_COUNT, OPPOSITE};

/// Per-direction compatibility lists for every value
///
/// `allowed[d][v]` is the ordered set of values permitted in the neighbor
/// cell in direction `d` when `v` survives. The table is built once by a
/// model builder and never mutated while solving. Builders construct it
/// mutually: `b ∈ allowed[d][a]` exactly when `a ∈ allowed[opposite(d)][b]`.
#[derive(Clone, Debug)]
pub struct Propagator {
    allowed: [Vec<Vec<usize>>; DIRECTION_COUNT],
    value_count: usize,
}

impl Propagator {
    /// Build a propagator from four per-direction compatibility tables
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the four tables disagree on the
    /// number of values or reference a value outside `[0, T)`.
    pub fn new(allowed: [Vec<Vec<usize>>; DIRECTION_COUNT]) -> Result<Self> {
        let value_count = allowed.first().map_or(0, Vec::len);

        for (direction, table) in allowed.iter().enumerate() {
            if table.len() != value_count {
                return Err(GenerationError::Configuration {
                    reason: format!(
                        "compatibility table for direction {direction} lists {} values, expected {value_count}",
                        table.len()
                    ),
                });
            }
            for list in table {
                if let Some(&out_of_range) = list.iter().find(|&&v| v >= value_count) {
                    return Err(GenerationError::Configuration {
                        reason: format!(
                            "compatibility list in direction {direction} references value {out_of_range} of {value_count}"
                        ),
                    });
                }
            }
        }

        Ok(Self {
            allowed,
            value_count,
        })
    }

    /// Number of values the table covers
    pub const fn value_count(&self) -> usize {
        self.value_count
    }

    /// Values permitted in the neighbor in `direction` when `value` survives
    pub fn allowed(&self, direction: usize, value: usize) -> &[usize] {
        self.allowed
            .get(direction)
            .and_then(|table| table.get(value))
            .map_or(&[], Vec::as_slice)
    }

    /// Initial support count for a value from one direction
    ///
    /// A value is supported from direction `d` by every surviving neighbor
    /// value whose `d`-list contains it; with a full wave that is the length
    /// of the value's own opposite-direction list.
    pub fn support_count(&self, direction: usize, value: usize) -> usize {
        let opposite = OPPOSITE.get(direction).copied().unwrap_or(0);
        self.allowed(opposite, value).len()
    }

    /// Verify the direction-opposite mutuality of the table
    pub fn is_mutual(&self) -> bool {
        for direction in 0..DIRECTION_COUNT {
            let opposite = OPPOSITE.get(direction).copied().unwrap_or(0);
            for a in 0..self.value_count {
                for &b in self.allowed(direction, a) {
                    if !self.allowed(opposite, b).contains(&a) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Reject values that have no compatible neighbor in some direction
    ///
    /// Such a value could never appear next to anything and would only be
    /// discovered mid-propagation; model builders call this before any run.
    /// `describe` maps a value id to a displayable name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first uncoverable value.
    pub fn validate(&self, describe: impl Fn(usize) -> String) -> Result<()> {
        for direction in 0..DIRECTION_COUNT {
            for value in 0..self.value_count {
                if self.allowed(direction, value).is_empty() {
                    return Err(GenerationError::Configuration {
                        reason: format!(
                            "{} has no compatible neighbor in direction {direction}",
                            describe(value)
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Drain the wave's worklist to the arc-consistent fixpoint
///
/// Pops banned (cell, value) pairs LIFO and withdraws their support from the
/// four neighbors; a neighbor value whose support count reaches zero in any
/// direction is banned in turn. The drain always runs to completion so every
/// queued ban lands in the counters, even after a cell's domain empties; the
/// return value reports whether the wave is still free of contradictions.
pub fn propagate(
    wave: &mut Wave,
    topology: &GridTopology,
    propagator: &Propagator,
    weights: &WeightTable,
) -> bool {
    while let Some((cell, value)) = wave.pop_pending() {
        for direction in 0..DIRECTION_COUNT {
            let Some(neighbor) = topology.neighbor(cell, direction) else {
                continue;
            };

            for &candidate in propagator.allowed(direction, value) {
                if wave.withdraw_support(neighbor, candidate, direction) {
                    wave.ban(neighbor, candidate, weights);
                }
            }
        }
    }

    !wave.in_contradiction()
}
