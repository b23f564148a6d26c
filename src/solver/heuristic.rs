//! Policies for choosing the next cell to collapse

use rand::Rng;
use rand::rngs::StdRng;

use crate::math::sampling::SELECTION_JITTER;
use crate::solver::wave::Wave;
use crate::spatial::GridTopology;

/// Cell selection policy
///
/// All three skip boundary cells and cells already determined. Entropy and
/// MRV break near-ties with a small uniform jitter so equally-ranked cells
/// are chosen pseudo-uniformly instead of by index order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Heuristic {
    /// Minimum cached entropy
    #[default]
    Entropy,
    /// Minimum remaining values
    MinimumRemainingValues,
    /// First undetermined cell in raster order, tracked by a monotone cursor
    Scanline,
}

/// Pick the next cell to observe, or `None` when every eligible cell is
/// determined (the solved condition)
///
/// `cursor` is the scanline position; it only advances, so fully observed
/// prefixes are never rescanned. The other policies ignore it. Jitter is
/// drawn from `rng` only for candidates that tie-or-beat the current
/// minimum, so the draw count (and the downstream random sequence) depends
/// only on the scores seen.
pub fn next_unobserved_cell(
    wave: &Wave,
    topology: &GridTopology,
    heuristic: Heuristic,
    cursor: &mut usize,
    rng: &mut StdRng,
) -> Option<usize> {
    if heuristic == Heuristic::Scanline {
        for cell in *cursor..topology.cell_count() {
            if topology.on_boundary(cell) {
                continue;
            }
            if wave.remaining(cell) > 1 {
                *cursor = cell + 1;
                return Some(cell);
            }
        }
        return None;
    }

    let mut min = f64::INFINITY;
    let mut argmin = None;

    for cell in 0..topology.cell_count() {
        if topology.on_boundary(cell) {
            continue;
        }

        let remaining = wave.remaining(cell);
        if remaining <= 1 {
            continue;
        }

        let score = match heuristic {
            Heuristic::Entropy => wave.entropy(cell),
            Heuristic::MinimumRemainingValues => remaining as f64,
            Heuristic::Scanline => unreachable!("scanline handled above"),
        };

        if score <= min {
            let noise = SELECTION_JITTER * rng.random::<f64>();
            if score + noise < min {
                min = score + noise;
                argmin = Some(cell);
            }
        }
    }

    argmin
}
