//! Overlapping model: learn N×N patterns from a sample image
//!
//! Every N×N window of the sample (optionally with its rotations and
//! reflections) becomes one value of the wave. Two patterns are compatible
//! in a direction when their windows agree on the overlapping (N−1)-wide
//! strip, so adjacent cells always describe consistent pixels.

use image::{Rgba, RgbaImage};

use crate::io::configuration::{DEFAULT_OVERLAPPING_SIZE, DEFAULT_PATTERN_SIZE, DEFAULT_SYMMETRY};
use crate::io::error::{GenerationError, Result, invalid_parameter};
use crate::io::image::SampleImage;
use crate::model::GridModel;
use crate::solver::{Heuristic, ModelData, Solver, SolverOptions};
use crate::spatial::topology::{DIRECTION_COUNT, DX, DY};
use std::collections::HashMap;

/// Build parameters for [`OverlappingModel`]
#[derive(Clone, Debug)]
pub struct OverlappingOptions {
    /// Pattern size N
    pub pattern_size: usize,
    /// Output width in cells
    pub width: usize,
    /// Output height in cells
    pub height: usize,
    /// Whether pattern extraction wraps around the sample edges
    pub periodic_input: bool,
    /// Whether the output wraps at its edges
    pub periodic: bool,
    /// Number of symmetry transforms to admit, 1 through 8
    pub symmetry: usize,
    /// Pin the last extracted pattern along the bottom row
    pub ground: bool,
    /// Cell selection policy
    pub heuristic: Heuristic,
}

impl Default for OverlappingOptions {
    fn default() -> Self {
        Self {
            pattern_size: DEFAULT_PATTERN_SIZE,
            width: DEFAULT_OVERLAPPING_SIZE,
            height: DEFAULT_OVERLAPPING_SIZE,
            periodic_input: true,
            periodic: false,
            symmetry: DEFAULT_SYMMETRY,
            ground: false,
            heuristic: Heuristic::Entropy,
        }
    }
}

/// A sample-driven model whose values are N×N pixel patterns
#[derive(Clone, Debug)]
pub struct OverlappingModel {
    solver: Solver,
    patterns: Vec<Vec<u8>>,
    palette: Vec<[u8; 4]>,
    pattern_size: usize,
}

impl OverlappingModel {
    /// Extract patterns from a sample and assemble the solver
    ///
    /// Patterns are deduplicated in first-occurrence order and weighted by
    /// how often they appear, counting symmetric copies separately.
    ///
    /// # Errors
    ///
    /// Returns an error when the pattern size, symmetry, or output
    /// dimensions are out of range for the sample.
    pub fn from_sample(sample: &SampleImage, options: &OverlappingOptions) -> Result<Self> {
        let n = options.pattern_size;
        if n == 0 {
            return Err(invalid_parameter(
                "pattern_size",
                &n,
                &"pattern size must be at least 1",
            ));
        }
        if n > sample.width() || n > sample.height() {
            return Err(invalid_parameter(
                "pattern_size",
                &n,
                &format!(
                    "sample is only {}x{} pixels",
                    sample.width(),
                    sample.height()
                ),
            ));
        }
        if !(1..=8).contains(&options.symmetry) {
            return Err(invalid_parameter(
                "symmetry",
                &options.symmetry,
                &"must be between 1 and 8",
            ));
        }
        if options.width < n || options.height < n {
            return Err(invalid_parameter(
                "dimensions",
                &format!("{}x{}", options.width, options.height),
                &format!("output must be at least {n} cells on each side"),
            ));
        }

        let (patterns, weights) = extract_patterns(sample, options);
        if patterns.is_empty() {
            return Err(GenerationError::Configuration {
                reason: "no patterns could be extracted from the sample".to_string(),
            });
        }

        let allowed = build_compatibility(&patterns, n);
        let ground = options.ground.then(|| patterns.len() - 1);

        let data = ModelData {
            weights,
            allowed,
            boundary_radius: n,
            ground,
        };
        let solver = Solver::new(
            data,
            SolverOptions {
                width: options.width,
                height: options.height,
                periodic: options.periodic,
                heuristic: options.heuristic,
            },
        )?;

        Ok(Self {
            solver,
            patterns,
            palette: sample.palette().to_vec(),
            pattern_size: n,
        })
    }

    /// Number of distinct patterns
    pub const fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Pattern size N
    pub const fn pattern_size(&self) -> usize {
        self.pattern_size
    }

    /// The extracted patterns, row-major N×N palette indices each
    pub fn patterns(&self) -> &[Vec<u8>] {
        &self.patterns
    }

    fn pixel(&self, value: usize, dx: usize, dy: usize) -> Rgba<u8> {
        let color_index = self
            .patterns
            .get(value)
            .and_then(|pattern| pattern.get(dx + dy * self.pattern_size))
            .copied()
            .unwrap_or(0);
        Rgba(
            self.palette
                .get(color_index as usize)
                .copied()
                .unwrap_or([0, 0, 0, 255]),
        )
    }

    fn render_solved(&self, observed: &[usize]) -> RgbaImage {
        let topology = self.solver.topology();
        let (width, height, n) = (topology.width(), topology.height(), self.pattern_size);
        let mut out = RgbaImage::new(width as u32, height as u32);

        for y in 0..height {
            for x in 0..width {
                // Cells on the right/bottom margin borrow interior pixels of
                // the nearest eligible pattern
                let dx = if x < width - n + 1 { 0 } else { n - 1 };
                let dy = if y < height - n + 1 { 0 } else { n - 1 };
                let cell = topology.index(x.saturating_sub(dx), y.saturating_sub(dy));
                let value = observed.get(cell).copied().unwrap_or(0);
                out.put_pixel(x as u32, y as u32, self.pixel(value, dx, dy));
            }
        }

        out
    }

    fn render_blended(&self) -> RgbaImage {
        let topology = self.solver.topology();
        let (width, height, n) = (topology.width(), topology.height(), self.pattern_size);
        let mut out = RgbaImage::new(width as u32, height as u32);

        for y in 0..height {
            for x in 0..width {
                let mut accumulated = [0.0f64; 4];
                let mut total_weight = 0.0f64;

                for dy in 0..n {
                    for dx in 0..n {
                        let Some(sx) = offset_coordinate(x, dx, width, topology.periodic()) else {
                            continue;
                        };
                        let Some(sy) = offset_coordinate(y, dy, height, topology.periodic()) else {
                            continue;
                        };
                        let cell = topology.index(sx, sy);
                        if topology.on_boundary(cell) {
                            continue;
                        }

                        for value in 0..self.solver.value_count() {
                            if !self.solver.is_possible(cell, value) {
                                continue;
                            }
                            let weight = self.solver.weight(value);
                            let color = self.pixel(value, dx, dy).0;
                            for (channel, slot) in color.iter().zip(accumulated.iter_mut()) {
                                *slot += weight * f64::from(*channel);
                            }
                            total_weight += weight;
                        }
                    }
                }

                let pixel = if total_weight > 0.0 {
                    let mut color = [0u8; 4];
                    for (slot, &sum) in color.iter_mut().zip(accumulated.iter()) {
                        *slot = (sum / total_weight).round().clamp(0.0, 255.0) as u8;
                    }
                    Rgba(color)
                } else {
                    Rgba([0, 0, 0, 0])
                };
                out.put_pixel(x as u32, y as u32, pixel);
            }
        }

        out
    }
}

impl GridModel for OverlappingModel {
    fn solver(&self) -> &Solver {
        &self.solver
    }

    fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }

    fn render(&self) -> Result<RgbaImage> {
        Ok(match self.solver.observed() {
            Some(observed) => self.render_solved(observed),
            None => self.render_blended(),
        })
    }
}

/// Shift a render coordinate back by a pattern offset, wrapping if periodic
const fn offset_coordinate(
    position: usize,
    offset: usize,
    size: usize,
    periodic: bool,
) -> Option<usize> {
    let shifted = position as i64 - offset as i64;
    if shifted >= 0 {
        Some(shifted as usize)
    } else if periodic {
        Some((shifted + size as i64) as usize)
    } else {
        None
    }
}

/// Read the N×N window at (x, y), wrapping around the sample edges
fn window_at(sample: &SampleImage, x: usize, y: usize, n: usize) -> Vec<u8> {
    (0..n * n)
        .map(|i| {
            let (dx, dy) = (i % n, i / n);
            sample.index_at((x + dx) % sample.width(), (y + dy) % sample.height())
        })
        .collect()
}

fn rotate_pattern(pattern: &[u8], n: usize) -> Vec<u8> {
    (0..n * n)
        .map(|i| {
            let (x, y) = (i % n, i / n);
            pattern.get(n - 1 - y + x * n).copied().unwrap_or(0)
        })
        .collect()
}

fn reflect_pattern(pattern: &[u8], n: usize) -> Vec<u8> {
    (0..n * n)
        .map(|i| {
            let (x, y) = (i % n, i / n);
            pattern.get(n - 1 - x + y * n).copied().unwrap_or(0)
        })
        .collect()
}

/// Collect deduplicated patterns and their occurrence counts as weights
fn extract_patterns(sample: &SampleImage, options: &OverlappingOptions) -> (Vec<Vec<u8>>, Vec<f64>) {
    let n = options.pattern_size;
    let (max_x, max_y) = if options.periodic_input {
        (sample.width(), sample.height())
    } else {
        (sample.width() - n + 1, sample.height() - n + 1)
    };

    let mut patterns: Vec<Vec<u8>> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();
    let mut seen: HashMap<Vec<u8>, usize> = HashMap::new();

    for y in 0..max_y {
        for x in 0..max_x {
            let base = window_at(sample, x, y, n);

            // The eight transforms in the fixed rotate/reflect interleaving;
            // taking a prefix yields the requested symmetry group
            let mut variants: Vec<Vec<u8>> = Vec::with_capacity(8);
            variants.push(base);
            for step in 1..8 {
                let variant = if step % 2 == 1 {
                    variants.last().map_or_else(Vec::new, |p| reflect_pattern(p, n))
                } else {
                    variants
                        .get(step - 2)
                        .map_or_else(Vec::new, |p| rotate_pattern(p, n))
                };
                variants.push(variant);
            }

            for variant in variants.into_iter().take(options.symmetry) {
                if let Some(&index) = seen.get(&variant) {
                    if let Some(weight) = weights.get_mut(index) {
                        *weight += 1.0;
                    }
                } else {
                    seen.insert(variant.clone(), patterns.len());
                    patterns.push(variant);
                    weights.push(1.0);
                }
            }
        }
    }

    (patterns, weights)
}

/// Whether two patterns agree on the strip where their windows overlap when
/// the second sits at offset (dx, dy) from the first
fn patterns_agree(first: &[u8], second: &[u8], dx: i32, dy: i32, n: usize) -> bool {
    let x_min = dx.max(0);
    let x_max = if dx < 0 { dx + n as i32 } else { n as i32 };
    let y_min = dy.max(0);
    let y_max = if dy < 0 { dy + n as i32 } else { n as i32 };

    for y in y_min..y_max {
        for x in x_min..x_max {
            let here = (x + n as i32 * y) as usize;
            let there = (x - dx + n as i32 * (y - dy)) as usize;
            if first.get(here) != second.get(there) {
                return false;
            }
        }
    }
    true
}

fn build_compatibility(patterns: &[Vec<u8>], n: usize) -> [Vec<Vec<usize>>; DIRECTION_COUNT] {
    std::array::from_fn(|direction| {
        let dx = DX.get(direction).copied().unwrap_or(0);
        let dy = DY.get(direction).copied().unwrap_or(0);
        patterns
            .iter()
            .map(|pattern| {
                patterns
                    .iter()
                    .enumerate()
                    .filter(|(_, other)| patterns_agree(pattern, other, dx, dy, n))
                    .map(|(index, _)| index)
                    .collect()
            })
            .collect()
    })
}
