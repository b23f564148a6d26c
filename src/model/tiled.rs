//! Tiled model: expand a catalog of symmetric tiles into wave values
//!
//! Each catalog tile expands into one value per distinct orientation, as
//! dictated by its symmetry class. Horizontal neighbor rules are stated once
//! and closed under rotation and reflection, so a single `left`/`right` pair
//! authorizes all eight symmetric images of the adjacency.

use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::io::catalog::TileCatalog;
use crate::io::configuration::DEFAULT_TILED_SIZE;
use crate::io::error::{GenerationError, Result};
use crate::model::GridModel;
use crate::solver::{Heuristic, ModelData, Solver, SolverOptions};
use crate::spatial::topology::DIRECTION_COUNT;

/// Build parameters for [`TiledModel`]
#[derive(Clone, Debug)]
pub struct TiledOptions {
    /// Output width in cells
    pub width: usize,
    /// Output height in cells
    pub height: usize,
    /// Whether the output wraps at its edges
    pub periodic: bool,
    /// Cell selection policy
    pub heuristic: Heuristic,
    /// Restrict the build to a named catalog subset
    pub subset: Option<String>,
}

impl Default for TiledOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_TILED_SIZE,
            height: DEFAULT_TILED_SIZE,
            periodic: false,
            heuristic: Heuristic::Entropy,
            subset: None,
        }
    }
}

/// Symmetry class of a tile, fixing how many distinct orientations it has
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileSymmetry {
    /// Fully symmetric, one orientation
    X,
    /// Two-fold rotational symmetry, two orientations
    I,
    /// Corner shape, four orientations
    L,
    /// Tee shape, four orientations
    T,
    /// Diagonal mirror symmetry, two orientations
    Diagonal,
    /// No symmetry, eight orientations
    F,
}

impl TileSymmetry {
    /// Parse the catalog notation for a symmetry class
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "X" => Some(Self::X),
            "I" => Some(Self::I),
            "L" => Some(Self::L),
            "T" => Some(Self::T),
            "\\" => Some(Self::Diagonal),
            "F" => Some(Self::F),
            _ => None,
        }
    }

    /// Number of distinct orientations
    pub const fn cardinality(self) -> usize {
        match self {
            Self::X => 1,
            Self::I | Self::Diagonal => 2,
            Self::L | Self::T => 4,
            Self::F => 8,
        }
    }

    /// Orientation index after a quarter rotation
    pub const fn rotated(self, i: usize) -> usize {
        match self {
            Self::X => i,
            Self::I | Self::Diagonal => 1 - i,
            Self::L | Self::T => (i + 1) % 4,
            Self::F => {
                if i < 4 {
                    (i + 1) % 4
                } else {
                    4 + (i + 3) % 4
                }
            }
        }
    }

    /// Orientation index after a horizontal reflection
    pub const fn reflected(self, i: usize) -> usize {
        match self {
            Self::X | Self::I => i,
            Self::Diagonal => 1 - i,
            Self::L => {
                if i % 2 == 0 {
                    i + 1
                } else {
                    i - 1
                }
            }
            Self::T => {
                if i % 2 == 0 {
                    i
                } else {
                    4 - i
                }
            }
            Self::F => {
                if i < 4 {
                    i + 4
                } else {
                    i - 4
                }
            }
        }
    }
}

/// A catalog-driven model whose values are oriented tiles
#[derive(Clone, Debug)]
pub struct TiledModel {
    solver: Solver,
    tile_names: Vec<String>,
    tiles: Vec<RgbaImage>,
    tile_size: usize,
}

impl TiledModel {
    /// Expand a catalog into a solver, optionally loading tile art
    ///
    /// `art_directory` holds one PNG per tile (or per orientation when the
    /// catalog is marked `unique`); pass `None` to build without art, which
    /// leaves [`GridModel::render`] unavailable but keeps
    /// [`TiledModel::text_output`] working.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown symmetry classes,
    /// non-positive weights, neighbor rules naming unknown tiles or
    /// orientations, or an expanded tile left without any compatible
    /// neighbor in some direction.
    pub fn from_catalog(
        catalog: &TileCatalog,
        options: &TiledOptions,
        art_directory: Option<&Path>,
    ) -> Result<Self> {
        let subset: Option<HashSet<&str>> = match &options.subset {
            Some(name) => Some(catalog.subset(name)?.iter().map(String::as_str).collect()),
            None => None,
        };
        let retained =
            |name: &str| subset.as_ref().is_none_or(|filter| filter.contains(name));

        let mut action: Vec<[usize; 8]> = Vec::new();
        let mut first_occurrence: HashMap<&str, usize> = HashMap::new();
        let mut weights: Vec<f64> = Vec::new();
        let mut tile_names: Vec<String> = Vec::new();
        let mut tiles: Vec<RgbaImage> = Vec::new();

        for entry in &catalog.tiles {
            if !retained(&entry.name) {
                continue;
            }
            let Some(symmetry) = TileSymmetry::parse(&entry.symmetry) else {
                return Err(GenerationError::Configuration {
                    reason: format!(
                        "tile '{}' declares unknown symmetry '{}'",
                        entry.name, entry.symmetry
                    ),
                });
            };
            if entry.weight <= 0.0 || !entry.weight.is_finite() {
                return Err(GenerationError::Configuration {
                    reason: format!(
                        "tile '{}' has non-positive weight {}",
                        entry.name, entry.weight
                    ),
                });
            }

            let base = action.len();
            first_occurrence.insert(entry.name.as_str(), base);

            for orientation in 0..symmetry.cardinality() {
                let quarter = symmetry.rotated(orientation);
                let half = symmetry.rotated(quarter);
                let three_quarter = symmetry.rotated(half);
                let mut map = [
                    orientation,
                    quarter,
                    half,
                    three_quarter,
                    symmetry.reflected(orientation),
                    symmetry.reflected(quarter),
                    symmetry.reflected(half),
                    symmetry.reflected(three_quarter),
                ];
                for slot in &mut map {
                    *slot += base;
                }
                action.push(map);

                weights.push(entry.weight);
                tile_names.push(format!("{} {orientation}", entry.name));
            }

            if let Some(directory) = art_directory {
                load_tile_art(
                    &mut tiles,
                    directory,
                    &entry.name,
                    symmetry.cardinality(),
                    catalog,
                )?;
            }
        }

        let value_count = action.len();
        if value_count == 0 {
            return Err(GenerationError::Configuration {
                reason: "catalog expands to zero tiles".to_string(),
            });
        }

        let mut horizontal = vec![vec![false; value_count]; value_count];
        let mut vertical = vec![vec![false; value_count]; value_count];

        for rule in &catalog.neighbors {
            let (left_name, left_orientation) = parse_reference(&rule.left)?;
            let (right_name, right_orientation) = parse_reference(&rule.right)?;
            if !retained(left_name) || !retained(right_name) {
                continue;
            }

            let left = resolve(&action, &first_occurrence, left_name, left_orientation)?;
            let right = resolve(&action, &first_occurrence, right_name, right_orientation)?;
            let down = transform(&action, left, 1);
            let up = transform(&action, right, 1);

            mark(&mut horizontal, right, left);
            mark(
                &mut horizontal,
                transform(&action, right, 6),
                transform(&action, left, 6),
            );
            mark(
                &mut horizontal,
                transform(&action, left, 4),
                transform(&action, right, 4),
            );
            mark(
                &mut horizontal,
                transform(&action, left, 2),
                transform(&action, right, 2),
            );

            mark(&mut vertical, up, down);
            mark(
                &mut vertical,
                transform(&action, down, 6),
                transform(&action, up, 6),
            );
            mark(
                &mut vertical,
                transform(&action, up, 4),
                transform(&action, down, 4),
            );
            mark(
                &mut vertical,
                transform(&action, down, 2),
                transform(&action, up, 2),
            );
        }

        // Directions 2 and 3 are the transposes of 0 and 1
        let allowed: [Vec<Vec<usize>>; DIRECTION_COUNT] = std::array::from_fn(|direction| {
            (0..value_count)
                .map(|t1| {
                    (0..value_count)
                        .filter(|&t2| {
                            let (row, column) = if direction < 2 { (t1, t2) } else { (t2, t1) };
                            let dense = if direction % 2 == 0 { &horizontal } else { &vertical };
                            dense
                                .get(row)
                                .and_then(|entries| entries.get(column))
                                .copied()
                                .unwrap_or(false)
                        })
                        .collect()
                })
                .collect()
        });

        let data = ModelData {
            weights,
            allowed,
            boundary_radius: 1,
            ground: None,
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
        solver.propagator().validate(|value| {
            format!(
                "tile '{}'",
                tile_names.get(value).map_or("?", String::as_str)
            )
        })?;

        Ok(Self {
            solver,
            tile_names,
            tiles,
            tile_size: catalog.tile_size,
        })
    }

    /// Expanded tile names in value order, `"name orientation"` each
    pub fn tile_names(&self) -> &[String] {
        &self.tile_names
    }

    /// Tile edge length in pixels
    pub const fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// The solved grid as comma-separated tile names, one row per line
    ///
    /// Available only after a successful solve.
    pub fn text_output(&self) -> Option<String> {
        let observed = self.solver.observed()?;
        let topology = self.solver.topology();
        let mut lines = Vec::with_capacity(topology.height());

        for y in 0..topology.height() {
            let row: Vec<&str> = (0..topology.width())
                .map(|x| {
                    let value = observed.get(topology.index(x, y)).copied().unwrap_or(0);
                    self.tile_names.get(value).map_or("?", String::as_str)
                })
                .collect();
            lines.push(row.join(", "));
        }

        Some(lines.join("\n"))
    }

    fn blend_cell(&self, cell: usize) -> Vec<[f64; 4]> {
        let size = self.tile_size;
        let mut accumulated = vec![[0.0f64; 4]; size * size];
        let mut total_weight = 0.0f64;

        for value in 0..self.solver.value_count() {
            if !self.solver.is_possible(cell, value) {
                continue;
            }
            let weight = self.solver.weight(value);
            total_weight += weight;
            if let Some(tile) = self.tiles.get(value) {
                for (pixel, slot) in tile.pixels().zip(accumulated.iter_mut()) {
                    for (channel, sum) in pixel.0.iter().zip(slot.iter_mut()) {
                        *sum += weight * f64::from(*channel);
                    }
                }
            }
        }

        if total_weight > 0.0 {
            for slot in &mut accumulated {
                for sum in slot.iter_mut() {
                    *sum /= total_weight;
                }
            }
        }
        accumulated
    }
}

impl GridModel for TiledModel {
    fn solver(&self) -> &Solver {
        &self.solver
    }

    fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }

    fn render(&self) -> Result<RgbaImage> {
        if self.tiles.is_empty() {
            return Err(GenerationError::Configuration {
                reason: "tile art was not loaded; rendering is unavailable".to_string(),
            });
        }

        let topology = self.solver.topology();
        let size = self.tile_size as u32;
        let mut out = RgbaImage::new(
            topology.width() as u32 * size,
            topology.height() as u32 * size,
        );

        for y in 0..topology.height() {
            for x in 0..topology.width() {
                let cell = topology.index(x, y);

                if let Some(observed) = self.solver.observed() {
                    let value = observed.get(cell).copied().unwrap_or(0);
                    if let Some(tile) = self.tiles.get(value) {
                        for (px, py, pixel) in tile.enumerate_pixels() {
                            out.put_pixel(x as u32 * size + px, y as u32 * size + py, *pixel);
                        }
                    }
                } else {
                    let blended = self.blend_cell(cell);
                    for py in 0..size {
                        for px in 0..size {
                            let slot = blended
                                .get((px + py * size) as usize)
                                .copied()
                                .unwrap_or([0.0; 4]);
                            let mut color = [0u8; 4];
                            for (byte, &sum) in color.iter_mut().zip(slot.iter()) {
                                *byte = sum.round().clamp(0.0, 255.0) as u8;
                            }
                            out.put_pixel(
                                x as u32 * size + px,
                                y as u32 * size + py,
                                image::Rgba(color),
                            );
                        }
                    }
                }
            }
        }

        Ok(out)
    }
}

/// Split `"name"` or `"name k"` into a tile name and orientation index
fn parse_reference(text: &str) -> Result<(&str, usize)> {
    let mut parts = text.split_whitespace();
    let name = parts.next().ok_or_else(|| GenerationError::Configuration {
        reason: "neighbor rule has an empty tile reference".to_string(),
    })?;
    let orientation = match parts.next() {
        Some(digits) => digits.parse().map_err(|_| GenerationError::Configuration {
            reason: format!("neighbor reference '{text}' has a non-numeric orientation"),
        })?,
        None => 0,
    };
    if orientation >= 8 {
        return Err(GenerationError::Configuration {
            reason: format!("neighbor reference '{text}' names orientation {orientation} of 8"),
        });
    }
    Ok((name, orientation))
}

/// Value id of a named tile under one of the eight transforms
fn resolve(
    action: &[[usize; 8]],
    first_occurrence: &HashMap<&str, usize>,
    name: &str,
    orientation: usize,
) -> Result<usize> {
    let base = first_occurrence
        .get(name)
        .copied()
        .ok_or_else(|| GenerationError::Configuration {
            reason: format!("neighbor rule references unknown tile '{name}'"),
        })?;
    Ok(transform(action, base, orientation))
}

fn transform(action: &[[usize; 8]], value: usize, step: usize) -> usize {
    action
        .get(value)
        .and_then(|map| map.get(step))
        .copied()
        .unwrap_or(value)
}

fn mark(dense: &mut [Vec<bool>], row: usize, column: usize) {
    if let Some(slot) = dense.get_mut(row).and_then(|entries| entries.get_mut(column)) {
        *slot = true;
    }
}

fn rotate_tile(tile: &RgbaImage, size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| *tile.get_pixel(size - 1 - y, x))
}

fn reflect_tile(tile: &RgbaImage, size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| *tile.get_pixel(size - 1 - x, y))
}

fn load_tile_bitmap(directory: &Path, stem: &str, expected_size: usize) -> Result<RgbaImage> {
    let path = directory.join(format!("{stem}.png"));
    let decoded = image::open(&path).map_err(|e| GenerationError::ImageLoad {
        path: path.clone(),
        source: e,
    })?;
    let rgba = decoded.to_rgba8();
    if rgba.width() as usize != expected_size || rgba.height() as usize != expected_size {
        return Err(GenerationError::Configuration {
            reason: format!(
                "tile bitmap '{}' is {}x{}, catalog declares {expected_size}",
                path.display(),
                rgba.width(),
                rgba.height()
            ),
        });
    }
    Ok(rgba)
}

/// Load the bitmaps of one tile, deriving rotations unless `unique`
fn load_tile_art(
    tiles: &mut Vec<RgbaImage>,
    directory: &Path,
    name: &str,
    cardinality: usize,
    catalog: &TileCatalog,
) -> Result<()> {
    let size = catalog.tile_size;
    if catalog.unique {
        for orientation in 0..cardinality {
            tiles.push(load_tile_bitmap(
                directory,
                &format!("{name} {orientation}"),
                size,
            )?);
        }
        return Ok(());
    }

    let base = tiles.len();
    tiles.push(load_tile_bitmap(directory, name, size)?);
    for orientation in 1..cardinality {
        let parent = if orientation <= 3 {
            tiles.get(base + orientation - 1)
        } else {
            tiles.get(base + orientation - 4)
        };
        let Some(parent) = parent else { continue };
        let derived = if orientation <= 3 {
            rotate_tile(parent, size as u32)
        } else {
            reflect_tile(parent, size as u32)
        };
        tiles.push(derived);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{TileSymmetry, TiledModel, TiledOptions, parse_reference};
    use crate::io::catalog::TileCatalog;
    use crate::model::GridModel;
    use crate::solver::RunOutcome;

    fn knot_like_catalog() -> TileCatalog {
        TileCatalog::from_json(
            r#"{
                "tile_size": 4,
                "tiles": [
                    { "name": "empty", "symmetry": "X" },
                    { "name": "line", "symmetry": "I", "weight": 2.0 }
                ],
                "neighbors": [
                    { "left": "empty", "right": "empty" },
                    { "left": "line 1", "right": "empty" },
                    { "left": "empty", "right": "line 1" },
                    { "left": "line 1", "right": "line 1" },
                    { "left": "line", "right": "line" },
                    { "left": "empty", "right": "line" },
                    { "left": "line", "right": "empty" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_symmetry_cardinalities() {
        assert_eq!(TileSymmetry::X.cardinality(), 1);
        assert_eq!(TileSymmetry::I.cardinality(), 2);
        assert_eq!(TileSymmetry::L.cardinality(), 4);
        assert_eq!(TileSymmetry::T.cardinality(), 4);
        assert_eq!(TileSymmetry::Diagonal.cardinality(), 2);
        assert_eq!(TileSymmetry::F.cardinality(), 8);
    }

    #[test]
    fn test_rotations_cycle_within_cardinality() {
        for symmetry in [
            TileSymmetry::X,
            TileSymmetry::I,
            TileSymmetry::L,
            TileSymmetry::T,
            TileSymmetry::Diagonal,
            TileSymmetry::F,
        ] {
            for i in 0..symmetry.cardinality() {
                let mut current = i;
                for _ in 0..4 {
                    current = symmetry.rotated(current);
                    assert!(current < symmetry.cardinality());
                }
                // Four quarter turns are the identity
                assert_eq!(current, i);
                // Reflection is an involution
                assert_eq!(symmetry.reflected(symmetry.reflected(i)), i);
            }
        }
    }

    #[test]
    fn test_reference_parsing() {
        assert_eq!(parse_reference("corner").unwrap(), ("corner", 0));
        assert_eq!(parse_reference("corner 3").unwrap(), ("corner", 3));
        assert!(parse_reference("corner x").is_err());
        assert!(parse_reference("corner 9").is_err());
    }

    #[test]
    fn test_catalog_expands_by_cardinality() {
        let model =
            TiledModel::from_catalog(&knot_like_catalog(), &TiledOptions::default(), None).unwrap();

        // One X tile plus a two-orientation I tile
        assert_eq!(model.solver().value_count(), 3);
        assert_eq!(
            model.tile_names(),
            &["empty 0".to_string(), "line 0".to_string(), "line 1".to_string()]
        );
    }

    #[test]
    fn test_expanded_rules_are_mutual() {
        let model =
            TiledModel::from_catalog(&knot_like_catalog(), &TiledOptions::default(), None).unwrap();
        assert!(model.solver().propagator().is_mutual());
    }

    #[test]
    fn test_missing_rules_are_rejected_before_running() {
        let catalog = TileCatalog::from_json(
            r#"{
                "tiles": [ { "name": "a" }, { "name": "b" } ],
                "neighbors": [ { "left": "a", "right": "a" } ]
            }"#,
        )
        .unwrap();

        // Tile b has no neighbors at all
        assert!(TiledModel::from_catalog(&catalog, &TiledOptions::default(), None).is_err());
    }

    #[test]
    fn test_unknown_neighbor_tile_is_rejected() {
        let catalog = TileCatalog::from_json(
            r#"{
                "tiles": [ { "name": "a" } ],
                "neighbors": [ { "left": "a", "right": "ghost" } ]
            }"#,
        )
        .unwrap();

        assert!(TiledModel::from_catalog(&catalog, &TiledOptions::default(), None).is_err());
    }

    #[test]
    fn test_subset_filters_tiles_and_rules() {
        let catalog = TileCatalog::from_json(
            r#"{
                "tiles": [ { "name": "a" }, { "name": "b" } ],
                "neighbors": [
                    { "left": "a", "right": "a" },
                    { "left": "a", "right": "b" },
                    { "left": "b", "right": "b" }
                ],
                "subsets": { "solo": ["a"] }
            }"#,
        )
        .unwrap();

        let model = TiledModel::from_catalog(
            &catalog,
            &TiledOptions {
                subset: Some("solo".to_string()),
                ..TiledOptions::default()
            },
            None,
        )
        .unwrap();
        assert_eq!(model.solver().value_count(), 1);
    }

    #[test]
    fn test_solves_and_reports_names() {
        let mut model = TiledModel::from_catalog(
            &knot_like_catalog(),
            &TiledOptions {
                width: 6,
                height: 6,
                ..TiledOptions::default()
            },
            None,
        )
        .unwrap();

        assert_eq!(model.run(7, None), RunOutcome::Solved);
        let text = model.text_output().unwrap();
        assert_eq!(text.lines().count(), 6);
        for line in text.lines() {
            assert_eq!(line.split(", ").count(), 6);
        }
    }

    #[test]
    fn test_render_without_art_is_an_error() {
        let model =
            TiledModel::from_catalog(&knot_like_catalog(), &TiledOptions::default(), None).unwrap();
        assert!(model.render().is_err());
    }
}
