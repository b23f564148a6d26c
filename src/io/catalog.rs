//! Tile catalog data model and loader
//!
//! A catalog is the canonical input of the tiled builder: tiles with
//! symmetry classes and weights, neighbor rules along the horizontal axis,
//! and optional named subsets. The JSON schema mirrors the classic
//! `data.xml` tile-set descriptions.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::io::configuration::DEFAULT_TILE_SIZE;
use crate::io::error::{GenerationError, Result};

/// One catalog tile before symmetry expansion
#[derive(Clone, Debug, Deserialize)]
pub struct TileEntry {
    /// Tile name, also the stem of its bitmap file
    pub name: String,
    /// Symmetry class: `X`, `I`, `L`, `T`, `\` or `F`
    #[serde(default = "default_symmetry")]
    pub symmetry: String,
    /// Relative frequency, shared by all expanded variants
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// A horizontal adjacency rule between two (possibly rotated) tiles
///
/// Each side is a tile name optionally followed by a variant index, e.g.
/// `"corner 1"`. The rule states that `left` may sit immediately to the
/// left of `right`; all symmetric images of the rule are derived from it.
#[derive(Clone, Debug, Deserialize)]
pub struct NeighborRule {
    /// Tile on the left side of the pair
    pub left: String,
    /// Tile on the right side of the pair
    pub right: String,
}

/// A complete tile-set description
#[derive(Clone, Debug, Deserialize)]
pub struct TileCatalog {
    /// Tile edge length in pixels
    #[serde(default = "default_tile_size")]
    pub tile_size: usize,
    /// Whether variant bitmaps are distinct files instead of derived
    #[serde(default)]
    pub unique: bool,
    /// Tiles in declaration order
    pub tiles: Vec<TileEntry>,
    /// Horizontal adjacency rules
    #[serde(default)]
    pub neighbors: Vec<NeighborRule>,
    /// Named tile subsets selectable at build time
    #[serde(default)]
    pub subsets: BTreeMap<String, Vec<String>>,
}

const fn default_tile_size() -> usize {
    DEFAULT_TILE_SIZE
}

fn default_symmetry() -> String {
    "X".to_string()
}

const fn default_weight() -> f64 {
    1.0
}

impl TileCatalog {
    /// Parse a catalog from a JSON string
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the JSON does not match the
    /// schema.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GenerationError::Configuration {
            reason: format!("tile catalog does not match schema: {e}"),
        })
    }

    /// Load a catalog from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| GenerationError::FileSystem {
            path: path.to_path_buf(),
            operation: "read catalog",
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| GenerationError::CatalogParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Resolve a named subset to its tile names
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the subset does not exist.
    pub fn subset(&self, name: &str) -> Result<&[String]> {
        self.subsets
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| GenerationError::Configuration {
                reason: format!("subset '{name}' is not defined in the catalog"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::TileCatalog;

    #[test]
    fn test_catalog_defaults() {
        let catalog = TileCatalog::from_json(
            r#"{ "tiles": [ { "name": "blank" } ] }"#,
        )
        .unwrap();

        assert_eq!(catalog.tile_size, 16);
        assert!(!catalog.unique);
        let tile = catalog.tiles.first().unwrap();
        assert_eq!(tile.symmetry, "X");
        assert!((tile.weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_subset_is_rejected() {
        let catalog = TileCatalog::from_json(
            r#"{ "tiles": [ { "name": "blank" } ], "subsets": { "small": ["blank"] } }"#,
        )
        .unwrap();

        assert!(catalog.subset("small").is_ok());
        assert!(catalog.subset("missing").is_err());
    }
}
