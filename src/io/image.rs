//! Sample decoding to an indexed palette, and PNG export

use image::RgbaImage;
use ndarray::Array2;
use std::collections::HashMap;
use std::path::Path;

use crate::io::configuration::MAX_PALETTE_COLORS;
use crate::io::error::{GenerationError, Result};

/// A sample image reduced to palette indices
///
/// The palette is the set of distinct RGBA colors in the sample, sorted
/// bytewise so index assignment is reproducible across runs regardless of
/// pixel order. Indices are stored row-major as (row, column).
#[derive(Clone, Debug)]
pub struct SampleImage {
    indices: Array2<u8>,
    palette: Vec<[u8; 4]>,
}

impl SampleImage {
    /// Decode a PNG sample and index its colors
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be decoded or holds more than
    /// [`MAX_PALETTE_COLORS`] distinct colors.
    pub fn from_png_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let decoded = image::open(&path_buf).map_err(|e| GenerationError::ImageLoad {
            path: path_buf,
            source: e,
        })?;
        let rgba = decoded.to_rgba8();

        let mut color_set = std::collections::HashSet::new();
        for pixel in rgba.pixels() {
            color_set.insert(pixel.0);
        }

        // Deterministic palette ordering keeps value ids stable between runs
        let mut palette: Vec<[u8; 4]> = color_set.into_iter().collect();
        palette.sort_unstable();

        if palette.len() > MAX_PALETTE_COLORS {
            return Err(GenerationError::Configuration {
                reason: format!(
                    "sample has {} distinct colors, at most {MAX_PALETTE_COLORS} are supported",
                    palette.len()
                ),
            });
        }

        let lookup: HashMap<[u8; 4], u8> = palette
            .iter()
            .enumerate()
            .map(|(index, &color)| (color, index as u8))
            .collect();

        let (width, height) = (rgba.width() as usize, rgba.height() as usize);
        let mut indices = Array2::zeros((height, width));
        for (x, y, pixel) in rgba.enumerate_pixels() {
            if let Some(slot) = indices.get_mut((y as usize, x as usize)) {
                *slot = lookup.get(&pixel.0).copied().unwrap_or(0);
            }
        }

        Self::from_indices(indices, palette)
    }

    /// Build a sample from pre-indexed data
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the sample is empty, the palette
    /// is empty, or an index points past the palette.
    pub fn from_indices(indices: Array2<u8>, palette: Vec<[u8; 4]>) -> Result<Self> {
        let (height, width) = indices.dim();
        if height == 0 || width == 0 {
            return Err(GenerationError::Configuration {
                reason: "sample image is empty".to_string(),
            });
        }
        if palette.is_empty() {
            return Err(GenerationError::Configuration {
                reason: "sample palette is empty".to_string(),
            });
        }
        if let Some(&bad) = indices.iter().find(|&&index| index as usize >= palette.len()) {
            return Err(GenerationError::Configuration {
                reason: format!(
                    "sample index {bad} exceeds palette of {} colors",
                    palette.len()
                ),
            });
        }

        Ok(Self { indices, palette })
    }

    /// Sample width in pixels
    pub fn width(&self) -> usize {
        self.indices.ncols()
    }

    /// Sample height in pixels
    pub fn height(&self) -> usize {
        self.indices.nrows()
    }

    /// Number of distinct colors
    pub const fn color_count(&self) -> usize {
        self.palette.len()
    }

    /// Palette index at (x, y)
    pub fn index_at(&self, x: usize, y: usize) -> u8 {
        self.indices.get((y, x)).copied().unwrap_or(0)
    }

    /// RGBA palette in index order
    pub fn palette(&self) -> &[[u8; 4]] {
        &self.palette
    }
}

/// Save a rendered image as PNG, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the image
/// cannot be written.
pub fn save_png<P: AsRef<Path>>(rendered: &RgbaImage, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| GenerationError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }
    }

    rendered.save(path).map_err(|e| GenerationError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}
