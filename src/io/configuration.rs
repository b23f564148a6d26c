//! Defaults and named constants for the command line and the builders

/// Default pattern size N for overlapping models
pub const DEFAULT_PATTERN_SIZE: usize = 3;

/// Default symmetry expansion for overlapping models (all 8 transforms)
pub const DEFAULT_SYMMETRY: usize = 8;

/// Default output edge length for overlapping models, in cells
pub const DEFAULT_OVERLAPPING_SIZE: usize = 48;

/// Default output edge length for tiled models, in cells
pub const DEFAULT_TILED_SIZE: usize = 24;

/// Default number of seeded attempts before giving up on contradictions
pub const DEFAULT_ATTEMPTS: usize = 10;

/// Default tile edge length in pixels when a catalog omits it
pub const DEFAULT_TILE_SIZE: usize = 16;

/// Most colors an indexed sample palette may hold
pub const MAX_PALETTE_COLORS: usize = 256;

/// Suffix added to output filenames derived from the input path
pub const OUTPUT_SUFFIX: &str = "_result";
