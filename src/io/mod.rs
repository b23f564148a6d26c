//! Input/output operations and error handling

/// Tile catalog data model and loader
pub mod catalog;
/// Command-line interface and the attempt retry loop
pub mod cli;
/// Defaults and named constants
pub mod configuration;
/// Error types shared across the crate
pub mod error;
/// Sample decoding and PNG export
pub mod image;
/// Progress reporting
pub mod progress;
