//! Error types shared across model building, solving, and output

use std::fmt;
use std::path::PathBuf;

/// Main error type for all generation operations
///
/// Note that a contradiction is *not* an error: it is a normal run outcome
/// carried by [`crate::solver::RunOutcome`]. Errors here are faults of the
/// configuration or the environment, surfaced before or around solving.
#[derive(Debug)]
pub enum GenerationError {
    /// Failed to load a sample or tile image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save a rendered image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// Tile catalog file did not parse
    CatalogParse {
        /// Path to the catalog file
        path: PathBuf,
        /// Underlying deserialization error
        source: serde_json::Error,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Model input violates a builder contract
    ///
    /// Covers missing subsets, unknown tile references, non-positive
    /// weights, and values with no compatible neighbor in some direction.
    /// Always raised before any run starts.
    Configuration {
        /// Description of the violated contract
        reason: String,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Every seeded attempt ended in contradiction
    RetriesExhausted {
        /// Number of attempts made
        attempts: usize,
    },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::CatalogParse { path, source } => {
                write!(
                    f,
                    "Failed to parse tile catalog '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Configuration { reason } => {
                write!(f, "Invalid model configuration: {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::RetriesExhausted { attempts } => {
                write!(
                    f,
                    "All {attempts} attempts ended in contradiction; try another seed"
                )
            }
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::CatalogParse { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for generation results
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Create a configuration error
pub fn configuration_error(reason: &impl ToString) -> GenerationError {
    GenerationError::Configuration {
        reason: reason.to_string(),
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> GenerationError {
    GenerationError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
