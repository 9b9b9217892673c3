//! Error types for strata.

use thiserror::Error;

/// The main error type for strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    /// A layer with the given label was never allocated, or was deallocated.
    #[error("layer '{0}' is not allocated")]
    UnknownLayer(String),

    /// A layer with the given label is already allocated.
    #[error("layer '{0}' is already allocated")]
    DuplicateLayer(String),

    /// A transform chain contains a leaf that cannot be flattened to a matrix,
    /// either a non-linear leaf or the inverse of a singular matrix.
    #[error("transform cannot be simplified to a matrix: {0}")]
    UnsimplifiableTransform(String),

    /// A flood-fill seed lies outside the volume.
    #[error("seed {seed:?} is outside volume of shape {shape:?}")]
    SeedOutOfRange { seed: [usize; 3], shape: [usize; 3] },

    /// A flood-fill threshold must be finite and greater than one.
    #[error("flood fill threshold must be finite and > 1, got {0}")]
    InvalidThreshold(f32),

    /// Volume shape mismatch.
    #[error("volume shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        actual: [usize; 3],
    },

    /// A clamp range must be finite.
    #[error("invalid clamp range ({low}, {high})")]
    InvalidClim { low: f32, high: f32 },

    /// An options value is outside its allowed range.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;
