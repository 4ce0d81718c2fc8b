//! This module defines the error types used by the `aurus-occupancy` crate.

#![warn(missing_docs)]

use thiserror::Error;

/// Error type for occupancy perception operations.
///
/// This enum covers configuration validation and matrix access failures.
/// Errors coming from an external depth source are never wrapped in this type;
/// they are returned to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PerceptionError {
    /// Error for invalid grid or renderer parameters.
    /// This variant is returned when a dimension is zero or a length is not a positive, finite number.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    /// Error for sampling a depth matrix outside its bounds.
    #[error("Coordinate ({x}, {y}) out of range for {width}x{height} depth matrix")]
    OutOfRangeCoordinate {
        /// Requested column.
        x: usize,
        /// Requested row.
        y: usize,
        /// Matrix width in pixels.
        width: usize,
        /// Matrix height in pixels.
        height: usize,
    },
    /// Error for a depth matrix whose shape does not match the grid configuration.
    /// Shapes are given as `(height, width)`.
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Shape required by the configuration.
        expected: (usize, usize),
        /// Shape of the supplied matrix.
        actual: (usize, usize),
    },
}
