//! Depth sampling and the dense distance matrix built from it.
//!
//! A [`DepthSource`] is anything that can report a distance in meters for a
//! pixel coordinate: a captured sensor frame, a simulated scene, or an already
//! materialized [`DepthMatrix`]. The [`DepthMatrixBuilder`] samples a source
//! over the configured frame into a row-major matrix without filtering, so
//! invalid readings reach the downstream components unchanged.

#![warn(missing_docs)]

use tracing::debug;

use crate::config::GridConfig;
use crate::error::PerceptionError;

/// A capability to sample distance readings at pixel coordinates.
///
/// Readings are in meters. A reading `<= 0` (or `NaN`) means the sensor had no
/// valid return for that pixel; this is data, not an error.
pub trait DepthSource {
    /// Error reported by the underlying source. Propagated unchanged by every
    /// component in this crate.
    type Error;

    /// Returns the `(width, height)` of the frame in pixels.
    fn dimensions(&self) -> (usize, usize);

    /// Returns the distance at column `x`, row `y`.
    fn sample(&self, x: usize, y: usize) -> Result<f32, Self::Error>;
}

/// Adapts a closure into a [`DepthSource`] with fixed dimensions.
///
/// ```
/// use aurus_occupancy::{DepthSource, SampleFn};
///
/// let source = SampleFn::new(4, 2, |x, _y| Ok::<f32, ()>(x as f32 * 0.25));
/// assert_eq!(source.sample(2, 1), Ok(0.5));
/// ```
pub struct SampleFn<F> {
    width: usize,
    height: usize,
    sample: F,
}

impl<F> SampleFn<F> {
    /// Wraps `sample` as a `width x height` source.
    pub fn new(width: usize, height: usize, sample: F) -> Self {
        SampleFn {
            width,
            height,
            sample,
        }
    }
}

impl<F, E> DepthSource for SampleFn<F>
where
    F: Fn(usize, usize) -> Result<f32, E>,
{
    type Error = E;

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn sample(&self, x: usize, y: usize) -> Result<f32, E> {
        (self.sample)(x, y)
    }
}

/// A `height x width` matrix of raw distance readings (m), stored row-major.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDepthMatrix"))]
pub struct DepthMatrix {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

/// Unchecked fields of a deserialized matrix, validated by [`DepthMatrix::from_rows`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawDepthMatrix {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDepthMatrix> for DepthMatrix {
    type Error = PerceptionError;

    fn try_from(raw: RawDepthMatrix) -> Result<Self, Self::Error> {
        DepthMatrix::from_rows(raw.height, raw.width, raw.data)
    }
}

impl DepthMatrix {
    /// Wraps row-major readings as a matrix.
    ///
    /// # Errors
    ///
    /// Returns `Err(PerceptionError::InvalidConfiguration)` if a dimension is zero
    /// or `data` does not hold exactly `height * width` readings.
    pub fn from_rows(height: usize, width: usize, data: Vec<f32>) -> Result<Self, PerceptionError> {
        if height == 0 || width == 0 {
            return Err(PerceptionError::InvalidConfiguration(
                "Height and width must be non-zero",
            ));
        }
        let expected = height.checked_mul(width).ok_or(
            PerceptionError::InvalidConfiguration("Matrix dimensions too large, would cause overflow"),
        )?;
        if data.len() != expected {
            return Err(PerceptionError::InvalidConfiguration(
                "Data length must equal height * width",
            ));
        }
        Ok(DepthMatrix {
            width,
            height,
            data,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reading at column `x`, row `y`, or `None` outside the matrix.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    /// Readings of row `y`.
    pub fn row(&self, y: usize) -> Option<&[f32]> {
        if y < self.height {
            Some(&self.data[y * self.width..(y + 1) * self.width])
        } else {
            None
        }
    }

    /// Iterates over the rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.width)
    }

    /// All readings in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Number of pixels without a valid return.
    pub fn invalid_count(&self) -> usize {
        self.data.iter().filter(|&&d| !is_valid_reading(d)).count()
    }
}

impl DepthSource for DepthMatrix {
    type Error = PerceptionError;

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn sample(&self, x: usize, y: usize) -> Result<f32, PerceptionError> {
        self.get(x, y).ok_or(PerceptionError::OutOfRangeCoordinate {
            x,
            y,
            width: self.width,
            height: self.height,
        })
    }
}

/// Returns `true` for readings that represent a real surface return.
pub fn is_valid_reading(distance: f32) -> bool {
    distance > 0.0
}

/// Samples a depth source over the configured frame.
#[derive(Debug, Clone, Copy)]
pub struct DepthMatrixBuilder {
    width: usize,
    height: usize,
}

impl DepthMatrixBuilder {
    /// Creates a builder for the frame shape in `config`.
    ///
    /// # Errors
    ///
    /// Returns `Err(PerceptionError::InvalidConfiguration)` if `config` is invalid.
    pub fn new(config: &GridConfig) -> Result<Self, PerceptionError> {
        config.validate()?;
        Ok(DepthMatrixBuilder {
            width: config.width,
            height: config.height,
        })
    }

    /// Builds `matrix[y][x] = source.sample(x, y)` for the whole frame.
    ///
    /// # Errors
    ///
    /// The first error returned by `source` is propagated unmodified; no partial
    /// matrix is produced.
    pub fn build<S: DepthSource>(&self, source: &S) -> Result<DepthMatrix, S::Error> {
        let mut data = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                data.push(source.sample(x, y)?);
            }
        }
        debug!(
            width = self.width,
            height = self.height,
            "Sampled depth matrix"
        );
        Ok(DepthMatrix {
            width: self.width,
            height: self.height,
            data,
        })
    }
}
