//! Per-pixel depth occupancy grid and the builder that quantizes a depth matrix into it.
//!
//! Every pixel of the frame owns a column of `bins` depth cells. A cell is
//! occupied when the space it covers lies at or beyond the measured surface and
//! within the scan limit. Pixels without a valid return are treated as fully
//! blocked, and pixels at or past the scan limit as fully clear.

#![warn(missing_docs)]

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::GridConfig;
use crate::depth::{DepthMatrix, is_valid_reading};
use crate::error::PerceptionError;

/// Fraction of invalid readings above which the builder logs a dropout warning.
const DROPOUT_WARN_RATIO: f64 = 0.5;

/// A `height x width x bins` boolean occupancy grid.
///
/// Cells live in one flat vector indexed by `(y * width + x) * bins + k`, so every
/// `(y, x, k)` triple owns distinct storage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawOccupancyGrid"))]
pub struct OccupancyGrid {
    /// Frame height in pixels
    height: usize,
    /// Frame width in pixels
    width: usize,
    /// Depth bins per pixel column
    bins: usize,
    /// Depth extent of a bin in meters
    block_size: f32,
    /// Vector storing the occupancy of each cell
    data: Vec<bool>,
}

/// Unchecked fields of a deserialized grid.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawOccupancyGrid {
    height: usize,
    width: usize,
    bins: usize,
    block_size: f32,
    data: Vec<bool>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawOccupancyGrid> for OccupancyGrid {
    type Error = PerceptionError;

    fn try_from(raw: RawOccupancyGrid) -> Result<Self, Self::Error> {
        if raw.height == 0 || raw.width == 0 || raw.bins == 0 {
            return Err(PerceptionError::InvalidConfiguration(
                "Height, width and bins must be non-zero",
            ));
        }
        if !(raw.block_size > 0.0) || !raw.block_size.is_finite() {
            return Err(PerceptionError::InvalidConfiguration(
                "Block size must be positive and finite",
            ));
        }
        let total_cells = raw
            .height
            .checked_mul(raw.width)
            .and_then(|cells| cells.checked_mul(raw.bins));
        if total_cells != Some(raw.data.len()) {
            return Err(PerceptionError::InvalidConfiguration(
                "Data length must equal height * width * bins",
            ));
        }
        Ok(OccupancyGrid {
            height: raw.height,
            width: raw.width,
            bins: raw.bins,
            block_size: raw.block_size,
            data: raw.data,
        })
    }
}

impl OccupancyGrid {
    /// Creates an all-clear grid shaped by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Err(PerceptionError::InvalidConfiguration)` if `config` is invalid or
    /// the cell count would overflow.
    pub fn new(config: &GridConfig) -> Result<Self, PerceptionError> {
        config.validate()?;
        let total_cells = config.total_cells().ok_or(PerceptionError::InvalidConfiguration(
            "Grid dimensions too large, would cause overflow",
        ))?;

        Ok(OccupancyGrid {
            height: config.height,
            width: config.width,
            bins: config.bins(),
            block_size: config.block_size,
            data: vec![false; total_cells],
        })
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Depth bins per pixel column.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Shape as `[height, width, bins]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.height, self.width, self.bins]
    }

    /// Total number of cells.
    pub fn total_cells(&self) -> usize {
        self.data.len()
    }

    fn get_index(&self, y: usize, x: usize, k: usize) -> usize {
        (y * self.width + x) * self.bins + k
    }

    fn check_bounds(&self, y: usize, x: usize, k: usize) -> Result<(), PerceptionError> {
        if y >= self.height || x >= self.width {
            return Err(PerceptionError::OutOfRangeCoordinate {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        if k >= self.bins {
            return Err(PerceptionError::InvalidConfiguration(
                "Bin index exceeds grid depth",
            ));
        }
        Ok(())
    }

    /// Occupancy of cell `(y, x, k)`.
    pub fn get(&self, y: usize, x: usize, k: usize) -> Result<bool, PerceptionError> {
        self.check_bounds(y, x, k)?;
        Ok(self.data[self.get_index(y, x, k)])
    }

    /// Sets the occupancy of cell `(y, x, k)` without touching any other cell.
    pub fn set(&mut self, y: usize, x: usize, k: usize, occupied: bool) -> Result<(), PerceptionError> {
        self.check_bounds(y, x, k)?;
        let index = self.get_index(y, x, k);
        self.data[index] = occupied;
        Ok(())
    }

    /// The depth column behind pixel `(y, x)`, nearest bin first.
    pub fn column(&self, y: usize, x: usize) -> Result<&[bool], PerceptionError> {
        self.check_bounds(y, x, 0)?;
        let start = self.get_index(y, x, 0);
        Ok(&self.data[start..start + self.bins])
    }

    /// Index of the nearest occupied bin behind pixel `(y, x)`, if any.
    pub fn nearest_occupied_bin(&self, y: usize, x: usize) -> Result<Option<usize>, PerceptionError> {
        Ok(self.column(y, x)?.iter().position(|&occupied| occupied))
    }

    /// Distance (m) to the near edge of bin `k`.
    pub fn bin_near_edge(&self, k: usize) -> f32 {
        k as f32 * self.block_size
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.data.iter().filter(|&&occupied| occupied).count()
    }

    /// All cells in storage order.
    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    /// Renders depth layer `k` as rows of `@` (occupied) and `.` (clear).
    pub fn layer_ascii(&self, k: usize) -> Result<String, PerceptionError> {
        if k >= self.bins {
            return Err(PerceptionError::InvalidConfiguration(
                "Bin index exceeds grid depth",
            ));
        }
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(if self.data[self.get_index(y, x, k)] { '@' } else { '.' });
            }
            out.push('\n');
        }
        Ok(out)
    }
}

impl std::fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "OccupancyGrid ({}x{}x{}, block size: {:.3}m)",
            self.height, self.width, self.bins, self.block_size
        )?;

        // Print each depth layer separately
        for k in 0..self.bins {
            writeln!(
                f,
                "Layer K={} (depth: {:.3}m):",
                k,
                self.bin_near_edge(k)
            )?;
            for y in 0..self.height {
                for x in 0..self.width {
                    let occupied = self.data[self.get_index(y, x, k)];
                    write!(f, "{}", if occupied { '@' } else { '.' })?;
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Quantizes a depth matrix into an [`OccupancyGrid`].
#[derive(Debug, Clone, Copy)]
pub struct OccupancyGridBuilder {
    config: GridConfig,
}

impl OccupancyGridBuilder {
    /// Creates a builder for `config`.
    ///
    /// # Errors
    ///
    /// Returns `Err(PerceptionError::InvalidConfiguration)` if `config` is invalid,
    /// before any grid storage is allocated.
    pub fn new(config: GridConfig) -> Result<Self, PerceptionError> {
        config.validate()?;
        Ok(OccupancyGridBuilder { config })
    }

    /// The configuration this builder quantizes with.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Builds the occupancy grid for `matrix`.
    ///
    /// Rows are filled in parallel; each worker writes only to the columns of its
    /// own row, so the result is identical to a sequential build.
    ///
    /// # Errors
    ///
    /// Returns `Err(PerceptionError::DimensionMismatch)` if the matrix shape differs
    /// from the configured frame.
    pub fn build(&self, matrix: &DepthMatrix) -> Result<OccupancyGrid, PerceptionError> {
        let expected = (self.config.height, self.config.width);
        let actual = (matrix.height(), matrix.width());
        if expected != actual {
            return Err(PerceptionError::DimensionMismatch { expected, actual });
        }

        let mut grid = OccupancyGrid::new(&self.config)?;
        let bins = grid.bins;
        let row_len = grid.width * bins;
        let block_size = f64::from(self.config.block_size);
        let limit = f64::from(self.config.scan_depth_limit);

        grid.data
            .par_chunks_mut(row_len)
            .zip(matrix.as_slice().par_chunks(matrix.width()))
            .for_each(|(cells, readings)| {
                for (column, &distance) in cells.chunks_mut(bins).zip(readings) {
                    mark_column(column, distance, block_size, limit);
                }
            });

        let invalid = matrix.invalid_count();
        let invalid_ratio = invalid as f64 / matrix.as_slice().len() as f64;
        if invalid_ratio > DROPOUT_WARN_RATIO {
            warn!(invalid, invalid_ratio, "Most depth samples have no return; grid is largely blocked");
        }
        debug!(
            height = grid.height,
            width = grid.width,
            bins,
            occupied = grid.occupied_count(),
            "Built occupancy grid"
        );
        Ok(grid)
    }
}

/// Marks one pixel's depth column for a raw reading.
///
/// Starting at the measured distance, steps one block at a time towards the scan
/// limit and marks the bin each step lands in. The bin index of step `i` is the
/// surface bin plus `i`, which avoids accumulating floating point error.
fn mark_column(column: &mut [bool], distance: f32, block_size: f64, limit: f64) {
    let last = column.len() - 1;

    if !is_valid_reading(distance) {
        // No return: the column cannot be proven clear
        column.fill(true);
        return;
    }

    let surface = f64::from(distance);
    let surface_bin = (surface / block_size).floor() as usize;
    let mut step = 0usize;
    while surface + step as f64 * block_size < limit {
        column[(surface_bin + step).min(last)] = true;
        step += 1;
    }
}
