//! Explicit configuration values threaded into each perception component.

#![warn(missing_docs)]

use crate::error::PerceptionError;

/// Relative tolerance used when deciding whether the scan limit is an exact
/// multiple of the block size.
const BIN_TOLERANCE: f64 = 1e-6;

/// Default number of rows aggregated into one density line.
pub const DEFAULT_BAND_HEIGHT: usize = 20;

/// Frame shape and depth quantization parameters.
///
/// Fields are public so the value can be deserialized from a settings file;
/// every builder re-validates the configuration before it allocates anything.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridConfig {
    /// Frame height in pixels.
    pub height: usize,
    /// Frame width in pixels.
    pub width: usize,
    /// Depth extent of a single bin (m).
    pub block_size: f32,
    /// Distance beyond which readings are treated as clear (m).
    pub scan_depth_limit: f32,
}

impl GridConfig {
    /// Construct a validated grid configuration.
    ///
    /// # Arguments
    ///
    /// * `height`: Frame height in pixels.
    /// * `width`: Frame width in pixels.
    /// * `block_size`: Depth extent of a single bin in meters.
    /// * `scan_depth_limit`: Maximum depth considered, in meters.
    ///
    /// # Errors
    ///
    /// Returns `Err(PerceptionError::InvalidConfiguration)` if a dimension is zero
    /// or a length is not a positive, finite number.
    pub fn new(
        height: usize,
        width: usize,
        block_size: f32,
        scan_depth_limit: f32,
    ) -> Result<Self, PerceptionError> {
        let config = GridConfig {
            height,
            width,
            block_size,
            scan_depth_limit,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every field, returning the first violation found.
    pub fn validate(&self) -> Result<(), PerceptionError> {
        if self.height == 0 || self.width == 0 {
            return Err(PerceptionError::InvalidConfiguration(
                "Height and width must be non-zero",
            ));
        }
        if !(self.block_size > 0.0) || !self.block_size.is_finite() {
            return Err(PerceptionError::InvalidConfiguration(
                "Block size must be positive and finite",
            ));
        }
        if !(self.scan_depth_limit > 0.0) || !self.scan_depth_limit.is_finite() {
            return Err(PerceptionError::InvalidConfiguration(
                "Scan depth limit must be positive and finite",
            ));
        }
        Ok(())
    }

    /// Number of depth bins per pixel column, `ceil(scan_depth_limit / block_size)`.
    ///
    /// A ratio within floating point noise of an integer is treated as that
    /// integer, so `0.3 / 0.1` gives three bins rather than four.
    pub fn bins(&self) -> usize {
        let ratio = f64::from(self.scan_depth_limit) / f64::from(self.block_size);
        let nearest = ratio.round();
        let bins = if (ratio - nearest).abs() <= BIN_TOLERANCE * nearest.max(1.0) {
            nearest
        } else {
            ratio.ceil()
        };
        (bins as usize).max(1)
    }

    /// Total number of cells in a grid built from this configuration.
    ///
    /// Returns `None` if the product overflows `usize`.
    pub fn total_cells(&self) -> Option<usize> {
        self.height
            .checked_mul(self.width)
            .and_then(|pixels| pixels.checked_mul(self.bins()))
    }
}

impl Default for GridConfig {
    /// 640x480 frame, 10 cm bins out to one meter.
    fn default() -> Self {
        GridConfig {
            height: 480,
            width: 640,
            block_size: 0.1,
            scan_depth_limit: 1.0,
        }
    }
}

/// Parameters for the ASCII coverage density strip.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DensityConfig {
    /// Samples strictly nearer than this (and strictly positive) are counted (m).
    pub threshold: f32,
    /// Rows aggregated into one output line.
    #[cfg_attr(feature = "serde", serde(default = "default_band_height"))]
    pub band_height: usize,
}

#[cfg(feature = "serde")]
fn default_band_height() -> usize {
    DEFAULT_BAND_HEIGHT
}

impl DensityConfig {
    /// Construct a validated density configuration with the default 20-row band.
    pub fn new(threshold: f32) -> Result<Self, PerceptionError> {
        let config = DensityConfig {
            threshold,
            band_height: DEFAULT_BAND_HEIGHT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the threshold and band height.
    pub fn validate(&self) -> Result<(), PerceptionError> {
        if !(self.threshold > 0.0) || !self.threshold.is_finite() {
            return Err(PerceptionError::InvalidConfiguration(
                "Density threshold must be positive and finite",
            ));
        }
        if self.band_height == 0 {
            return Err(PerceptionError::InvalidConfiguration(
                "Band height must be non-zero",
            ));
        }
        Ok(())
    }
}

impl Default for DensityConfig {
    fn default() -> Self {
        DensityConfig {
            threshold: 1.0,
            band_height: DEFAULT_BAND_HEIGHT,
        }
    }
}
