//! ASCII coverage density strip for sanity-checking depth frames.
//!
//! The frame is cut into horizontal bands of `band_height` rows and into 64
//! vertical buckets. Each output line summarizes one band: a bucket's glyph
//! grows denser with the number of near-field samples (valid and closer than the
//! threshold) it collected over the band.

#![warn(missing_docs)]

use tracing::debug;

use crate::config::DensityConfig;
use crate::depth::DepthSource;
use crate::error::PerceptionError;

/// Buckets (and characters) per density line.
pub const LINE_WIDTH: usize = 64;

/// Glyphs in order of increasing density.
pub const GLYPH_RAMP: &[u8; 10] = b" .:nhBXiWW";

/// Samples represented by one step along the glyph ramp.
const SAMPLES_PER_GLYPH_STEP: usize = 25;

/// One band of the density strip, always [`LINE_WIDTH`] characters long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityLine(String);

impl DensityLine {
    /// The glyphs of the line.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the line, returning its glyphs.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for DensityLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps a bucket count to its glyph, saturating at the densest symbol.
pub fn glyph_for_count(count: usize) -> char {
    let step = (count / SAMPLES_PER_GLYPH_STEP).min(GLYPH_RAMP.len() - 1);
    GLYPH_RAMP[step] as char
}

/// Renders a depth source as a coarse near-field density strip.
#[derive(Debug, Clone, Copy)]
pub struct CoverageDensityRenderer {
    config: DensityConfig,
}

impl CoverageDensityRenderer {
    /// Creates a renderer.
    ///
    /// # Errors
    ///
    /// Returns `Err(PerceptionError::InvalidConfiguration)` if the threshold is not a
    /// positive, finite distance or the band height is zero.
    pub fn new(config: DensityConfig) -> Result<Self, PerceptionError> {
        config.validate()?;
        Ok(CoverageDensityRenderer { config })
    }

    /// Columns per bucket for a frame `width` pixels wide, `ceil(width / 64)`.
    pub fn bucket_width(width: usize) -> usize {
        width.div_ceil(LINE_WIDTH).max(1)
    }

    /// Samples `source` band by band, handing each finished line to `emit`.
    ///
    /// Only complete bands are emitted; trailing rows that do not fill a band are
    /// sampled but produce no line.
    ///
    /// # Errors
    ///
    /// The first error returned by `source` is propagated unmodified.
    pub fn render_with<S, F>(&self, source: &S, mut emit: F) -> Result<(), S::Error>
    where
        S: DepthSource,
        F: FnMut(DensityLine),
    {
        let (width, height) = source.dimensions();
        let bucket_width = Self::bucket_width(width);
        let band_height = self.config.band_height;
        let threshold = self.config.threshold;
        let mut coverage = [0usize; LINE_WIDTH];
        let mut emitted = 0usize;

        for y in 0..height {
            for x in 0..width {
                let distance = source.sample(x, y)?;
                if 0.0 < distance && distance < threshold {
                    coverage[x / bucket_width] += 1;
                }
            }
            if y % band_height == band_height - 1 {
                let line: String = coverage.iter().map(|&count| glyph_for_count(count)).collect();
                emit(DensityLine(line));
                coverage = [0; LINE_WIDTH];
                emitted += 1;
            }
        }

        debug!(width, height, bucket_width, lines = emitted, "Rendered coverage density");
        Ok(())
    }

    /// Renders `source` and collects every line.
    pub fn render<S: DepthSource>(&self, source: &S) -> Result<Vec<DensityLine>, S::Error> {
        let mut lines = Vec::new();
        self.render_with(source, |line| lines.push(line))?;
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::{DepthMatrix, SampleFn};

    fn renderer(threshold: f32) -> CoverageDensityRenderer {
        CoverageDensityRenderer::new(DensityConfig::new(threshold).unwrap()).unwrap()
    }

    #[test]
    fn test_glyph_ramp() {
        assert_eq!(glyph_for_count(0), ' ');
        assert_eq!(glyph_for_count(24), ' ');
        assert_eq!(glyph_for_count(25), '.');
        assert_eq!(glyph_for_count(130), 'B');
        assert_eq!(glyph_for_count(225), 'W');
        assert_eq!(glyph_for_count(10_000), 'W');
    }

    #[test]
    fn test_bucket_width() {
        assert_eq!(CoverageDensityRenderer::bucket_width(640), 10);
        assert_eq!(CoverageDensityRenderer::bucket_width(650), 11);
        assert_eq!(CoverageDensityRenderer::bucket_width(10), 1);
    }

    #[test]
    fn test_band_counts_map_to_glyphs() {
        // 20x640 frame: bucket 0 collects 13 rows x 10 columns = 130 samples,
        // bucket 1 collects 15 rows = 150, the rest only far samples
        let source = SampleFn::new(640, 20, |x, y| {
            let d = match x {
                0..10 if y < 13 => 0.5,
                10..20 if y < 15 => 0.2,
                _ => 3.0,
            };
            Ok::<f32, ()>(d)
        });
        let lines = renderer(1.0).render(&source).unwrap();

        assert_eq!(lines.len(), 1);
        let line = lines[0].as_str();
        assert_eq!(line.len(), LINE_WIDTH);
        assert_eq!(&line[0..3], "BX ");
        assert!(line[2..].chars().all(|c| c == ' '));
    }

    #[test]
    fn test_invalid_and_far_samples_are_ignored() {
        let source = SampleFn::new(64, 20, |x, _| {
            Ok::<f32, ()>(match x % 4 {
                0 => 0.0,
                1 => -1.0,
                2 => 1.0,
                _ => f32::NAN,
            })
        });
        let lines = renderer(1.0).render(&source).unwrap();
        assert_eq!(lines[0].as_str(), " ".repeat(LINE_WIDTH));
    }

    #[test]
    fn test_saturated_bucket() {
        let source = SampleFn::new(640, 40, |_, _| Ok::<f32, ()>(0.3));
        let lines = renderer(1.0).render(&source).unwrap();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert_eq!(line.to_string(), "W".repeat(LINE_WIDTH));
        }
    }

    #[test]
    fn test_partial_band_not_emitted() {
        let matrix = DepthMatrix::from_rows(39, 64, vec![0.5; 39 * 64]).unwrap();
        let lines = renderer(1.0).render(&matrix).unwrap();
        assert_eq!(lines.len(), 1);

        let short = DepthMatrix::from_rows(19, 64, vec![0.5; 19 * 64]).unwrap();
        assert!(renderer(1.0).render(&short).unwrap().is_empty());
    }

    #[test]
    fn test_counters_reset_between_bands() {
        // Only the second band sees near samples
        let source = SampleFn::new(64, 40, |_, y| Ok::<f32, ()>(if y >= 20 { 0.5 } else { 5.0 }));
        let lines = renderer(1.0).render(&source).unwrap();
        // bucket width 1: 20 samples per bucket per band -> ' '
        assert_eq!(lines[0].as_str(), " ".repeat(LINE_WIDTH));
        assert_eq!(lines[1].as_str(), " ".repeat(LINE_WIDTH));

        let wide = SampleFn::new(128, 40, |_, y| Ok::<f32, ()>(if y >= 20 { 0.5 } else { 5.0 }));
        let lines = renderer(1.0).render(&wide).unwrap();
        // bucket width 2: 40 samples per bucket -> '.'
        assert_eq!(lines[0].as_str(), " ".repeat(LINE_WIDTH));
        assert_eq!(lines[1].as_str(), ".".repeat(LINE_WIDTH));
    }

    #[test]
    fn test_narrow_frame_leaves_trailing_buckets_empty() {
        let source = SampleFn::new(10, 20, |_, _| Ok::<f32, ()>(0.5));
        let lines = renderer(1.0).render(&source).unwrap();
        // 10 columns -> 10 one-column buckets of 20 samples each
        assert_eq!(lines[0].as_str(), " ".repeat(LINE_WIDTH));

        let source = SampleFn::new(10, 40, |_, _| Ok::<f32, ()>(0.5));
        let renderer = CoverageDensityRenderer::new(DensityConfig {
            threshold: 1.0,
            band_height: 40,
        })
        .unwrap();
        let lines = renderer.render(&source).unwrap();
        assert_eq!(lines[0].as_str(), format!("{}{}", ".".repeat(10), " ".repeat(54)));
    }

    #[test]
    fn test_source_error_propagates() {
        let source = SampleFn::new(64, 20, |x, y| if y == 5 && x == 3 { Err("dropped frame") } else { Ok(0.5_f32) });
        assert_eq!(renderer(1.0).render(&source), Err("dropped frame"));
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(matches!(
            CoverageDensityRenderer::new(DensityConfig {
                threshold: -1.0,
                band_height: 20
            }),
            Err(PerceptionError::InvalidConfiguration(_))
        ));
    }
}
