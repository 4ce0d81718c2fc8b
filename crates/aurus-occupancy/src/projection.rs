//! Marginal projections of 3D cubes for plotting.
//!
//! A cube has shape `[n0, n1, n2]`; for an [`OccupancyGrid`] that is
//! `[height, width, bins]`. Each projection reduces one axis:
//!
//! | plane | reduced axis | shape     |
//! |-------|--------------|-----------|
//! | `xy`  | 0            | `n1 x n2` |
//! | `xz`  | 1            | `n0 x n2` |
//! | `yz`  | 2            | `n0 x n1` |

#![warn(missing_docs)]

use nalgebra::DMatrix;
use tracing::debug;

use crate::error::PerceptionError;
use crate::map::OccupancyGrid;

/// Read access to a dense 3D array of numbers.
pub trait Cube {
    /// Shape as `[n0, n1, n2]`.
    fn shape(&self) -> [usize; 3];

    /// Value at `(i, j, k)`.
    ///
    /// # Panics
    ///
    /// Implementations may panic if any index lies outside [`Cube::shape`].
    fn value(&self, i: usize, j: usize, k: usize) -> f64;
}

impl Cube for OccupancyGrid {
    fn shape(&self) -> [usize; 3] {
        OccupancyGrid::shape(self)
    }

    fn value(&self, i: usize, j: usize, k: usize) -> f64 {
        let index = (i * self.width() + j) * self.bins() + k;
        if self.as_slice()[index] { 1.0 } else { 0.0 }
    }
}

/// A dense cube of `f64` values stored with the last axis fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarCube {
    shape: [usize; 3],
    data: Vec<f64>,
}

impl ScalarCube {
    /// Wraps `data` as a cube of the given shape.
    ///
    /// # Errors
    ///
    /// Returns `Err(PerceptionError::InvalidConfiguration)` if `data` does not hold
    /// exactly `n0 * n1 * n2` values.
    pub fn new(shape: [usize; 3], data: Vec<f64>) -> Result<Self, PerceptionError> {
        let total = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or(PerceptionError::InvalidConfiguration(
                "Cube dimensions too large, would cause overflow",
            ))?;
        if data.len() != total {
            return Err(PerceptionError::InvalidConfiguration(
                "Cube data length must equal n0 * n1 * n2",
            ));
        }
        Ok(ScalarCube { shape, data })
    }

    /// Builds a cube by evaluating `f(i, j, k)` for every cell.
    pub fn from_fn(shape: [usize; 3], mut f: impl FnMut(usize, usize, usize) -> f64) -> Self {
        let [n0, n1, n2] = shape;
        let mut data = Vec::with_capacity(n0 * n1 * n2);
        for i in 0..n0 {
            for j in 0..n1 {
                for k in 0..n2 {
                    data.push(f(i, j, k));
                }
            }
        }
        ScalarCube { shape, data }
    }

    /// Sum of every value.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

impl Cube for ScalarCube {
    fn shape(&self) -> [usize; 3] {
        self.shape
    }

    fn value(&self, i: usize, j: usize, k: usize) -> f64 {
        let [_, n1, n2] = self.shape;
        self.data[(i * n1 + j) * n2 + k]
    }
}

/// The three axis-reduced planes of a cube.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginalProjection {
    /// Reduction over axis 0, `n1 x n2`.
    pub xy: DMatrix<f64>,
    /// Reduction over axis 1, `n0 x n2`.
    pub xz: DMatrix<f64>,
    /// Reduction over axis 2, `n0 x n1`.
    pub yz: DMatrix<f64>,
}

impl MarginalProjection {
    /// `(rows, columns)` of the `xy`, `xz` and `yz` planes.
    pub fn shapes(&self) -> [(usize, usize); 3] {
        [self.xy.shape(), self.xz.shape(), self.yz.shape()]
    }

    /// Element sums of the `xy`, `xz` and `yz` planes.
    pub fn totals(&self) -> [f64; 3] {
        [self.xy.sum(), self.xz.sum(), self.yz.sum()]
    }
}

/// Reduces cubes into [`MarginalProjection`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisMarginalProjector {
    normalize: bool,
}

impl AxisMarginalProjector {
    /// Creates a projector that sums along each axis, or averages when `normalize` is set.
    pub const fn new(normalize: bool) -> Self {
        AxisMarginalProjector { normalize }
    }

    /// Whether the projector averages instead of summing.
    pub fn normalize(&self) -> bool {
        self.normalize
    }

    /// Projects `cube` onto its three planes. The cube is only read.
    pub fn project<C: Cube + ?Sized>(&self, cube: &C) -> MarginalProjection {
        let [n0, n1, n2] = cube.shape();
        let mut xy = DMatrix::<f64>::zeros(n1, n2);
        let mut xz = DMatrix::<f64>::zeros(n0, n2);
        let mut yz = DMatrix::<f64>::zeros(n0, n1);

        for i in 0..n0 {
            for j in 0..n1 {
                for k in 0..n2 {
                    let v = cube.value(i, j, k);
                    if v != 0.0 {
                        xy[(j, k)] += v;
                        xz[(i, k)] += v;
                        yz[(i, j)] += v;
                    }
                }
            }
        }

        if self.normalize {
            // An empty axis leaves its plane empty, so there is nothing to divide
            if n0 > 0 {
                xy /= n0 as f64;
            }
            if n1 > 0 {
                xz /= n1 as f64;
            }
            if n2 > 0 {
                yz /= n2 as f64;
            }
        }

        debug!(n0, n1, n2, normalize = self.normalize, "Projected cube marginals");
        MarginalProjection { xy, xz, yz }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::depth::DepthMatrix;
    use crate::map::OccupancyGridBuilder;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_projection_shapes() {
        let cube = ScalarCube::from_fn([2, 3, 4], |_, _, _| 1.0);
        let projection = AxisMarginalProjector::new(false).project(&cube);
        assert_eq!(projection.shapes(), [(3, 4), (2, 4), (2, 3)]);
        assert!((projection.xy[(0, 0)] - 2.0).abs() < EPSILON);
        assert!((projection.xz[(0, 0)] - 3.0).abs() < EPSILON);
        assert!((projection.yz[(0, 0)] - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_sums_are_preserved() {
        let mut rng = StdRng::seed_from_u64(42);
        let cube = ScalarCube::from_fn([5, 7, 3], |_, _, _| rng.random_range(-2.0..5.0));
        let total = cube.sum();
        let projection = AxisMarginalProjector::new(false).project(&cube);
        for plane_total in projection.totals() {
            assert!((plane_total - total).abs() < 1e-6);
        }
    }

    #[test]
    fn test_normalized_projection_is_mean() {
        let cube = ScalarCube::from_fn([2, 2, 4], |i, j, k| (i * 100 + j * 10 + k) as f64);
        let projection = AxisMarginalProjector::new(true).project(&cube);

        // mean over i of (i*100 + j*10 + k) = 50 + j*10 + k
        assert!((projection.xy[(1, 3)] - 63.0).abs() < EPSILON);
        // mean over j = i*100 + 5 + k
        assert!((projection.xz[(1, 2)] - 107.0).abs() < EPSILON);
        // mean over k = i*100 + j*10 + 1.5
        assert!((projection.yz[(0, 1)] - 11.5).abs() < EPSILON);
    }

    #[test]
    fn test_occupancy_grid_projection() {
        let config = GridConfig::new(2, 2, 0.1, 1.0).unwrap();
        let matrix = DepthMatrix::from_rows(2, 2, vec![0.35, 2.0, 0.0, 0.95]).unwrap();
        let grid = OccupancyGridBuilder::new(config).unwrap().build(&matrix).unwrap();
        let before = grid.clone();

        let projection = AxisMarginalProjector::new(false).project(&grid);
        let occupied = grid.occupied_count() as f64;
        assert!((occupied - (7.0 + 0.0 + 10.0 + 1.0)).abs() < EPSILON);
        for plane_total in projection.totals() {
            assert!((plane_total - occupied).abs() < EPSILON);
        }

        // Column (y=0, x=0) holds 7 occupied bins
        assert!((projection.yz[(0, 0)] - 7.0).abs() < EPSILON);
        assert!((projection.yz[(0, 1)] - 0.0).abs() < EPSILON);
        assert!((projection.yz[(1, 0)] - 10.0).abs() < EPSILON);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_scalar_cube_rejects_wrong_length() {
        assert!(matches!(
            ScalarCube::new([2, 2, 2], vec![0.0; 7]),
            Err(PerceptionError::InvalidConfiguration(_))
        ));
        assert!(ScalarCube::new([2, 2, 2], vec![0.0; 8]).is_ok());
    }

    #[test]
    fn test_empty_cube() {
        let cube = ScalarCube::new([0, 3, 2], Vec::new()).unwrap();
        let projection = AxisMarginalProjector::new(true).project(&cube);
        assert_eq!(projection.shapes(), [(3, 2), (0, 2), (0, 3)]);
        assert!(projection.xy.iter().all(|&v| v == 0.0));
    }

    #[test]
    #[should_panic]
    fn test_value_outside_shape_panics() {
        let cube = ScalarCube::new([2, 2, 2], vec![1.0; 8]).unwrap();
        cube.value(2, 0, 0);
    }
}
