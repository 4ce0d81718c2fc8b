#![warn(missing_docs)]
#![doc = "Depth-frame to occupancy grid conversion for obstacle avoidance."]
#![doc = ""]
#![doc = "This crate samples a depth source into a distance matrix, quantizes the matrix"]
#![doc = "into a per-pixel depth occupancy grid, reduces grids into marginal projections"]
#![doc = "for plotting, and renders a coarse ASCII density strip for debugging."]
#![doc = ""]
#![doc = "```"]
#![doc = "use aurus_occupancy::{DepthMatrixBuilder, GridConfig, OccupancyGridBuilder, SampleFn};"]
#![doc = ""]
#![doc = "let config = GridConfig::new(2, 2, 0.1, 1.0).unwrap();"]
#![doc = "let source = SampleFn::new(2, 2, |_x, _y| Ok::<f32, ()>(0.35));"]
#![doc = "let matrix = DepthMatrixBuilder::new(&config).unwrap().build(&source).unwrap();"]
#![doc = "let grid = OccupancyGridBuilder::new(config).unwrap().build(&matrix).unwrap();"]
#![doc = "assert_eq!(grid.nearest_occupied_bin(0, 0).unwrap(), Some(3));"]
#![doc = "```"]

pub mod config;
pub mod density;
pub mod depth;
pub mod error;
pub mod map;
pub mod projection;

pub use config::{DensityConfig, GridConfig};
pub use density::{CoverageDensityRenderer, DensityLine};
pub use depth::{DepthMatrix, DepthMatrixBuilder, DepthSource, SampleFn};
pub use error::PerceptionError;
pub use map::{OccupancyGrid, OccupancyGridBuilder};
pub use projection::{AxisMarginalProjector, Cube, MarginalProjection, ScalarCube};
