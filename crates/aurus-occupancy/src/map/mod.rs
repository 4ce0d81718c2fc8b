//! Map-related functionality for obstacle perception.
//!
//! This module provides the per-pixel depth occupancy grid and the builder that
//! derives it from a depth matrix.

pub mod occupancy;

pub use occupancy::{OccupancyGrid, OccupancyGridBuilder};
