use aurus_occupancy::{DepthSource, GridConfig, PerceptionError};
use rand::Rng;
use tracing::info;

use crate::config::SceneSettings;

/// An axis-aligned box facing the camera at a fixed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub distance: f32,
}

impl Obstacle {
    fn covers(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Simulated depth frame: a back wall, box obstacles in front of it and
/// scattered pixels without a return.
pub struct SyntheticScene {
    width: usize,
    height: usize,
    wall_distance: f32,
    obstacles: Vec<Obstacle>,
    dropout: Vec<bool>,
}

impl SyntheticScene {
    /// Places random obstacles and dropout pixels over the configured frame.
    ///
    /// # Errors
    ///
    /// Returns `Err(PerceptionError::InvalidConfiguration)` if the frame is invalid
    /// or the dropout ratio is not a finite number.
    pub fn generate<R: Rng>(
        grid: &GridConfig,
        settings: &SceneSettings,
        rng: &mut R,
    ) -> Result<Self, PerceptionError> {
        grid.validate()?;
        if !settings.dropout_ratio.is_finite() {
            return Err(PerceptionError::InvalidConfiguration(
                "Dropout ratio must be finite",
            ));
        }
        if !settings.min_obstacle_distance.is_finite() || !settings.max_obstacle_distance.is_finite() {
            return Err(PerceptionError::InvalidConfiguration(
                "Obstacle distances must be finite",
            ));
        }

        let (width, height) = (grid.width, grid.height);
        let max_size = settings.max_obstacle_size.max(1);
        let near = settings.min_obstacle_distance;
        let far = settings.max_obstacle_distance.max(near);

        info!("Generating {} random obstacles...", settings.obstacles);
        let obstacles = (0..settings.obstacles)
            .map(|_| {
                let x = rng.random_range(0..width);
                let y = rng.random_range(0..height);
                Obstacle {
                    x,
                    y,
                    width: rng.random_range(1..=max_size).min(width - x),
                    height: rng.random_range(1..=max_size).min(height - y),
                    distance: if far > near {
                        rng.random_range(near..far)
                    } else {
                        near
                    },
                }
            })
            .collect();

        let dropout_ratio = settings.dropout_ratio.clamp(0.0, 1.0);
        let dropout = (0..width * height)
            .map(|_| rng.random_bool(dropout_ratio))
            .collect();

        Ok(SyntheticScene {
            width,
            height,
            wall_distance: settings.wall_distance,
            obstacles,
            dropout,
        })
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

impl DepthSource for SyntheticScene {
    type Error = PerceptionError;

    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn sample(&self, x: usize, y: usize) -> Result<f32, PerceptionError> {
        if x >= self.width || y >= self.height {
            return Err(PerceptionError::OutOfRangeCoordinate {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        if self.dropout[y * self.width + x] {
            return Ok(0.0);
        }
        // Nearest surface wins where obstacles overlap
        Ok(self
            .obstacles
            .iter()
            .filter(|o| o.covers(x, y))
            .map(|o| o.distance)
            .fold(self.wall_distance, f32::min))
    }
}
