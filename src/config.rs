use aurus_occupancy::{DensityConfig, GridConfig};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Settings for the whole perception run, loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub grid: GridConfig,
    pub density: DensityConfig,
    #[serde(default)]
    pub projection: ProjectionSettings,
    pub scene: SceneSettings,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProjectionSettings {
    /// Average instead of summing along each axis
    #[serde(default)]
    pub normalize: bool,
}

/// Parameters of the simulated depth frame.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneSettings {
    /// Fixed seed for a reproducible frame; a fresh OS seed is used when absent
    pub seed: Option<u64>,
    pub obstacles: usize,
    /// Largest obstacle side in pixels
    pub max_obstacle_size: usize,
    pub wall_distance: f32,
    pub min_obstacle_distance: f32,
    pub max_obstacle_distance: f32,
    /// Fraction of pixels without a return
    pub dropout_ratio: f64,
}

/// Loads settings from `path`, letting `AURUS__SECTION__KEY` variables override file values.
pub fn load_settings(path: &str) -> Result<Settings, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix("AURUS")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}
