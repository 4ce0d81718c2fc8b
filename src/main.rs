mod config;
mod scene;

use anyhow::Context;
use aurus_occupancy::{
    AxisMarginalProjector, CoverageDensityRenderer, DepthMatrixBuilder, OccupancyGrid,
    OccupancyGridBuilder,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_CONFIG_PATH, load_settings};
use crate::scene::SyntheticScene;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let settings = load_settings(&config_path)
        .with_context(|| format!("loading settings from {}", config_path))?;
    settings.grid.validate().context("invalid grid settings")?;
    settings.density.validate().context("invalid density settings")?;

    let mut rng = match settings.scene.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let scene = SyntheticScene::generate(&settings.grid, &settings.scene, &mut rng)
        .context("invalid scene settings")?;
    info!(
        width = settings.grid.width,
        height = settings.grid.height,
        obstacles = scene.obstacles().len(),
        "Depth frame ready"
    );

    // Text-based representation of the frame, one line per band of rows
    let renderer = CoverageDensityRenderer::new(settings.density)
        .context("invalid density settings")?;
    renderer
        .render_with(&scene, |line| println!("{}", line))
        .context("rendering coverage density")?;

    let matrix = DepthMatrixBuilder::new(&settings.grid)
        .context("invalid grid settings")?
        .build(&scene)
        .context("sampling depth frame")?;
    if matrix.invalid_count() > 0 {
        warn!(invalid = matrix.invalid_count(), "Depth frame has pixels without a return");
    }

    let grid = OccupancyGridBuilder::new(settings.grid)
        .context("invalid grid settings")?
        .build(&matrix)
        .context("building occupancy grid")?;
    info!(
        shape = ?grid.shape(),
        occupied = grid.occupied_count(),
        total = grid.total_cells(),
        "Occupancy grid built"
    );
    report_center_clearance(&grid)?;

    let projection = AxisMarginalProjector::new(settings.projection.normalize).project(&grid);
    let [xy, xz, yz] = projection.shapes();
    info!(?xy, ?xz, ?yz, totals = ?projection.totals(), "Marginal projections ready");

    Ok(())
}

/// Logs the nearest blocked depth along the center row of the frame.
fn report_center_clearance(grid: &OccupancyGrid) -> anyhow::Result<()> {
    let y = grid.height() / 2;
    let mut nearest: Option<usize> = None;
    for x in 0..grid.width() {
        if let Some(k) = grid.nearest_occupied_bin(y, x)? {
            nearest = Some(nearest.map_or(k, |n| n.min(k)));
        }
    }

    match nearest {
        Some(k) => info!(row = y, distance = grid.bin_near_edge(k), "Center row blocked"),
        None => info!(row = y, "Center row clear to the scan limit"),
    }
    Ok(())
}
