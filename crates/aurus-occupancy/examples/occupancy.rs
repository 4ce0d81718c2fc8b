use aurus_occupancy::{
    AxisMarginalProjector, CoverageDensityRenderer, DensityConfig, DepthMatrixBuilder,
    GridConfig, OccupancyGridBuilder, SampleFn,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A 40x64 frame looking at a wall 0.8m away, with a box 0.35m away in the
    // middle and a strip of dropout pixels along the left edge.
    let config = GridConfig::new(40, 64, 0.1, 1.0)?;
    let source = SampleFn::new(64, 40, |x, y| {
        let distance = if x < 2 {
            0.0
        } else if (24..40).contains(&x) && (10..30).contains(&y) {
            0.35
        } else {
            0.8
        };
        Ok::<f32, std::convert::Infallible>(distance)
    });

    println!("Coverage density (samples nearer than 0.5m):");
    let renderer = CoverageDensityRenderer::new(DensityConfig::new(0.5)?)?;
    renderer.render_with(&source, |line| println!("|{}|", line))?;

    let matrix = DepthMatrixBuilder::new(&config)?.build(&source)?;
    let grid = OccupancyGridBuilder::new(config)?.build(&matrix)?;
    println!(
        "\nOccupancy grid: {:?} cells, {} occupied",
        grid.shape(),
        grid.occupied_count()
    );

    for (y, x) in [(0, 0), (20, 30), (20, 50)] {
        match grid.nearest_occupied_bin(y, x)? {
            Some(k) => println!(
                "Pixel ({}, {}) blocked from {:.2}m",
                y,
                x,
                grid.bin_near_edge(k)
            ),
            None => println!("Pixel ({}, {}) clear to the scan limit", y, x),
        }
    }

    println!("\nLayer K=3 (0.30m):");
    print!("{}", grid.layer_ascii(3)?);

    let projection = AxisMarginalProjector::new(false).project(&grid);
    println!("\nProjection shapes (xy, xz, yz): {:?}", projection.shapes());
    println!("Projection totals: {:?}", projection.totals());

    Ok(())
}
