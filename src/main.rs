use fovgrid::{
    FovCalculation, FovEngine, Generator, Grid, InteractiveViewer, RadiusShape, RandomRoomsStep,
    RandomWalkStep, TRANSPARENCY_TAG, ViewerConfig,
};

fn main() {
    env_logger::init();

    // Check for command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--interactive" {
        run_interactive();
    } else if args.len() > 1 && args[1] == "--benchmark" {
        run_benchmark();
    } else if args.len() > 1 && args[1] == "--demo" {
        run_demo();
    } else {
        println!("FOV Grid");
        println!("Run with --interactive for minifb viewer");
        println!("Run with --benchmark to test performance");
        println!("Run with --demo for a text-mode walkthrough");
    }
}

fn run_benchmark() {
    use rayon::prelude::*;
    use std::sync::Arc;
    use std::time::Instant;

    println!("=== Shadowcasting Benchmark ===\n");

    // Test parameters
    let sizes = [(50, 50), (100, 100), (200, 200)];
    let iterations = 20;

    for (width, height) in sizes {
        println!("Grid size: {}x{}", width, height);
        println!("-----------------------");

        let transparency = Arc::new(Grid::new(width, height, true));
        let origin = (width / 2, height / 2);
        let radius = (width / 2) as f64;

        let mut engine = FovEngine::new(Arc::clone(&transparency));
        let start = Instant::now();
        for _ in 0..iterations {
            engine
                .calculate(FovCalculation::new(origin).radius(radius))
                .expect("origin is inside the grid");
        }
        let elapsed = start.elapsed();
        let avg_ms = elapsed.as_secs_f64() * 1000.0 / iterations as f64;

        println!("  Fresh calculate: {:.3} ms/iter", avg_ms);
        println!("  Visible cells:   {}", engine.current_fov().count());
        println!();
    }

    // Benchmark the 4-source scenario (several lights on one map)
    println!("=== 4-Source Scenario ===");
    println!("(Four lights merged into one field of view)\n");

    let (width, height) = (100usize, 100usize);
    let iterations = 20;
    let transparency = Arc::new(Grid::new(width, height, true));
    let radius = 30.0;
    let sources = [(20, 20), (80, 20), (20, 80), (80, 80)];

    // Sequential: one engine, appends compose via max-merge
    let mut engine = FovEngine::new(Arc::clone(&transparency));
    let start = Instant::now();
    for _ in 0..iterations {
        engine.reset();
        for &source in &sources {
            engine
                .calculate_append(FovCalculation::new(source).radius(radius))
                .expect("sources are inside the grid");
        }
    }
    let elapsed_sequential = start.elapsed();
    let avg_sequential_ms = elapsed_sequential.as_secs_f64() * 1000.0 / iterations as f64;

    // Parallel: independent engines share the transparency grid read-only,
    // results merged with max afterwards
    let start = Instant::now();
    for _ in 0..iterations {
        let results: Vec<_> = sources
            .par_iter()
            .map(|&source| {
                let mut engine = FovEngine::new(Arc::clone(&transparency));
                engine
                    .calculate(FovCalculation::new(source).radius(radius))
                    .expect("sources are inside the grid");
                engine.result_view().clone()
            })
            .collect();

        let mut merged = Grid::new(width, height, 0.0f64);
        for result in &results {
            for (x, y) in merged.positions() {
                let value = result.at(x, y);
                if value > merged.at(x, y) {
                    merged.set(x, y, value);
                }
            }
        }
    }
    let elapsed_parallel = start.elapsed();
    let avg_parallel_ms = elapsed_parallel.as_secs_f64() * 1000.0 / iterations as f64;

    let speedup = avg_sequential_ms / avg_parallel_ms;

    println!("Grid size: {}x{}, 4 sources", width, height);
    println!("-----------------------");
    println!("  Sequential (one engine):   {:.3} ms/iter", avg_sequential_ms);
    println!("  Parallel (rayon + merge):  {:.3} ms/iter", avg_parallel_ms);
    println!("  Speedup: {:.2}x", speedup);
}

fn run_demo() {
    use std::sync::Arc;

    println!("=== FOV Demo ===\n");

    let context = match Generator::new(40, 20)
        .add_step(RandomRoomsStep::new(5, 4, 8))
        .add_step(RandomWalkStep::new(300))
        .generate()
    {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Map generation failed: {e}");
            return;
        }
    };
    let transparency = match context.get_tagged::<Grid<bool>>(TRANSPARENCY_TAG) {
        Some(grid) => Arc::new(grid.clone()),
        None => {
            eprintln!("Generator produced no transparency grid");
            return;
        }
    };

    let mut engine = FovEngine::new(transparency);
    engine.on_recalculated(|calc| {
        println!(
            "[event] recalculated: origin=({}, {}) radius={} shape={:?}",
            calc.origin.0, calc.origin.1, calc.radius, calc.shape
        );
    });
    engine.on_reset(|| println!("[event] visibility reset"));

    let origin = (20, 10);
    if let Err(e) = engine.calculate(
        FovCalculation::new(origin)
            .radius(8.0)
            .shape(RadiusShape::Circle),
    ) {
        eprintln!("Calculation rejected: {e}");
        return;
    }

    println!("\nVisibility from ({}, {}):", origin.0, origin.1);
    println!("{}", engine);

    println!("Intensities (2 decimal places):");
    println!("{}", engine.to_intensity_string(2));

    println!("Visible cells: {}", engine.current_fov().count());
}

fn run_interactive() {
    let config = ViewerConfig::default();

    match InteractiveViewer::new(config) {
        Ok(mut viewer) => {
            if let Err(e) = viewer.run() {
                eprintln!("Error: {}", e);
            }
        }
        Err(e) => {
            eprintln!("Failed to create viewer: {}", e);
        }
    }
}
