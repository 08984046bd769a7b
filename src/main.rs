use std::path::{Path, PathBuf};

use serde::Serialize;

use patchgen::automaton::Observer;
use patchgen::config::Params;
use patchgen::grid::Grid;
use patchgen::patches::PatchStats;
use patchgen::render;

#[derive(Serialize)]
struct SavedGrid {
    landscape: Vec<Vec<bool>>,
}

#[derive(Serialize)]
struct SavedStats<'a> {
    seed: u64,
    converged_cover: f32,
    final_cover: f32,
    fractal_dimension: Option<f64>,
    #[serde(flatten)]
    stats: &'a PatchStats,
}

fn save_png(path: &Path, rgba: &[u8], w: usize, h: usize) -> Result<(), image::ImageError> {
    image::save_buffer(path, rgba, w as u32, h as u32, image::ColorType::Rgba8)?;
    log::info!("Saved {}", path.display());
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let seed: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(42);
    let params = match args.get(2).map(String::as_str) {
        Some(path) if path != "-" => Params::from_json_file(path)?,
        _ => Params::default(),
    };
    let out_dir: PathBuf = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts"));

    let frames_dir = out_dir.join("frames");
    std::fs::create_dir_all(&frames_dir)?;

    log::info!(
        "Simulating {}x{} landscape with seed={}, ft={}, tamount={}, {} iterations",
        params.nx,
        params.nx,
        seed,
        params.ft,
        params.tamount,
        params.iterations
    );

    let mut write_frame = |iteration: usize, grid: &Grid<bool>| {
        let path = frames_dir.join(format!("frame_{:05}.png", iteration));
        if let Err(e) = save_png(&path, &render::render_landscape(grid), grid.w, grid.h) {
            log::warn!("frame {} not written: {}", iteration, e);
        }
    };
    let mut observer = Observer::Frame {
        every: params.frame_interval,
        callback: &mut write_frame,
    };

    let (landscape, timings) = patchgen::generate(seed, &params, &mut observer)?;

    // Print timings
    eprintln!("\nTimings:");
    for t in &timings {
        eprintln!("  {:20} {:8.1} ms", t.name, t.ms);
    }

    let nx = landscape.nx;
    save_png(&out_dir.join("landscape.png"), &landscape.rgba, nx, nx)?;
    save_png(
        &out_dir.join("patches.png"),
        &render::render_patches(&landscape.labels.labels),
        nx,
        nx,
    )?;
    let (kernel_rgba, side) = render::render_kernel(&landscape.kernel, 8);
    save_png(&out_dir.join("kernel.png"), &kernel_rgba, side, side)?;

    let grid_path = out_dir.join("landscape.json");
    let saved = SavedGrid {
        landscape: landscape.grid.to_rows(),
    };
    std::fs::write(&grid_path, serde_json::to_string(&saved)?)?;
    log::info!("Saved {}", grid_path.display());

    let stats_path = out_dir.join("stats.json");
    let saved = SavedStats {
        seed,
        converged_cover: landscape.converged_cover,
        final_cover: landscape.grid.cover(),
        fractal_dimension: landscape.stats.fractal_dimension(),
        stats: &landscape.stats,
    };
    std::fs::write(&stats_path, serde_json::to_string_pretty(&saved)?)?;
    log::info!("Saved {}", stats_path.display());

    eprintln!(
        "\n{} patches, cover {:.4}. Done.",
        landscape.labels.count,
        landscape.grid.cover()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
