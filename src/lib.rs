pub mod automaton;
pub mod config;
pub mod convolve;
pub mod degrade;
pub mod error;
pub mod grid;
pub mod kernel;
pub mod patches;
pub mod render;
pub mod rng;
pub mod transition;

use std::time::Instant;

use automaton::{Observer, Simulation};
use config::Params;
use error::ConfigError;
use grid::Grid;
use kernel::Kernel;
use patches::{Labels, PatchStats};

pub struct Landscape {
    pub nx: usize,
    /// Final grid, after degradation.
    pub grid: Grid<bool>,
    /// Cover at the end of the iteration loop, before degradation.
    pub converged_cover: f32,
    /// Cover after each iteration.
    pub cover_trace: Vec<f32>,
    pub labels: Labels,
    pub stats: PatchStats,
    pub kernel: Kernel,
    pub rgba: Vec<u8>,
}

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

pub fn generate(
    seed: u64,
    params: &Params,
    observer: &mut Observer,
) -> Result<(Landscape, Vec<Timing>), ConfigError> {
    let mut timings = Vec::new();
    let total_start = Instant::now();

    // 1. Kernel, neighborhood divisor and random start
    let t = Instant::now();
    let mut sim = Simulation::new(seed, params)?;
    timings.push(Timing {
        name: "kernel",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Iterate the automaton
    let t = Instant::now();
    let reports = sim.run(observer);
    let converged_cover = sim.cover();
    log::info!(
        "{} iterations done, cover {:.4} (target {:.4})",
        reports.len(),
        converged_cover,
        params.ft
    );
    timings.push(Timing {
        name: "simulate",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 3. One-shot degradation
    let t = Instant::now();
    let kernel = sim.kernel().clone();
    let converged = sim.into_grid();
    let grid = if params.a_degradation > 0.0 || params.s_degradation > 0.0 {
        let (grid, report) =
            degrade::degrade(&converged, params.a_degradation, params.s_degradation, seed);
        log::info!(
            "degradation removed {} and added {} cells",
            report.removed,
            report.added
        );
        grid
    } else {
        converged
    };
    timings.push(Timing {
        name: "degrade",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 4. Patch statistics
    let t = Instant::now();
    let (labels, stats) = PatchStats::compute(&grid);
    log::info!(
        "{} patches, largest {}",
        labels.count,
        stats.largest().map_or(0, |p| p.area)
    );
    timings.push(Timing {
        name: "patches",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 5. Render
    let t = Instant::now();
    let rgba = render::render_landscape(&grid);
    timings.push(Timing {
        name: "render",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    timings.push(Timing {
        name: "TOTAL",
        ms: total_ms,
    });

    let landscape = Landscape {
        nx: params.nx,
        grid,
        converged_cover,
        cover_trace: reports.iter().map(|r| r.cover).collect(),
        labels,
        stats,
        kernel,
        rgba,
    };

    Ok((landscape, timings))
}
