use rayon::prelude::*;

use crate::config::Params;
use crate::convolve::{Boundary, Neighborhood};
use crate::error::ConfigError;
use crate::grid::Grid;
use crate::kernel::{self, Kernel};
use crate::rng::{SALT_ACCEPT, SALT_GATE, SALT_INIT, field_seed, uniform};
use crate::transition::{Odds, probabilities};

/// Outcome for one cell in one iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Activate,
    Deactivate,
}

/// Gate on `tamount` with `r1`, then accept with `r2` against the odds that
/// apply to the cell's current state. Activation is only reachable from an
/// inactive cell and deactivation only from an active one.
#[inline]
pub fn decide(active: bool, odds: Odds, tamount: f32, r1: f32, r2: f32) -> Transition {
    let gate = tamount >= r1;
    if active {
        if gate && odds.pto >= r2 {
            Transition::Deactivate
        } else {
            Transition::Stay
        }
    } else if gate && odds.pot >= r2 {
        Transition::Activate
    } else {
        Transition::Stay
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StepReport {
    pub iteration: usize,
    pub activated: usize,
    pub deactivated: usize,
    pub cover: f32,
    pub clamped_cells: usize,
}

/// Receives the grid every `every` iterations. Never feeds back into the run.
pub enum Observer<'a> {
    NoOp,
    Frame {
        every: usize,
        callback: &'a mut dyn FnMut(usize, &Grid<bool>),
    },
}

impl Observer<'_> {
    pub fn notify(&mut self, iteration: usize, grid: &Grid<bool>) {
        if let Observer::Frame { every, callback } = self {
            if *every > 0 && iteration % *every == 0 {
                (*callback)(iteration, grid);
            }
        }
    }
}

/// Random start: each cell active with probability `cover`.
pub fn initial_grid(n: usize, cover: f32, seed: u64) -> Grid<bool> {
    let field = field_seed(seed, SALT_INIT, 0);
    let mut grid = Grid::<bool>::square(n);
    grid.data
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, v)| *v = uniform(field, i) < cover);
    grid
}

/// Simulation state: the current grid plus everything needed to advance it.
pub struct Simulation {
    seed: u64,
    params: Params,
    grid: Grid<bool>,
    neighborhood: Neighborhood,
    iteration: usize,
}

impl Simulation {
    pub fn new(seed: u64, params: &Params) -> Result<Self, ConfigError> {
        params.validate()?;
        let grid = initial_grid(params.nx, params.initial_cover, seed);
        Self::with_grid(seed, params, grid)
    }

    /// Start from an explicit grid, which must be `nx` x `nx`.
    pub fn with_grid(seed: u64, params: &Params, grid: Grid<bool>) -> Result<Self, ConfigError> {
        params.validate()?;
        if grid.w != params.nx || grid.h != params.nx {
            return Err(ConfigError::GridShape {
                expected: params.nx,
                w: grid.w,
                h: grid.h,
            });
        }
        let (kernel, window) = kernel::build(params)?;
        log::info!(
            "kernel: {}x{} window, cutoff {:.2} cells, mass {:.4}",
            kernel.size(),
            kernel.size(),
            kernel.cutoff(),
            kernel.mass()
        );
        let boundary = Boundary::for_feedback(&params.feedback);
        let neighborhood = Neighborhood::new(params.nx, kernel, window, boundary);
        Ok(Self {
            seed,
            params: params.clone(),
            grid,
            neighborhood,
            iteration: 0,
        })
    }

    pub fn grid(&self) -> &Grid<bool> {
        &self.grid
    }

    pub fn into_grid(self) -> Grid<bool> {
        self.grid
    }

    pub fn kernel(&self) -> &Kernel {
        self.neighborhood.kernel()
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn cover(&self) -> f32 {
        self.grid.cover()
    }

    /// Advance one iteration. Every decision reads the previous snapshot and
    /// the new grid replaces it wholesale.
    pub fn step(&mut self) -> StepReport {
        let (activity, density) = self.neighborhood.estimate(&self.grid);
        let probs = probabilities(&activity, &density, self.params.ft);
        if probs.clamped > 0 {
            log::debug!(
                "iteration {}: clamped density in {} cells",
                self.iteration,
                probs.clamped
            );
        }

        let draw = self.iteration as u64;
        let gate = field_seed(self.seed, SALT_GATE, draw);
        let accept = field_seed(self.seed, SALT_ACCEPT, draw);
        let tamount = self.params.tamount;
        let n = self.grid.w;
        let prev = &self.grid;
        let odds = &probs.odds;

        let mut next = Grid::<bool>::square(n);
        let (activated, deactivated) = next
            .data
            .par_chunks_mut(n)
            .enumerate()
            .map(|(y, row)| {
                let (mut on, mut off) = (0usize, 0usize);
                for (x, cell) in row.iter_mut().enumerate() {
                    let i = y * n + x;
                    let active = prev.data[i];
                    *cell = match decide(active, odds[i], tamount, uniform(gate, i), uniform(accept, i)) {
                        Transition::Stay => active,
                        Transition::Activate => {
                            on += 1;
                            true
                        }
                        Transition::Deactivate => {
                            off += 1;
                            false
                        }
                    };
                }
                (on, off)
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        self.grid = next;
        self.iteration += 1;

        let report = StepReport {
            iteration: self.iteration,
            activated,
            deactivated,
            cover: self.grid.cover(),
            clamped_cells: probs.clamped,
        };
        log::trace!(
            "iteration {}: +{} -{} cover {:.4}",
            report.iteration,
            report.activated,
            report.deactivated,
            report.cover
        );
        report
    }

    /// Run the configured number of iterations, notifying the observer.
    pub fn run(&mut self, observer: &mut Observer) -> Vec<StepReport> {
        let total = self.params.iterations;
        let mut reports = Vec::with_capacity(total);
        for _ in 0..total {
            let report = self.step();
            observer.notify(report.iteration, &self.grid);
            if report.iteration % 500 == 0 {
                log::debug!("iteration {}/{}: cover {:.4}", report.iteration, total, report.cover);
            }
            reports.push(report);
        }
        reports
    }
}
