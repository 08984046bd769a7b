use rayon::prelude::*;

use crate::error::NumericDegeneracy;
use crate::grid::Grid;

/// Density the controller steers toward `ft`.
#[derive(Clone, Debug)]
pub enum Density {
    /// Fraction of active cells over the whole grid.
    Global(f32),
    /// Per-cell share of active cells under the distal window.
    Local(Grid<f32>),
}

impl Density {
    #[inline]
    pub fn at(&self, i: usize) -> f32 {
        match self {
            Density::Global(d) => *d,
            Density::Local(field) => field.data[i],
        }
    }
}

/// Pass densities strictly inside (0, 1); anything else would divide by zero.
#[inline]
pub fn guard_density(rho: f32) -> Result<f32, NumericDegeneracy> {
    if rho > 0.0 && rho < 1.0 {
        Ok(rho)
    } else {
        Err(NumericDegeneracy { density: rho })
    }
}

/// Per-cell transition probabilities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Odds {
    /// inactive -> active
    pub pot: f32,
    /// active -> inactive
    pub pto: f32,
}

/// Activity plus a proportional correction pulling the density toward `ft`.
/// `rho` must already be guarded.
#[inline]
pub fn odds(activity: f32, rho: f32, ft: f32) -> Odds {
    Odds {
        pot: activity + (ft - rho) / (1.0 - rho),
        pto: 1.0 - activity + (rho - ft) / rho,
    }
}

pub struct Probabilities {
    pub odds: Vec<Odds>,
    /// Cells whose density had to be clamped away from 0 or 1.
    pub clamped: usize,
}

pub fn probabilities(activity: &Grid<f32>, density: &Density, ft: f32) -> Probabilities {
    let (odds, clamped): (Vec<Odds>, Vec<bool>) = activity
        .data
        .par_iter()
        .enumerate()
        .map(|(i, &a)| {
            let (rho, was_clamped) = match guard_density(density.at(i)) {
                Ok(rho) => (rho, false),
                Err(e) => (e.clamped(), true),
            };
            (odds(a, rho, ft), was_clamped)
        })
        .unzip();
    let clamped = clamped.into_iter().filter(|&c| c).count();
    Probabilities { odds, clamped }
}
