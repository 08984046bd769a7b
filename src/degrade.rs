use rayon::prelude::*;

use crate::grid::Grid;
use crate::rng::{SALT_ADD, SALT_SUBTRACT, field_seed, uniform};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DegradationReport {
    pub removed: usize,
    pub added: usize,
}

/// One-shot perturbation of a converged grid.
///
/// Subtractive degradation clears an active cell with probability
/// `a_degradation`; additive degradation sets an inactive cell with
/// probability `s_degradation`. Both read the same base grid and the result
/// is active wherever either survivor or newcomer is.
///
/// A cell is never hit by both: clearing only draws on active cells and
/// planting only on inactive ones.
pub fn degrade(
    grid: &Grid<bool>,
    a_degradation: f32,
    s_degradation: f32,
    seed: u64,
) -> (Grid<bool>, DegradationReport) {
    let sub = field_seed(seed, SALT_SUBTRACT, 0);
    let add = field_seed(seed, SALT_ADD, 0);

    let (data, report): (Vec<bool>, Vec<(bool, bool)>) = grid
        .data
        .par_iter()
        .enumerate()
        .map(|(i, &base)| {
            let cleared = base && uniform(sub, i) < a_degradation;
            let kept = base && !cleared;
            let planted = !base && uniform(add, i) < s_degradation;
            ((kept as u8 + planted as u8) > 0, (cleared, planted))
        })
        .unzip();

    let removed = report.iter().filter(|r| r.0).count();
    let added = report.iter().filter(|r| r.1).count();
    let out = Grid {
        data,
        w: grid.w,
        h: grid.h,
    };
    (out, DegradationReport { removed, added })
}
