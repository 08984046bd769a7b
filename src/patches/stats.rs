use serde::Serialize;

use crate::grid::{Grid, OFFSETS4};

use super::label::{Labels, label_patches};

/// Cell count per patch, indexed by `label - 1`.
pub fn patch_areas(labels: &Labels) -> Vec<usize> {
    let mut areas = vec![0usize; labels.count];
    for &id in &labels.labels.data {
        if id > 0 {
            areas[id as usize - 1] += 1;
        }
    }
    areas
}

/// Boundary edges per patch, indexed by `label - 1`: every side of an active
/// cell that faces an inactive cell or the grid edge.
pub fn patch_perimeters(grid: &Grid<bool>, labels: &Labels) -> Vec<usize> {
    let mut perimeters = vec![0usize; labels.count];
    for y in 0..grid.h {
        for x in 0..grid.w {
            if !grid.get(x, y) {
                continue;
            }
            let open = OFFSETS4
                .iter()
                .filter(|(dx, dy)| {
                    !grid
                        .get_checked(x as i64 + dx, y as i64 + dy)
                        .unwrap_or(false)
                })
                .count();
            if open > 0 {
                let id = labels.labels.get(x, y) as usize;
                perimeters[id - 1] += open;
            }
        }
    }
    perimeters
}

/// Complementary CDF of patch areas: for each distinct area `A`, ascending,
/// the fraction of patches with area >= `A`.
pub fn size_ccdf(areas: &[usize]) -> Vec<(usize, f64)> {
    let mut sorted = areas.to_vec();
    sorted.sort_unstable();
    let n = sorted.len() as f64;
    let mut out = Vec::new();
    for (i, &a) in sorted.iter().enumerate() {
        if i > 0 && sorted[i - 1] == a {
            continue;
        }
        out.push((a, (sorted.len() - i) as f64 / n));
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PatchMetrics {
    pub label: u32,
    pub area: usize,
    pub perimeter: usize,
}

/// Everything the plotting side needs from one landscape.
#[derive(Clone, Debug, Serialize)]
pub struct PatchStats {
    pub patches: Vec<PatchMetrics>,
    /// (area, fraction of patches at least that large)
    pub size_ccdf: Vec<(usize, f64)>,
    /// (perimeter, area) per patch
    pub perimeter_area: Vec<(usize, usize)>,
}

impl PatchStats {
    pub fn compute(grid: &Grid<bool>) -> (Labels, Self) {
        let labels = label_patches(grid);
        let stats = Self::from_labels(grid, &labels);
        (labels, stats)
    }

    pub fn from_labels(grid: &Grid<bool>, labels: &Labels) -> Self {
        let areas = patch_areas(labels);
        let perimeters = patch_perimeters(grid, labels);
        let patches: Vec<PatchMetrics> = areas
            .iter()
            .zip(&perimeters)
            .enumerate()
            .map(|(i, (&area, &perimeter))| PatchMetrics {
                label: i as u32 + 1,
                area,
                perimeter,
            })
            .collect();
        let perimeter_area = patches.iter().map(|p| (p.perimeter, p.area)).collect();
        Self {
            size_ccdf: size_ccdf(&areas),
            perimeter_area,
            patches,
        }
    }

    pub fn largest(&self) -> Option<&PatchMetrics> {
        self.patches.iter().max_by_key(|p| p.area)
    }

    /// Perimeter-area fractal dimension: twice the least-squares slope of
    /// ln(perimeter) against ln(area). None with fewer than two distinct areas.
    pub fn fractal_dimension(&self) -> Option<f64> {
        let pts: Vec<(f64, f64)> = self
            .patches
            .iter()
            .filter(|p| p.area > 0 && p.perimeter > 0)
            .map(|p| ((p.area as f64).ln(), (p.perimeter as f64).ln()))
            .collect();
        let n = pts.len() as f64;
        if pts.len() < 2 {
            return None;
        }
        let mx = pts.iter().map(|p| p.0).sum::<f64>() / n;
        let my = pts.iter().map(|p| p.1).sum::<f64>() / n;
        let sxx: f64 = pts.iter().map(|p| (p.0 - mx).powi(2)).sum();
        let sxy: f64 = pts.iter().map(|p| (p.0 - mx) * (p.1 - my)).sum();
        if sxx <= f64::EPSILON {
            return None;
        }
        Some(2.0 * sxy / sxx)
    }
}
