use rayon::prelude::*;

use crate::config::Feedback;
use crate::grid::Grid;
use crate::kernel::{DistalWindow, Kernel};
use crate::transition::Density;

/// How the halo around the grid is filled before convolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    /// Halo cells are absent: they add neither activity nor weight, so
    /// edge cells are normalized by the part of the kernel that fits.
    ZeroPad,
    /// The halo columns left and right of the grid are present and active,
    /// emulating a source region that continues past the edge. Halo rows
    /// above and below stay absent.
    SourceColumns,
}

impl Boundary {
    pub fn for_feedback(feedback: &Feedback) -> Self {
        match feedback {
            Feedback::Isotropic { .. } => Boundary::ZeroPad,
            Feedback::Distal { .. } => Boundary::SourceColumns,
        }
    }

    #[inline]
    fn halo(self, y: i64, n: usize) -> f32 {
        match self {
            Boundary::ZeroPad => 0.0,
            Boundary::SourceColumns if y >= 0 && y < n as i64 => 1.0,
            Boundary::SourceColumns => 0.0,
        }
    }
}

/// Square field of side `n + 2r` with the grid in the middle.
struct Padded {
    data: Vec<f32>,
    pw: usize,
}

fn padded(n: usize, r: usize, boundary: Boundary, inside: impl Fn(usize, usize) -> f32 + Sync) -> Padded {
    let pw = n + 2 * r;
    let mut data = vec![0.0f32; pw * pw];
    data.par_chunks_mut(pw).enumerate().for_each(|(py, row)| {
        let y = py as i64 - r as i64;
        for (px, v) in row.iter_mut().enumerate() {
            let x = px as i64 - r as i64;
            *v = if y >= 0 && y < n as i64 && x >= 0 && x < n as i64 {
                inside(x as usize, y as usize)
            } else {
                boundary.halo(y, n)
            };
        }
    });
    Padded { data, pw }
}

/// Weighted sum over the window for every cell of an `n` x `n` grid.
///
/// Each non-zero tap adds a shifted contiguous row of the padded field into
/// the output row, so the inner loop is a plain slice axpy.
fn convolve(src: &Padded, n: usize, weights: &Grid<f32>) -> Grid<f32> {
    let taps: Vec<(usize, usize, f32)> = (0..weights.h)
        .flat_map(|ky| (0..weights.w).map(move |kx| (kx, ky)))
        .filter_map(|(kx, ky)| {
            let w = weights.get(kx, ky);
            (w != 0.0).then_some((kx, ky, w))
        })
        .collect();

    let mut out = Grid::<f32>::square(n);
    out.data.par_chunks_mut(n).enumerate().for_each(|(y, row)| {
        for &(kx, ky, w) in &taps {
            let start = (y + ky) * src.pw + kx;
            let line = &src.data[start..start + n];
            for (o, &v) in row.iter_mut().zip(line) {
                *o += w * v;
            }
        }
    });
    out
}

/// Kernel, optional distal window and boundary policy, plus the per-cell
/// valid-weight divisor, which depends only on geometry.
pub struct Neighborhood {
    n: usize,
    kernel: Kernel,
    window: Option<DistalWindow>,
    boundary: Boundary,
    divisor: Grid<f32>,
}

impl Neighborhood {
    pub fn new(n: usize, kernel: Kernel, window: Option<DistalWindow>, boundary: Boundary) -> Self {
        let r = kernel.radius();
        let presence = padded(n, r, boundary, |_, _| 1.0);
        let divisor = convolve(&presence, n, kernel.weights());
        Self {
            n,
            kernel,
            window,
            boundary,
            divisor,
        }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn divisor(&self) -> &Grid<f32> {
        &self.divisor
    }

    fn pad(&self, grid: &Grid<bool>) -> Padded {
        debug_assert_eq!(grid.w, self.n);
        padded(self.n, self.kernel.radius(), self.boundary, |x, y| {
            if grid.get(x, y) { 1.0 } else { 0.0 }
        })
    }

    fn activity_from(&self, src: &Padded) -> Grid<f32> {
        let mut sum = convolve(src, self.n, self.kernel.weights());
        sum.data
            .par_iter_mut()
            .zip(self.divisor.data.par_iter())
            .for_each(|(s, &d)| {
                *s = if d > 0.0 { *s / d } else { 0.0 };
            });
        sum
    }

    fn density_from(&self, src: &Padded, window: &DistalWindow) -> Grid<f32> {
        let mut count = convolve(src, self.n, window.mask());
        let total = window.total();
        count.data.par_iter_mut().for_each(|c| *c /= total);
        count
    }

    /// Kernel-weighted share of active neighbors, edge-corrected.
    pub fn activity(&self, grid: &Grid<bool>) -> Grid<f32> {
        self.activity_from(&self.pad(grid))
    }

    /// Share of active cells under the distal window; None without one.
    pub fn local_density(&self, grid: &Grid<bool>) -> Option<Grid<f32>> {
        let window = self.window.as_ref()?;
        Some(self.density_from(&self.pad(grid), window))
    }

    /// Activity plus the density estimate the transition model compares
    /// against: the global cover, or the local field in distal mode.
    pub fn estimate(&self, grid: &Grid<bool>) -> (Grid<f32>, Density) {
        let src = self.pad(grid);
        let activity = self.activity_from(&src);
        let density = match &self.window {
            Some(window) => Density::Local(self.density_from(&src, window)),
            None => Density::Global(grid.cover()),
        };
        (activity, density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Decay;
    use crate::kernel::{distal_kernel, isotropic_kernel};
    use crate::rng::{field_seed, uniform};

    fn pareto_kernel(n: usize) -> Kernel {
        isotropic_kernel(n, &Decay::Pareto { k: 2.0, dmin: 1.0 }, 1.0, 0.8).unwrap()
    }

    fn random_grid(n: usize, seed: u64) -> Grid<bool> {
        let f = field_seed(seed, 0, 0);
        let mut g = Grid::<bool>::square(n);
        for (i, v) in g.data.iter_mut().enumerate() {
            *v = uniform(f, i) < 0.4;
        }
        g
    }

    #[test]
    fn test_uniform_grids_are_flat() {
        let n = 24;
        let kernel = pareto_kernel(n);
        let mass = kernel.mass() as f32;
        let r = kernel.radius();
        let nb = Neighborhood::new(n, kernel, None, Boundary::ZeroPad);

        // Interior cells see the whole kernel; corners keep less than half
        let mid = nb.divisor().get(n / 2, n / 2);
        assert!((mid - mass).abs() < 1e-4 * mass);
        let corner = nb.divisor().get(0, 0);
        assert!(corner < 0.5 * mass && corner > 0.0);
        assert!(r < n / 2);

        let mut full = Grid::<bool>::square(n);
        full.data.fill(true);
        for &a in &nb.activity(&full).data {
            assert!((a - 1.0).abs() < 1e-5, "edge-corrected activity {}", a);
        }

        let empty = Grid::<bool>::square(n);
        assert!(nb.activity(&empty).data.iter().all(|&a| a == 0.0));
    }

    #[test]
    fn test_single_cell_spreads_kernel_weight() {
        let n = 21;
        let kernel = pareto_kernel(n);
        let mass = kernel.mass() as f32;
        let w10 = kernel.weight(1, 0);
        let nb = Neighborhood::new(n, kernel, None, Boundary::ZeroPad);

        let mut g = Grid::<bool>::square(n);
        g.set(10, 10, true);
        let act = nb.activity(&g);
        assert_eq!(act.get(10, 10), 0.0);
        assert!((act.get(11, 10) - w10 / mass).abs() < 1e-6);
        assert!((act.get(10, 9) - w10 / mass).abs() < 1e-6);
    }

    #[test]
    fn test_matches_direct_neighbor_sum() {
        let n = 17;
        let kernel = isotropic_kernel(n, &Decay::Exponential { k: 0.6 }, 1.7, 0.9).unwrap();
        let r = kernel.radius() as i64;
        let grid = random_grid(n, 9);
        let nb = Neighborhood::new(n, kernel.clone(), None, Boundary::ZeroPad);
        let act = nb.activity(&grid);

        for y in 0..n {
            for x in 0..n {
                let (mut on, mut valid) = (0.0f64, 0.0f64);
                for dy in -r..=r {
                    for dx in -r..=r {
                        let Some(v) = grid.get_checked(x as i64 + dx, y as i64 + dy) else {
                            continue;
                        };
                        let w = kernel.weight(dx, dy) as f64;
                        valid += w;
                        if v {
                            on += w;
                        }
                    }
                }
                let expected = if valid > 0.0 { on / valid } else { 0.0 };
                assert!(
                    (act.get(x, y) as f64 - expected).abs() < 1e-5,
                    "({}, {}): {} vs {}",
                    x,
                    y,
                    act.get(x, y),
                    expected
                );
            }
        }
    }

    #[test]
    fn test_source_columns_feed_edges() {
        let n = 30;
        let decay = Decay::Exponential { k: 0.5 };
        let kernel = distal_kernel(n, &decay, 1.0, 4.0, 1.0, 1.0).unwrap();
        let window = DistalWindow::new(kernel.radius(), kernel.cutoff());
        let nb = Neighborhood::new(n, kernel, Some(window), Boundary::SourceColumns);

        let empty = Grid::<bool>::square(n);
        let act = nb.activity(&empty);
        let dens = nb.local_density(&empty).unwrap();
        assert!(act.get(0, 15) > 0.3);
        assert!(act.get(n - 1, 15) > 0.3);
        assert_eq!(act.get(15, 15), 0.0);
        assert!(dens.get(0, 15) > 0.0);
        assert_eq!(dens.get(15, 0), 0.0);
        // Rows are not sources
        assert_eq!(act.get(15, 0), 0.0);
    }

    #[test]
    fn test_estimate_density_kind() {
        let n = 20;
        let grid = random_grid(n, 3);
        let nb = Neighborhood::new(n, pareto_kernel(n), None, Boundary::ZeroPad);
        let (_, density) = nb.estimate(&grid);
        match density {
            Density::Global(d) => assert!((d - grid.cover()).abs() < 1e-6),
            Density::Local(_) => panic!("isotropic family uses the global cover"),
        }
        assert!(nb.local_density(&grid).is_none());
    }
}
