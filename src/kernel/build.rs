use crate::config::Decay;
use crate::error::ConfigError;
use crate::grid::Grid;

use super::decay::{finite_or_zero, scaled_distance};

/// Odd-sized square weight matrix centered on the origin cell.
///
/// The center is always zero, weights are mirror-symmetric in both axes and
/// vanish beyond `cutoff` (in cells, under the anisotropic metric).
#[derive(Clone, Debug)]
pub struct Kernel {
    weights: Grid<f32>,
    radius: usize,
    cutoff: f32,
}

impl Kernel {
    /// Half-width; the window is `2 * radius + 1` wide.
    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn size(&self) -> usize {
        2 * self.radius + 1
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn weights(&self) -> &Grid<f32> {
        &self.weights
    }

    /// Weight at offset (dx, dy) from the center; zero outside the window.
    pub fn weight(&self, dx: i64, dy: i64) -> f32 {
        let r = self.radius as i64;
        self.weights.get_checked(dx + r, dy + r).unwrap_or(0.0)
    }

    pub fn mass(&self) -> f64 {
        self.weights.data.iter().map(|&w| w as f64).sum()
    }
}

/// Smallest sampled distance whose cumulative decay mass reaches
/// `fraction` of the mass over the whole `nx` x `nx` quadrant field.
/// Decays without a finite total mass are rejected.
pub fn truncation_radius(
    nx: usize,
    decay: &Decay,
    anisotropy: f32,
    fraction: f32,
) -> Result<f32, ConfigError> {
    if !decay.has_finite_mass() {
        return Err(ConfigError::DegenerateKernel(format!(
            "{:?} has unbounded mass; no fraction of it gives a finite radius",
            decay
        )));
    }
    let mut samples: Vec<(f32, f64)> = Vec::with_capacity(nx * nx);
    for dy in 0..nx {
        for dx in 0..nx {
            if dx == 0 && dy == 0 {
                continue;
            }
            let d = scaled_distance(dx as f32, dy as f32, anisotropy);
            let w = finite_or_zero(decay.weight(d)) as f64;
            // Each quadrant sample stands for its mirror images
            let mult = (if dx == 0 { 1.0 } else { 2.0 }) * (if dy == 0 { 1.0 } else { 2.0 });
            samples.push((d, w * mult));
        }
    }

    let total: f64 = samples.iter().map(|s| s.1).sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(ConfigError::DegenerateKernel(format!(
            "{:?} has no finite mass within a {}x{} grid",
            decay, nx, nx
        )));
    }

    samples.sort_by(|a, b| a.0.total_cmp(&b.0));
    let target = fraction as f64 * total;
    let mut acc = 0.0;
    for &(d, w) in &samples {
        acc += w;
        if acc >= target {
            return Ok(d);
        }
    }
    // Rounding left the target a hair above the summed mass
    Ok(samples.last().map_or(0.0, |s| s.0))
}

fn half_width(nx: usize, cutoff: f32, anisotropy: f32) -> Result<usize, ConfigError> {
    if !(cutoff.is_finite() && cutoff > 0.0) {
        return Err(ConfigError::DegenerateKernel(format!(
            "cutoff radius {} is not a positive finite distance",
            cutoff
        )));
    }
    let r = (cutoff * anisotropy.max(1.0)).ceil() as usize;
    if r >= nx {
        return Err(ConfigError::DegenerateKernel(format!(
            "cutoff radius {} needs a half-width of {} cells, beyond a {}x{} grid",
            cutoff, r, nx, nx
        )));
    }
    if r == 0 {
        return Err(ConfigError::DegenerateKernel(format!(
            "cutoff radius {} yields a 1x1 window",
            cutoff
        )));
    }
    Ok(r)
}

/// Fill one quadrant and mirror it across both axes.
/// `scale` converts cell distances to the units the decay expects.
fn mirrored(radius: usize, cutoff: f32, anisotropy: f32, scale: f32, decay: &Decay) -> Grid<f32> {
    let size = 2 * radius + 1;
    let mut g = Grid::<f32>::square(size);
    for dy in 0..=radius {
        for dx in 0..=radius {
            if dx == 0 && dy == 0 {
                continue;
            }
            let d = scaled_distance(dx as f32, dy as f32, anisotropy);
            if d > cutoff {
                continue;
            }
            let w = finite_or_zero(decay.weight(d * scale));
            for (sx, sy) in [(1i64, 1i64), (-1, 1), (1, -1), (-1, -1)] {
                let x = (radius as i64 + sx * dx as i64) as usize;
                let y = (radius as i64 + sy * dy as i64) as usize;
                g.set(x, y, w);
            }
        }
    }
    g
}

fn checked(weights: Grid<f32>, radius: usize, cutoff: f32) -> Result<Kernel, ConfigError> {
    let kernel = Kernel {
        weights,
        radius,
        cutoff,
    };
    let mass = kernel.mass();
    if !(mass.is_finite() && mass > 0.0) {
        return Err(ConfigError::DegenerateKernel(format!(
            "kernel mass {} within radius {}",
            mass, radius
        )));
    }
    Ok(kernel)
}

/// Cumulative-mass kernel: keeps `neighb_fraction` of the decay mass.
pub fn isotropic_kernel(
    nx: usize,
    decay: &Decay,
    anisotropy: f32,
    neighb_fraction: f32,
) -> Result<Kernel, ConfigError> {
    let cutoff = truncation_radius(nx, decay, anisotropy, neighb_fraction)?;
    let radius = half_width(nx, cutoff, anisotropy)?;
    let weights = mirrored(radius, cutoff, anisotropy, 1.0, decay);
    checked(weights, radius, cutoff)
}

/// Explicit-radius kernel for the distal family. The central column is
/// scaled by `upstream`, then the whole kernel is rescaled to its prior mass.
pub fn distal_kernel(
    nx: usize,
    decay: &Decay,
    anisotropy: f32,
    cutoff_radius: f32,
    cell_size: f32,
    upstream: f32,
) -> Result<Kernel, ConfigError> {
    let cutoff = cutoff_radius / cell_size;
    let radius = half_width(nx, cutoff, anisotropy)?;
    let mut weights = mirrored(radius, cutoff, anisotropy, cell_size, decay);

    let before: f64 = weights.data.iter().map(|&w| w as f64).sum();
    for y in 0..weights.h {
        let w = weights.get(radius, y);
        weights.set(radius, y, w * upstream);
    }
    let after: f64 = weights.data.iter().map(|&w| w as f64).sum();
    if after > 0.0 && before.is_finite() {
        let rescale = (before / after) as f32;
        for w in &mut weights.data {
            *w *= rescale;
        }
    }
    checked(weights, radius, cutoff)
}
