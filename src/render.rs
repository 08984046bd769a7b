use rayon::prelude::*;

use crate::grid::Grid;
use crate::kernel::Kernel;
use crate::rng::splitmix32;

const SOIL: [u8; 4] = [196, 178, 138, 255];
const COVER: [u8; 4] = [52, 112, 58, 255];
const BACKGROUND: [u8; 4] = [24, 24, 28, 255];

/// Active cells as vegetation over bare soil.
pub fn render_landscape(grid: &Grid<bool>) -> Vec<u8> {
    let w = grid.w;
    let mut rgba = vec![0u8; w * grid.h * 4];

    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let color = if grid.get(x, y) { COVER } else { SOIL };
            row[x * 4..x * 4 + 4].copy_from_slice(&color);
        }
    });

    rgba
}

/// Diagnostic: one hashed color per patch label.
pub fn render_patches(labels: &Grid<u32>) -> Vec<u8> {
    let w = labels.w;
    let mut rgba = vec![0u8; w * labels.h * 4];

    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let id = labels.get(x, y);
            let color = if id == 0 {
                BACKGROUND
            } else {
                let h = splitmix32(id.wrapping_mul(7).wrapping_add(123));
                [
                    (h & 0xFF) as u8 | 60,
                    ((h >> 8) & 0xFF) as u8 | 60,
                    ((h >> 16) & 0xFF) as u8 | 60,
                    255,
                ]
            };
            row[x * 4..x * 4 + 4].copy_from_slice(&color);
        }
    });

    rgba
}

/// Diagnostic: grayscale scalar field, normalized to its maximum.
pub fn render_field(field: &Grid<f32>) -> Vec<u8> {
    let max_v = field.data.iter().cloned().filter(|v| v.is_finite()).fold(0.0f32, f32::max);
    let max_v = if max_v > 0.0 { max_v } else { 1.0 };
    let mut rgba = vec![0u8; field.w * field.h * 4];
    for (i, &v) in field.data.iter().enumerate() {
        let g = ((v / max_v).clamp(0.0, 1.0) * 255.0) as u8;
        rgba[i * 4..i * 4 + 4].copy_from_slice(&[g, g, g, 255]);
    }
    rgba
}

/// Kernel weights blown up by `scale` pixels per tap.
pub fn render_kernel(kernel: &Kernel, scale: usize) -> (Vec<u8>, usize) {
    let base = render_field(kernel.weights());
    let k = kernel.size();
    let side = k * scale;
    let mut rgba = vec![0u8; side * side * 4];
    for y in 0..side {
        for x in 0..side {
            let src = ((y / scale) * k + x / scale) * 4;
            let dst = (y * side + x) * 4;
            rgba[dst..dst + 4].copy_from_slice(&base[src..src + 4]);
        }
    }
    (rgba, side)
}
