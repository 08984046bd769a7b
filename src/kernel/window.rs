use crate::grid::Grid;

/// Binary mask over the kernel's extent selecting the offsets that feed the
/// local density estimate of the distal family.
#[derive(Clone, Debug)]
pub struct DistalWindow {
    mask: Grid<f32>,
    total: f32,
}

impl DistalWindow {
    /// Marks every offset within `cutoff` cells (isotropic metric) of the
    /// center, the center itself excluded.
    pub fn new(radius: usize, cutoff: f32) -> Self {
        let size = 2 * radius + 1;
        let mut mask = Grid::<f32>::square(size);
        let r = radius as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if (dx, dy) == (0, 0) {
                    continue;
                }
                if (dx as f32).hypot(dy as f32) <= cutoff {
                    mask.set((dx + r) as usize, (dy + r) as usize, 1.0);
                }
            }
        }
        let total = mask.data.iter().sum();
        Self { mask, total }
    }

    pub fn mask(&self) -> &Grid<f32> {
        &self.mask
    }

    /// Number of marked offsets.
    pub fn total(&self) -> f32 {
        self.total
    }
}
