/// Row-major flat grid. No per-cell objects, f32 friendly.
/// Bounded topology: neighbors outside the grid simply do not exist.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

impl<T: Copy + Default> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            data: vec![T::default(); w * h],
            w,
            h,
        }
    }

    pub fn square(n: usize) -> Self {
        Self::new(n, n)
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Signed lookup; None outside the grid.
    #[inline]
    pub fn get_checked(&self, x: i64, y: i64) -> Option<T> {
        if x < 0 || y < 0 || x >= self.w as i64 || y >= self.h as i64 {
            return None;
        }
        Some(self.get(x as usize, y as usize))
    }

    /// Rows as nested vectors, for serialization.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.data.chunks(self.w).map(|row| row.to_vec()).collect()
    }
}

impl Grid<bool> {
    pub fn count_active(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Fraction of active cells.
    pub fn cover(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.count_active() as f32 / self.data.len() as f32
    }
}

pub const OFFSETS4: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// In-bounds 4-connected neighbors (no wrapping).
pub fn neighbors4(x: usize, y: usize, w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
    let mut out = [(0usize, 0usize); 4];
    let mut n = 0;
    for (dx, dy) in OFFSETS4 {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx >= 0 && ny >= 0 && nx < w as i64 && ny < h as i64 {
            out[n] = (nx as usize, ny as usize);
            n += 1;
        }
    }
    out.into_iter().take(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_has_two_neighbors() {
        assert_eq!(neighbors4(0, 0, 5, 5).count(), 2);
        assert_eq!(neighbors4(4, 2, 5, 5).count(), 3);
        assert_eq!(neighbors4(2, 2, 5, 5).count(), 4);
    }

    #[test]
    fn test_cover() {
        let mut g = Grid::<bool>::square(4);
        g.set(1, 1, true);
        g.set(2, 3, true);
        assert_eq!(g.count_active(), 2);
        assert!((g.cover() - 0.125).abs() < 1e-6);
        assert_eq!(g.get_checked(-1, 0), None);
        assert_eq!(g.get_checked(2, 3), Some(true));
    }
}
